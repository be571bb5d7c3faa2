use serde::Serialize;
use shopchat_core::classifier::{classify_intent, product_subtype, IntentClassifier};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ClassifyReport {
    categories: Vec<&'static str>,
    matched_phrases: Vec<String>,
    intent: &'static str,
    product_subtype: &'static str,
    is_product_question: bool,
    search_keyword: Option<&'static str>,
}

/// Pure: no configuration or collaborators are touched.
pub fn run(message: &str) -> CommandResult {
    let classifier = IntentClassifier::default();
    let classification = classifier.classify(message);

    CommandResult::report(
        "classify",
        ClassifyReport {
            categories: classification.categories.iter().map(|category| category.as_str()).collect(),
            intent: classify_intent(&classification.categories).as_str(),
            product_subtype: product_subtype(&classification.categories).as_str(),
            is_product_question: classifier.is_product_question(message),
            search_keyword: classifier.taxonomy().first_product_keyword(message),
            matched_phrases: classification.matched_phrases,
        },
    )
}
