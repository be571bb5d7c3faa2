use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::context::UserIntent;
use crate::taxonomy::{padded_lowercase, KeywordCategory, KeywordTaxonomy};

/// Shortest text token treated as a product slug.
pub const MIN_SLUG_TOKEN_CHARS: usize = 8;

/// Phrases that on their own mark a message as being about a concrete product.
const STRONG_PRODUCT_PHRASES: &[&str] = &[
    "giá",
    "bao nhiêu tiền",
    "còn hàng",
    "còn size",
    "còn màu",
    "hết hàng",
    "mua",
    "đặt hàng",
    "size",
    "chất liệu",
    "sản phẩm",
    "mẫu",
    "áo",
    "quần",
    "váy",
    "đầm",
    "giày",
    "túi",
    "màu",
];

/// Categories detected in one message plus the phrases that triggered them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Declaration order, no duplicates.
    pub categories: Vec<KeywordCategory>,
    /// Trimmed phrases in match order, no duplicates.
    pub matched_phrases: Vec<String>,
}

impl Classification {
    pub fn has(&self, category: KeywordCategory) -> bool {
        self.categories.contains(&category)
    }

    /// At least one category and every detected category is social.
    pub fn is_purely_social(&self) -> bool {
        !self.categories.is_empty() && self.categories.iter().all(KeywordCategory::is_social)
    }

    /// The single social category when it is the only thing detected.
    pub fn sole_social_category(&self) -> Option<KeywordCategory> {
        match self.categories.as_slice() {
            [only] if only.is_social() => Some(*only),
            _ => None,
        }
    }

    pub fn policy_categories(&self) -> impl Iterator<Item = KeywordCategory> + '_ {
        self.categories.iter().copied().filter(KeywordCategory::is_policy)
    }
}

/// Product-inquiry guidance variant, in dispatch priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSubtype {
    FollowUp,
    Price,
    Purchase,
    Size,
    Style,
    Feature,
    Care,
    Advice,
    Default,
}

impl ProductSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FollowUp => "follow_up",
            Self::Price => "price",
            Self::Purchase => "purchase",
            Self::Size => "size",
            Self::Style => "style",
            Self::Feature => "feature",
            Self::Care => "care",
            Self::Advice => "advice",
            Self::Default => "default",
        }
    }
}

#[derive(Clone, Copy)]
pub struct IntentClassifier {
    taxonomy: &'static KeywordTaxonomy,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(KeywordTaxonomy::standard())
    }
}

impl IntentClassifier {
    pub fn new(taxonomy: &'static KeywordTaxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn taxonomy(&self) -> &'static KeywordTaxonomy {
        self.taxonomy
    }

    pub fn classify(&self, text: &str) -> Classification {
        let mut classification = Classification::default();
        for hit in self.taxonomy.scan(text) {
            if !classification.categories.contains(&hit.category) {
                classification.categories.push(hit.category);
            }
            let phrase = hit.phrase.trim();
            if !classification.matched_phrases.iter().any(|seen| seen == phrase) {
                classification.matched_phrases.push(phrase.to_string());
            }
        }
        classification
    }

    /// Re-scans the raw text for strong product signals: product nouns, price amounts, body
    /// measurements or a slug-shaped token.
    pub fn is_product_question(&self, text: &str) -> bool {
        let haystack = padded_lowercase(text);
        if STRONG_PRODUCT_PHRASES.iter().any(|phrase| haystack.contains(phrase)) {
            return true;
        }
        product_patterns().iter().any(|pattern| pattern.is_match(&haystack))
            || !slug_tokens(text).is_empty()
    }
}

/// Coarse intent from detected categories. Total over every category set.
pub fn classify_intent(categories: &[KeywordCategory]) -> UserIntent {
    let social = categories.iter().any(KeywordCategory::is_social);
    if social && categories.len() == 1 {
        return UserIntent::GeneralChat;
    }
    if categories.iter().any(KeywordCategory::is_policy) {
        return UserIntent::PolicyQuestion;
    }
    if categories.iter().any(KeywordCategory::is_product) {
        return UserIntent::ProductInquiry;
    }
    UserIntent::GeneralChat
}

pub fn product_subtype(categories: &[KeywordCategory]) -> ProductSubtype {
    let has = |category: KeywordCategory| categories.contains(&category);
    if has(KeywordCategory::FollowUp) {
        ProductSubtype::FollowUp
    } else if has(KeywordCategory::Price) {
        ProductSubtype::Price
    } else if has(KeywordCategory::Purchase) {
        ProductSubtype::Purchase
    } else if has(KeywordCategory::Size) {
        ProductSubtype::Size
    } else if has(KeywordCategory::Style) {
        ProductSubtype::Style
    } else if has(KeywordCategory::Feature) || has(KeywordCategory::Material) {
        ProductSubtype::Feature
    } else if has(KeywordCategory::Care) || has(KeywordCategory::ProductCare) {
        ProductSubtype::Care
    } else if has(KeywordCategory::Advice) {
        ProductSubtype::Advice
    } else {
        ProductSubtype::Default
    }
}

fn product_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"\d+\s*(k|nghìn|ngàn|tr|triệu|đ|vnđ|vnd)\b",
            r"\d+\s*kg\b",
            r"\b\dm\d{1,2}\b",
            r"\b\d+-\d+-\d+\b",
        ]
        .into_iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

fn slug_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[a-z0-9]+(?:-[a-z0-9]+)+").ok()).as_ref()
}

/// Slug-shaped tokens: lowercase alphanumeric runs joined by internal hyphens, 8+ chars.
/// Shared by product-question detection and the product resolver.
pub fn slug_tokens(text: &str) -> Vec<String> {
    let Some(pattern) = slug_pattern() else {
        return Vec::new();
    };
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    for found in pattern.find_iter(&lowered) {
        let bounded = !lowered[..found.start()].chars().next_back().is_some_and(is_word_char)
            && !lowered[found.end()..].chars().next().is_some_and(is_word_char);
        let token = found.as_str();
        let fresh = !tokens.iter().any(|seen| seen == token);
        if bounded && fresh && token.len() >= MIN_SLUG_TOKEN_CHARS {
            tokens.push(token.to_string());
        }
    }
    tokens
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_'
}
