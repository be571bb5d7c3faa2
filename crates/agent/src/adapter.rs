//! Decides whether a stored example answer still fits a new, similarly worded question, and
//! rewrites it when the numbers or named items differ.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};
use serde::Serialize;
use shopchat_core::taxonomy::KeywordCategory;
use tracing::{debug, warn};

use crate::guardrails::ResponseGuard;
use crate::llm::{CompletionParams, LlmClient};

/// Measurements further apart than this are different measurements.
const MEASUREMENT_TOLERANCE: i64 = 5;

const MEASUREMENT_PATTERN: &str = r"(?x)
    \b(?P<t1>\d+)-(?P<t2>\d+)-(?P<t3>\d+)
    | \b(?P<meters>\d)m(?P<centimeters>\d{1,2})
    | (?P<weight>\d+)\s*(?:kg|ký|kí|cân)
    | \b(?:eo|ngực|vòng\s*[123]|mông|bụng)\s*:?\s*(?P<labelled>\d+)
    | (?P<length>\d+)\s*cm
";
const NUMBER_PATTERN: &str = r"\d+";
const ENTITY_PATTERN: &str = r"(?i)\b(?:sản phẩm|mẫu|áo|quần|đầm|váy)\s+([\p{L}\p{N}]+)";
const SIZE_SUBSTITUTION_PATTERN: &str = r"(?P<triple>\d+-\d+-\d+)|(?P<number>\d+)";
const DAY_PATTERN: &str =
    r"(?i)chủ nhật|thứ hai|thứ ba|thứ tư|thứ năm|thứ sáu|thứ bảy|thứ [2-7]";

const PRICE_WORDS: &[&str] =
    &["giá", "bao nhiêu", "tiền", "số lượng", "mua nhiều", "mua sỉ", "combo"];
const PRICE_DISCLAIMER: &str = "(Giá có thể thay đổi tùy thời điểm và số lượng, anh/chị vui lòng \
                                liên hệ shop để được báo giá chính xác nhất ạ.)";

const ADAPTER_SYSTEM_PROMPT: &str = "Bạn là trợ lý chăm sóc khách hàng của một cửa hàng thời \
    trang. Nhiệm vụ duy nhất: viết lại câu trả lời mẫu cho khớp với câu hỏi mới. Chỉ trả về câu \
    trả lời đã viết lại, không giải thích, không thêm tiêu đề.";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn measurement_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, MEASUREMENT_PATTERN)
}

fn number_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, NUMBER_PATTERN)
}

fn entity_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, ENTITY_PATTERN)
}

fn size_substitution_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, SIZE_SUBSTITUTION_PATTERN)
}

fn day_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, DAY_PATTERN)
}

/// Numbers found in a question, split into body measurements and everything else.
#[derive(Debug, Default, PartialEq, Eq)]
struct NumberProfile {
    measurements: Vec<i64>,
    others: Vec<u64>,
}

impl NumberProfile {
    fn extract(text: &str) -> Self {
        let mut profile = Self::default();
        let mut spans = Vec::new();

        if let Some(pattern) = measurement_regex() {
            for captures in pattern.captures_iter(text) {
                if let Some(whole) = captures.get(0) {
                    spans.push(whole.range());
                }
                profile.measurements.extend(measurement_values(&captures));
            }
        }
        if let Some(pattern) = number_regex() {
            profile.others = pattern
                .find_iter(text)
                .filter(|found| !spans.iter().any(|span| span.contains(&found.start())))
                .filter_map(|found| found.as_str().parse().ok())
                .collect();
        }
        profile
    }
}

fn measurement_values(captures: &Captures<'_>) -> Vec<i64> {
    let value = |name: &str| {
        captures.name(name).and_then(|found| found.as_str().parse::<i64>().ok())
    };

    if captures.name("t1").is_some() {
        return ["t1", "t2", "t3"].into_iter().filter_map(value).collect();
    }
    if let (Some(meters), Some(centimeters)) = (value("meters"), captures.name("centimeters")) {
        let mut cm = centimeters.as_str().parse::<i64>().unwrap_or_default();
        if centimeters.as_str().len() == 1 {
            cm *= 10;
        }
        return vec![meters * 100 + cm];
    }
    ["weight", "labelled", "length"].into_iter().filter_map(value).take(1).collect()
}

fn entities(text: &str) -> Vec<String> {
    let Some(pattern) = entity_regex() else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|found| found.as_str().to_lowercase())
        .collect()
}

/// Whether an example answer written for `example_question` must be rewritten before it can
/// answer `user_question`. Identical questions (ignoring case) never need adjustment.
pub fn needs_adjustment(user_question: &str, example_question: &str) -> bool {
    let user = user_question.trim().to_lowercase();
    let example = example_question.trim().to_lowercase();
    if user == example {
        return false;
    }

    let user_numbers = NumberProfile::extract(&user);
    let example_numbers = NumberProfile::extract(&example);

    if !user_numbers.measurements.is_empty() && !example_numbers.measurements.is_empty() {
        let same_shape = user_numbers.measurements.len() == example_numbers.measurements.len();
        let within_tolerance = user_numbers
            .measurements
            .iter()
            .zip(&example_numbers.measurements)
            .all(|(left, right)| (left - right).abs() <= MEASUREMENT_TOLERANCE);
        if !same_shape || !within_tolerance {
            return true;
        }
    }

    if !user_numbers.others.is_empty()
        && !example_numbers.others.is_empty()
        && user_numbers.others != example_numbers.others
    {
        return true;
    }

    let user_entities = entities(&user);
    let example_entities = entities(&example);
    if !user_entities.is_empty() && !example_entities.is_empty() {
        let any_shared = user_entities.iter().any(|left| {
            example_entities.iter().any(|right| {
                left == right || left.contains(right.as_str()) || right.contains(left.as_str())
            })
        });
        if !any_shared {
            return true;
        }
    }

    false
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptIntent {
    SizeConsultation,
    PriceInquiry,
    WorkingHoursInquiry,
    RegistrationInquiry,
    Generic,
}

impl AdaptIntent {
    pub fn from_categories(categories: &[KeywordCategory]) -> Self {
        let has = |category| categories.contains(&category);
        if has(KeywordCategory::Size) {
            Self::SizeConsultation
        } else if has(KeywordCategory::Price) {
            Self::PriceInquiry
        } else if has(KeywordCategory::WorkingHours) {
            Self::WorkingHoursInquiry
        } else if has(KeywordCategory::Account) {
            Self::RegistrationInquiry
        } else {
            Self::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SizeConsultation => "size_consultation",
            Self::PriceInquiry => "price_inquiry",
            Self::WorkingHoursInquiry => "working_hours_inquiry",
            Self::RegistrationInquiry => "registration_inquiry",
            Self::Generic => "generic",
        }
    }

    fn rewrite_prompt(&self, request: &AdaptRequest<'_>) -> String {
        let focus = match self {
            Self::SizeConsultation => {
                "Khách hỏi tư vấn size với số đo khác câu hỏi mẫu. Thay các số đo trong câu trả \
                 lời mẫu bằng số đo của khách và điều chỉnh size gợi ý cho phù hợp."
            }
            Self::PriceInquiry => {
                "Khách hỏi giá với sản phẩm hoặc số lượng khác câu hỏi mẫu. Giữ nguyên các con số \
                 giá có trong câu trả lời mẫu, chỉ điều chỉnh phần nói về sản phẩm và số lượng."
            }
            Self::WorkingHoursInquiry => {
                "Khách hỏi giờ làm việc cho ngày khác câu hỏi mẫu. Điều chỉnh ngày trong câu trả \
                 lời mẫu theo câu hỏi của khách, giữ nguyên khung giờ."
            }
            Self::RegistrationInquiry => {
                "Khách hỏi về đăng ký hoặc tài khoản. Giữ nguyên các bước trong câu trả lời mẫu, \
                 chỉ sửa những chi tiết không khớp với câu hỏi mới."
            }
            Self::Generic => {
                "Câu hỏi mới gần giống câu hỏi mẫu nhưng khác một vài chi tiết. Sửa câu trả lời \
                 mẫu cho khớp, không thêm thông tin mới."
            }
        };
        format!(
            "{focus}\n\nCâu hỏi mẫu: {}\nCâu trả lời mẫu: {}\nCâu hỏi mới của khách: {}\n\n\
             Viết lại câu trả lời cho câu hỏi mới, giữ giọng văn của câu trả lời mẫu.",
            request.example_question.trim(),
            request.example_answer.trim(),
            request.question.trim()
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptMethod {
    /// Example answer used as-is.
    Reused,
    Generated,
    RuleBased,
}

impl AdaptMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reused => "reused",
            Self::Generated => "generated",
            Self::RuleBased => "rule_based",
        }
    }
}

pub struct AdaptRequest<'a> {
    pub question: &'a str,
    pub example_question: &'a str,
    pub example_answer: &'a str,
    pub categories: &'a [KeywordCategory],
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AdaptOutcome {
    pub answer: String,
    pub needs_adjustment: bool,
    pub method: AdaptMethod,
    pub intent: AdaptIntent,
}

pub struct AnswerAdapter {
    llm: Option<Arc<dyn LlmClient>>,
    params: CompletionParams,
    guard: ResponseGuard,
}

impl AnswerAdapter {
    pub fn new(llm: Option<Arc<dyn LlmClient>>, params: CompletionParams) -> Self {
        Self { llm, params, guard: ResponseGuard }
    }

    /// Rule-based only; never calls a generative model.
    pub fn offline() -> Self {
        Self::new(None, CompletionParams { max_tokens: 0, temperature: 0.0 })
    }

    pub async fn adapt(&self, request: &AdaptRequest<'_>, correlation_id: &str) -> AdaptOutcome {
        let intent = AdaptIntent::from_categories(request.categories);
        let outcome = if !needs_adjustment(request.question, request.example_question) {
            AdaptOutcome {
                answer: request.example_answer.to_string(),
                needs_adjustment: false,
                method: AdaptMethod::Reused,
                intent,
            }
        } else if let Some(answer) = self.rewrite(intent, request, correlation_id).await {
            AdaptOutcome { answer, needs_adjustment: true, method: AdaptMethod::Generated, intent }
        } else {
            AdaptOutcome {
                answer: rule_based_rewrite(intent, request),
                needs_adjustment: true,
                method: AdaptMethod::RuleBased,
                intent,
            }
        };

        debug!(
            event_name = "chat.adapter.decision",
            correlation_id = %correlation_id,
            needs_adjustment = outcome.needs_adjustment,
            method = outcome.method.as_str(),
            intent = intent.as_str(),
            "answer adaptation decided"
        );
        outcome
    }

    async fn rewrite(
        &self,
        intent: AdaptIntent,
        request: &AdaptRequest<'_>,
        correlation_id: &str,
    ) -> Option<String> {
        let llm = self.llm.as_ref()?;
        let prompt = intent.rewrite_prompt(request);
        match llm.complete(ADAPTER_SYSTEM_PROMPT, &prompt, &self.params).await {
            Ok(completion) => {
                let text = completion.text.trim();
                if text.is_empty() || !self.guard.evaluate(text).is_allowed() {
                    warn!(
                        event_name = "chat.adapter.rewrite_rejected",
                        correlation_id = %correlation_id,
                        intent = intent.as_str(),
                        "rewrite unusable; applying rule-based adaptation"
                    );
                    return None;
                }
                Some(text.to_string())
            }
            Err(failure) => {
                warn!(
                    event_name = "chat.adapter.rewrite_failed",
                    correlation_id = %correlation_id,
                    intent = intent.as_str(),
                    reason_code = failure.reason_code(),
                    error = %failure,
                    "rewrite failed; applying rule-based adaptation"
                );
                None
            }
        }
    }
}

fn rule_based_rewrite(intent: AdaptIntent, request: &AdaptRequest<'_>) -> String {
    match intent {
        AdaptIntent::SizeConsultation => {
            substitute_numbers(request.example_answer, request.example_question, request.question)
        }
        AdaptIntent::PriceInquiry => {
            let question = request.question.to_lowercase();
            let answer = request.example_answer.trim_end();
            if PRICE_WORDS.iter().any(|word| question.contains(word))
                && !answer.contains(PRICE_DISCLAIMER)
            {
                format!("{answer}\n\n{PRICE_DISCLAIMER}")
            } else {
                request.example_answer.to_string()
            }
        }
        AdaptIntent::WorkingHoursInquiry => {
            substitute_days(request.example_answer, request.example_question, request.question)
        }
        AdaptIntent::RegistrationInquiry | AdaptIntent::Generic => request.example_answer.to_string(),
    }
}

fn numbers_in(text: &str) -> Vec<&str> {
    number_regex()
        .map(|pattern| pattern.find_iter(text).map(|found| found.as_str()).collect())
        .unwrap_or_default()
}

/// Positional example-to-user mapping; the first occurrence of a repeated token wins.
fn positional_map(from: &[String], to: &[String]) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    for (source, target) in from.iter().zip(to) {
        mapping.entry(source.clone()).or_insert_with(|| target.clone());
    }
    mapping
}

fn substitute_numbers(answer: &str, example_question: &str, user_question: &str) -> String {
    let example = numbers_in(example_question).into_iter().map(str::to_string).collect::<Vec<_>>();
    let user = numbers_in(user_question).into_iter().map(str::to_string).collect::<Vec<_>>();
    let Some(pattern) = size_substitution_regex() else {
        return answer.to_string();
    };
    if example.is_empty() || user.is_empty() {
        return answer.to_string();
    }

    let mapping = positional_map(&example, &user);
    let triple = (example.len() >= 3 && user.len() >= 3)
        .then(|| (example[..3].join("-"), user[..3].join("-")));

    pattern
        .replace_all(answer, |captures: &Captures<'_>| {
            if let Some(found) = captures.name("triple") {
                if let Some((from, to)) = &triple {
                    if found.as_str() == from {
                        return to.clone();
                    }
                }
                return found
                    .as_str()
                    .split('-')
                    .map(|part| mapping.get(part).map_or(part, String::as_str))
                    .collect::<Vec<_>>()
                    .join("-");
            }
            let number = captures.get(0).map_or("", |found| found.as_str());
            mapping.get(number).cloned().unwrap_or_else(|| number.to_string())
        })
        .into_owned()
}

fn days_in(text: &str) -> Vec<String> {
    day_regex()
        .map(|pattern| pattern.find_iter(text).map(|found| found.as_str().to_lowercase()).collect())
        .unwrap_or_default()
}

fn substitute_days(answer: &str, example_question: &str, user_question: &str) -> String {
    let mapping = positional_map(&days_in(example_question), &days_in(user_question));
    let Some(pattern) = day_regex() else {
        return answer.to_string();
    };
    if mapping.is_empty() {
        return answer.to_string();
    }
    pattern
        .replace_all(answer, |captures: &Captures<'_>| {
            let day = captures.get(0).map_or("", |found| found.as_str());
            mapping.get(&day.to_lowercase()).cloned().unwrap_or_else(|| day.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use shopchat_core::domain::response::Usage;
    use shopchat_core::errors::{Collaborator, CollaboratorError};
    use shopchat_core::taxonomy::KeywordCategory;

    use super::{
        needs_adjustment, AdaptIntent, AdaptMethod, AdaptRequest, AnswerAdapter, PRICE_DISCLAIMER,
    };
    use crate::llm::{Completion, CompletionParams, LlmClient};

    struct ScriptedLlm {
        reply: Result<String, CollaboratorError>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            _params: &CompletionParams,
        ) -> Result<Completion, CollaboratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(user_prompt.contains("Câu hỏi mới của khách"));
            self.reply
                .clone()
                .map(|text| Completion { text, usage: Usage::default() })
        }
    }

    fn params() -> CompletionParams {
        CompletionParams { max_tokens: 200, temperature: 0.3 }
    }

    #[test]
    fn identical_questions_never_need_adjustment() {
        for question in ["", "áo 86-64-90 size gì", "Mẫu Váy Hoa còn không", "cao 1m55 50kg"] {
            assert!(!needs_adjustment(question, question));
            assert!(!needs_adjustment(&question.to_uppercase(), question));
        }
    }

    #[test]
    fn measurements_differing_by_exactly_five_are_the_same() {
        assert!(!needs_adjustment("cao 1m60 60kg eo 75 size gì", "cao 1m60 55kg eo 70 size gì"));
    }

    #[test]
    fn measurements_differing_by_more_than_five_need_adjustment() {
        assert!(needs_adjustment("cao 1m60 62kg eo 70 size gì", "cao 1m60 55kg eo 70 size gì"));
        assert!(needs_adjustment("số đo 90-70-95 mặc size nào", "số đo 84-62-88 mặc size nào"));
        assert!(!needs_adjustment("số đo 86-64-90 mặc size nào", "số đo 84-62-88 mặc size nào"));
    }

    #[test]
    fn other_numbers_must_match_exactly() {
        assert!(needs_adjustment("mua 3 cái có giảm không", "mua 2 cái có giảm không"));
        assert!(!needs_adjustment("mua 2 cái có giảm không shop", "mua 2 cái có giảm không"));
    }

    #[test]
    fn different_named_items_need_adjustment() {
        assert!(needs_adjustment("mẫu hoa nhí còn không", "mẫu trơn còn không"));
        assert!(!needs_adjustment("mẫu hoa còn hàng không", "mẫu hoa còn không"));
        assert!(!needs_adjustment("ship mất bao lâu vậy", "ship mất bao lâu"));
    }

    #[test]
    fn intent_follows_category_priority() {
        assert_eq!(
            AdaptIntent::from_categories(&[KeywordCategory::Price, KeywordCategory::Size]),
            AdaptIntent::SizeConsultation
        );
        assert_eq!(
            AdaptIntent::from_categories(&[KeywordCategory::Account]),
            AdaptIntent::RegistrationInquiry
        );
        assert_eq!(AdaptIntent::from_categories(&[]), AdaptIntent::Generic);
    }

    #[tokio::test]
    async fn unchanged_question_reuses_example_without_calling_model() {
        let llm =
            Arc::new(ScriptedLlm { reply: Ok("unused".to_string()), calls: AtomicUsize::new(0) });
        let adapter = AnswerAdapter::new(Some(llm.clone()), params());
        let outcome = adapter
            .adapt(
                &AdaptRequest {
                    question: "Ship mất bao lâu",
                    example_question: "ship mất bao lâu",
                    example_answer: "Dạ 2-3 ngày ạ",
                    categories: &[KeywordCategory::Shipping],
                },
                "req-1",
            )
            .await;

        assert_eq!(outcome.method, AdaptMethod::Reused);
        assert_eq!(outcome.answer, "Dạ 2-3 ngày ạ");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_rewrite_is_used_when_available() {
        let llm = Arc::new(ScriptedLlm {
            reply: Ok("Dạ với số đo 90-70-95 anh/chị mặc size L ạ.".to_string()),
            calls: AtomicUsize::new(0),
        });
        let adapter = AnswerAdapter::new(Some(llm.clone()), params());
        let outcome = adapter
            .adapt(
                &AdaptRequest {
                    question: "số đo 90-70-95 mặc size nào",
                    example_question: "số đo 84-62-88 mặc size nào",
                    example_answer: "Dạ với số đo 84-62-88 anh/chị mặc size M ạ.",
                    categories: &[KeywordCategory::Size],
                },
                "req-2",
            )
            .await;

        assert_eq!(outcome.method, AdaptMethod::Generated);
        assert!(outcome.answer.contains("size L"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_rewrite_falls_back_to_number_substitution() {
        let llm = Arc::new(ScriptedLlm {
            reply: Err(CollaboratorError::unavailable(Collaborator::Generative, "offline")),
            calls: AtomicUsize::new(0),
        });
        let adapter = AnswerAdapter::new(Some(llm), params());
        let outcome = adapter
            .adapt(
                &AdaptRequest {
                    question: "số đo 90-70-95 cao 165 mặc size nào",
                    example_question: "số đo 84-62-88 cao 158 mặc size nào",
                    example_answer: "Dạ với số đo 84-62-88 và chiều cao 158 thì mặc size M ạ.",
                    categories: &[KeywordCategory::Size],
                },
                "req-3",
            )
            .await;

        assert_eq!(outcome.method, AdaptMethod::RuleBased);
        assert_eq!(outcome.answer, "Dạ với số đo 90-70-95 và chiều cao 165 thì mặc size M ạ.");
    }

    #[tokio::test]
    async fn empty_rewrite_counts_as_failure() {
        let llm =
            Arc::new(ScriptedLlm { reply: Ok("   ".to_string()), calls: AtomicUsize::new(0) });
        let adapter = AnswerAdapter::new(Some(llm), params());
        let outcome = adapter
            .adapt(
                &AdaptRequest {
                    question: "mua 3 cái giá bao nhiêu",
                    example_question: "mua 2 cái giá bao nhiêu",
                    example_answer: "Dạ mỗi cái 150.000đ ạ.",
                    categories: &[KeywordCategory::Price],
                },
                "req-4",
            )
            .await;

        assert_eq!(outcome.method, AdaptMethod::RuleBased);
        assert!(outcome.answer.starts_with("Dạ mỗi cái 150.000đ ạ."));
        assert!(outcome.answer.ends_with(PRICE_DISCLAIMER));
    }

    #[tokio::test]
    async fn working_hours_swap_days_positionally() {
        let outcome = AnswerAdapter::offline()
            .adapt(
                &AdaptRequest {
                    question: "thứ 7 shop mở đến mấy giờ",
                    example_question: "thứ 2 shop mở đến mấy giờ",
                    example_answer: "Dạ Thứ 2 shop mở cửa từ 8h đến 22h ạ.",
                    categories: &[KeywordCategory::WorkingHours],
                },
                "req-5",
            )
            .await;

        assert_eq!(outcome.method, AdaptMethod::RuleBased);
        assert_eq!(outcome.answer, "Dạ thứ 7 shop mở cửa từ 8h đến 22h ạ.");
    }
}
