use crate::prompt::SCAFFOLDING_MARKERS;

/// Replies shorter than this (in chars) must look like a social reply.
const MIN_REPLY_CHARS: usize = 5;
const MAX_EMOJI_DENSITY: f64 = 0.30;

/// Leading phrases that make a very short reply acceptable.
const SHORT_SOCIAL_REPLIES: &[&str] =
    &["chào", "xin chào", "cảm ơn", "dạ", "vâng", "ok", "hi", "hello", "tạm biệt", "bye"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardrailDecision {
    Allow,
    Deny { reason_code: &'static str },
}

impl GuardrailDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Screens generated text before it reaches a customer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResponseGuard;

impl ResponseGuard {
    pub fn evaluate(&self, text: &str) -> GuardrailDecision {
        if SCAFFOLDING_MARKERS.iter().any(|marker| text.contains(marker)) {
            return GuardrailDecision::Deny { reason_code: "scaffolding_leak" };
        }

        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_REPLY_CHARS && !is_short_social_reply(trimmed) {
            return GuardrailDecision::Deny { reason_code: "too_short" };
        }
        if !trimmed.chars().any(is_latin_alphanumeric) {
            return GuardrailDecision::Deny { reason_code: "no_alphanumeric" };
        }
        if emoji_density(trimmed) > MAX_EMOJI_DENSITY {
            return GuardrailDecision::Deny { reason_code: "emoji_flood" };
        }

        GuardrailDecision::Allow
    }
}

fn is_short_social_reply(text: &str) -> bool {
    let text = text.to_lowercase();
    SHORT_SOCIAL_REPLIES.iter().any(|phrase| text.starts_with(phrase))
}

/// ASCII alphanumerics plus the Latin letter blocks that carry Vietnamese precomposed vowels.
fn is_latin_alphanumeric(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '\u{00C0}'..='\u{00FF}' if ch != '×' && ch != '÷')
        || matches!(ch, '\u{0100}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
}

fn emoji_density(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let emoji = text.chars().filter(|ch| matches!(ch, '\u{1F300}'..='\u{1F9FF}')).count();
    emoji as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::{GuardrailDecision, ResponseGuard};
    use crate::prompt::{GUIDANCE_MARKER, SCAFFOLDING_MARKERS};

    fn reason(text: &str) -> Option<&'static str> {
        match ResponseGuard.evaluate(text) {
            GuardrailDecision::Allow => None,
            GuardrailDecision::Deny { reason_code } => Some(reason_code),
        }
    }

    #[test]
    fn ordinary_vietnamese_reply_is_allowed() {
        assert_eq!(reason("Dạ, áo thun basic hiện có giá 150.000đ ạ."), None);
        assert_eq!(reason("Dạ ạ"), None);
        assert_eq!(reason("OK"), None);
    }

    #[test]
    fn any_scaffolding_marker_is_rejected_regardless_of_content() {
        for marker in SCAFFOLDING_MARKERS {
            let text = format!("Dạ, áo thun giá 150.000đ ạ. {marker} nêu rõ giá");
            assert_eq!(reason(&text), Some("scaffolding_leak"), "{marker}");
        }
        assert_eq!(
            reason(&format!("{GUIDANCE_MARKER}\n- Nêu rõ giá")),
            Some("scaffolding_leak")
        );
    }

    #[test]
    fn short_text_needs_a_social_opening() {
        assert_eq!(reason("abc"), Some("too_short"));
        assert_eq!(reason(""), Some("too_short"));
        assert_eq!(reason("   "), Some("too_short"));
    }

    #[test]
    fn text_without_latin_letters_is_rejected() {
        assert_eq!(reason("!!! ??? ..."), Some("no_alphanumeric"));
        assert_eq!(reason("ữ"), Some("too_short"));
        assert_eq!(reason("ừ ừ ừ ừ"), None);
    }

    #[test]
    fn emoji_density_above_threshold_is_rejected() {
        assert_eq!(reason("ok 😀😀😀😀"), Some("emoji_flood"));
        assert_eq!(reason("Dạ shop cảm ơn anh/chị nhiều 😀"), None);
    }
}
