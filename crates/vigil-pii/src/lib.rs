//! PII detection and redaction
//!
//! Scrubs sensitive entities from message content before it leaves the
//! trust boundary. Regex-based; covers the common enterprise cases. The
//! original text is never stored or logged.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use vigil_config::PiiConfig;

/// Entity classes detected by the redactor, with their patterns
static PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "EMAIL_ADDRESS",
            Regex::new(r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b").expect("valid pattern"),
        ),
        (
            "PHONE_NUMBER",
            Regex::new(r"\b(\+?1[\s.\-]?)?(\(?\d{3}\)?[\s.\-]?)\d{3}[\s.\-]?\d{4}\b").expect("valid pattern"),
        ),
        (
            "CREDIT_CARD",
            Regex::new(r"\b(?:\d{4}[\s\-]?){3}\d{4}\b").expect("valid pattern"),
        ),
        ("US_SSN", Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("valid pattern")),
        (
            "IP_ADDRESS",
            Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("valid pattern"),
        ),
    ]
});

/// Summary of what a redaction pass found and replaced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RedactionSummary {
    /// Whether anything was replaced
    pub redacted: bool,
    /// Entity types found, in detection order
    pub entities_found: Vec<String>,
    /// Total number of replaced spans
    pub redaction_count: usize,
}

impl RedactionSummary {
    /// Merge another pass's findings into this summary
    pub fn absorb(&mut self, other: Self) {
        for entity in other.entities_found {
            if !self.entities_found.contains(&entity) {
                self.entities_found.push(entity);
            }
        }
        self.redaction_count += other.redaction_count;
        self.redacted = self.redaction_count > 0;
    }
}

/// Regex-based PII redactor
///
/// When disabled, passes text through untouched with an empty summary.
pub struct Redactor {
    enabled: bool,
}

impl Redactor {
    pub const fn from_config(config: &PiiConfig) -> Self {
        Self { enabled: config.enabled }
    }

    /// Detect and replace PII spans with `<ENTITY_TYPE>` placeholders
    pub fn redact(&self, text: &str) -> (String, RedactionSummary) {
        if !self.enabled {
            return (text.to_owned(), RedactionSummary::default());
        }

        let mut redacted = text.to_owned();
        let mut summary = RedactionSummary::default();

        for (entity_type, pattern) in PATTERNS.iter() {
            let count = pattern.find_iter(&redacted).count();
            if count > 0 {
                summary.entities_found.push((*entity_type).to_owned());
                summary.redaction_count += count;
                redacted = pattern.replace_all(&redacted, format!("<{entity_type}>")).into_owned();
            }
        }

        summary.redacted = summary.redaction_count > 0;
        (redacted, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor() -> Redactor {
        Redactor::from_config(&PiiConfig { enabled: true })
    }

    #[test]
    fn clean_text_passes_through() {
        let (text, summary) = redactor().redact("summarise the quarterly report");
        assert_eq!(text, "summarise the quarterly report");
        assert!(!summary.redacted);
        assert_eq!(summary.redaction_count, 0);
    }

    #[test]
    fn email_is_replaced() {
        let (text, summary) = redactor().redact("contact jane.doe@acme.com for details");
        assert_eq!(text, "contact <EMAIL_ADDRESS> for details");
        assert_eq!(summary.entities_found, vec!["EMAIL_ADDRESS"]);
        assert_eq!(summary.redaction_count, 1);
        assert!(!text.contains("jane.doe"));
    }

    #[test]
    fn ssn_is_replaced() {
        let (text, summary) = redactor().redact("SSN 123-45-6789 on file");
        assert_eq!(text, "SSN <US_SSN> on file");
        assert!(summary.redacted);
    }

    #[test]
    fn credit_card_is_replaced() {
        let (text, _) = redactor().redact("card 4111 1111 1111 1111 expires soon");
        assert!(text.contains("<CREDIT_CARD>"));
        assert!(!text.contains("4111"));
    }

    #[test]
    fn multiple_entity_types_counted() {
        let (text, summary) = redactor().redact("mail root@10.0.0.1 logs to admin@example.org");
        assert!(text.contains("<EMAIL_ADDRESS>"));
        assert!(summary.entities_found.contains(&"EMAIL_ADDRESS".to_owned()));
        assert!(summary.redaction_count >= 2);
    }

    #[test]
    fn disabled_redactor_is_identity() {
        let redactor = Redactor::from_config(&PiiConfig { enabled: false });
        let input = "reach me at jane@acme.com";
        let (text, summary) = redactor.redact(input);
        assert_eq!(text, input);
        assert!(!summary.redacted);
    }

    #[test]
    fn absorb_deduplicates_entity_types() {
        let mut total = RedactionSummary::default();
        let (_, first) = redactor().redact("a@b.com");
        let (_, second) = redactor().redact("c@d.com");
        total.absorb(first);
        total.absorb(second);
        assert_eq!(total.entities_found, vec!["EMAIL_ADDRESS"]);
        assert_eq!(total.redaction_count, 2);
    }
}
