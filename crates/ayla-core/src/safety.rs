//! Content safety filter.
//!
//! The filter inspects text against a versioned policy of disallowed
//! categories, each backed by case-insensitive regex patterns. It runs
//! twice per turn: on the outbound user prompt (a match aborts the turn
//! before the model is called) and on the inbound model reply (a match
//! causes the reply to be replaced with a fallback string before storage).
//! The filter itself is pure: the same text and policy version always
//! produce the same verdict; what happens on a match is the session
//! manager's concern.

use regex::{Regex, RegexBuilder};

/// Which leg of the turn the text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// User prompt on its way to the model.
    Outbound,
    /// Model reply on its way to storage.
    Inbound,
}

/// One disallowed category with its matching patterns.
#[derive(Debug)]
pub struct SafetyRule {
    pub category: &'static str,
    patterns: Vec<Regex>,
}

impl SafetyRule {
    /// Compile a rule from raw patterns, matched case-insensitively.
    ///
    /// # Panics
    ///
    /// Panics on an invalid pattern; policies are built from static
    /// pattern sets validated by the test suite.
    fn new(category: &'static str, patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .unwrap_or_else(|e| panic!("invalid safety pattern '{p}': {e}"))
            })
            .collect();
        Self { category, patterns }
    }

    fn matches(&self, text: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(text))
    }
}

/// A versioned set of disallowed-content rules.
#[derive(Debug)]
pub struct SafetyPolicy {
    pub version: u32,
    rules: Vec<SafetyRule>,
}

impl SafetyPolicy {
    /// The standard policy shipped with the assistant: blocks
    /// controlled-substance dosing requests and self-harm content.
    pub fn standard() -> Self {
        Self {
            version: 1,
            rules: vec![
                SafetyRule::new(
                    "controlled-substance-dosing",
                    &[
                        r"how (much|many)\b.{0,40}\b(oxycodone|oxycontin|fentanyl|xanax|alprazolam|adderall|morphine|codeine|valium|opioid)s?\b",
                        r"\b(dose|dosage|dosing)\b.{0,40}\b(oxycodone|oxycontin|fentanyl|xanax|alprazolam|adderall|morphine|codeine|valium|opioid)s?\b",
                        r"\b(oxycodone|fentanyl|xanax|adderall|morphine|codeine|opioid)s?\b.{0,40}\b(dose|dosage|how much|get high)\b",
                    ],
                ),
                SafetyRule::new(
                    "self-harm",
                    &[
                        r"\b(kill(ing)? myself|end(ing)? my (own )?life|take my (own )?life)\b",
                        r"\b(how to|ways? to|best way to)\b.{0,30}\b(hurt|harm|cut) (myself|yourself)\b",
                        r"\bsuicide (method|plan|note)s?\b",
                    ],
                ),
            ],
        }
    }

    /// Build a policy from custom rules.
    pub fn new(version: u32, rules: Vec<(&'static str, Vec<&str>)>) -> Self {
        Self {
            version,
            rules: rules
                .into_iter()
                .map(|(category, patterns)| SafetyRule::new(category, &patterns))
                .collect(),
        }
    }
}

/// Verdict of one inspection.
#[derive(Debug, Clone)]
pub struct Inspection {
    pub pass: bool,
    /// Category of the first matching rule when `pass` is false.
    pub reason: Option<String>,
}

/// Applies a [`SafetyPolicy`] to turn content.
#[derive(Debug)]
pub struct SafetyFilter {
    policy: SafetyPolicy,
}

impl SafetyFilter {
    pub fn new(policy: SafetyPolicy) -> Self {
        Self { policy }
    }

    /// Current policy version, for audit logging.
    pub fn policy_version(&self) -> u32 {
        self.policy.version
    }

    /// Inspect text against the policy. Deterministic for a given policy
    /// version.
    pub fn inspect(&self, text: &str, direction: Direction) -> Inspection {
        for rule in &self.policy.rules {
            if rule.matches(text) {
                tracing::warn!(
                    category = rule.category,
                    ?direction,
                    policy_version = self.policy.version,
                    "safety filter matched"
                );
                return Inspection {
                    pass: false,
                    reason: Some(rule.category.to_string()),
                };
            }
        }
        Inspection {
            pass: true,
            reason: None,
        }
    }
}

impl Default for SafetyFilter {
    fn default() -> Self {
        Self::new(SafetyPolicy::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_health_question_passes() {
        let filter = SafetyFilter::default();
        let result = filter.inspect(
            "I've been having headaches lately. What could be causing them?",
            Direction::Outbound,
        );
        assert!(result.pass);
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_dosing_request_is_blocked() {
        let filter = SafetyFilter::default();
        let result = filter.inspect(
            "How much oxycodone can I take to get high?",
            Direction::Outbound,
        );
        assert!(!result.pass);
        assert_eq!(result.reason.as_deref(), Some("controlled-substance-dosing"));
    }

    #[test]
    fn test_dosing_match_is_case_insensitive() {
        let filter = SafetyFilter::default();
        let result = filter.inspect("what DOSAGE of Fentanyl is safe", Direction::Outbound);
        assert!(!result.pass);
    }

    #[test]
    fn test_self_harm_content_is_blocked() {
        let filter = SafetyFilter::default();
        let result = filter.inspect(
            "I keep thinking about ways to hurt myself",
            Direction::Outbound,
        );
        assert!(!result.pass);
        assert_eq!(result.reason.as_deref(), Some("self-harm"));
    }

    #[test]
    fn test_inbound_uses_same_policy() {
        let filter = SafetyFilter::default();
        let blocked = filter.inspect("a typical suicide plan involves", Direction::Inbound);
        assert!(!blocked.pass);
    }

    #[test]
    fn test_medication_mention_without_dosing_passes() {
        let filter = SafetyFilter::default();
        // Naming a medication is fine; asking for dosing is not.
        let result = filter.inspect(
            "My doctor prescribed codeine after surgery and I feel dizzy",
            Direction::Outbound,
        );
        assert!(result.pass);
    }

    #[test]
    fn test_inspection_is_deterministic() {
        let filter = SafetyFilter::default();
        let text = "how many xanax should I take";
        let first = filter.inspect(text, Direction::Outbound);
        let second = filter.inspect(text, Direction::Outbound);
        assert_eq!(first.pass, second.pass);
        assert_eq!(first.reason, second.reason);
    }

    #[test]
    fn test_custom_policy_rules() {
        let policy = SafetyPolicy::new(7, vec![("test-category", vec![r"\bforbidden\b"])]);
        let filter = SafetyFilter::new(policy);
        assert_eq!(filter.policy_version(), 7);
        assert!(!filter.inspect("this is Forbidden text", Direction::Outbound).pass);
        assert!(filter.inspect("this is fine", Direction::Outbound).pass);
    }
}
