//! Fast-path canned responses.
//!
//! An ordered list of pattern/responder pairs evaluated with a linear scan.
//! Order is a semantic property: the first matching rule wins and the rest
//! are never consulted. `None` tells the caller to fall back to retrieval.

use regex::{Regex, RegexBuilder};

type Responder = fn(&str) -> String;

pub struct Rule {
    pattern: Regex,
    responder: Responder,
}

pub struct RuleSet {
    rules: Vec<Rule>,
}

fn respond_greeting(_input: &str) -> String {
    "Hello! How can I assist you today?".to_string()
}

fn respond_farewell(_input: &str) -> String {
    "Goodbye! Have a great day.".to_string()
}

impl RuleSet {
    /// The static rule table loaded once at startup.
    pub fn builtin() -> Self {
        Self::from_rules(vec![
            (r"\b(hi|hello|hey|good morning|good evening)\b", respond_greeting as Responder),
            (r"\b(bye|goodbye|see you)\b", respond_farewell as Responder),
        ])
    }

    fn from_rules(table: Vec<(&str, Responder)>) -> Self {
        let rules = table
            .into_iter()
            .map(|(pattern, responder)| Rule {
                pattern: RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .expect("rule patterns are static and must compile"),
                responder,
            })
            .collect();
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First matching rule's response, or `None` when no rule applies.
    pub fn respond(&self, text: &str) -> Option<String> {
        for rule in &self.rules {
            if rule.pattern.is_match(text) {
                tracing::debug!("Rule matched: {}", rule.pattern.as_str());
                return Some((rule.responder)(text));
            }
        }
        tracing::debug!("No rule matched");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_matches_case_insensitively() {
        let rules = RuleSet::builtin();
        let response = rules.respond("HELLO there").expect("should match");
        assert!(response.contains("assist"));
    }

    #[test]
    fn first_match_wins_over_later_rules() {
        let rules = RuleSet::builtin();
        // Both a greeting and a farewell appear; the greeting rule is first.
        let response = rules.respond("hello, goodbye").expect("should match");
        assert_eq!(response, respond_greeting(""));
    }

    #[test]
    fn no_match_yields_none() {
        let rules = RuleSet::builtin();
        assert!(rules.respond("what is the capital of France?").is_none());
    }

    #[test]
    fn patterns_require_word_boundaries() {
        let rules = RuleSet::builtin();
        // "this" contains "hi" but not as a word.
        assert!(rules.respond("this document is long").is_none());
    }
}
