//! The canned response corpus and the per-user reply rules.

use std::{collections::HashMap, path::Path};

use regex::Regex;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::base::types::{Res, SenderId};

/// The full pool of candidate responses, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ResponseCorpus {
    values: Vec<String>,
}

impl ResponseCorpus {
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Parses a corpus from JSON of the form `{"values": [..]}`.
    pub fn from_json(json: &str) -> Res<Self> {
        let corpus: Self = serde_json::from_str(json)?;

        if corpus.is_empty() {
            return Err(anyhow::anyhow!("The response corpus must contain at least one response."));
        }

        Ok(corpus)
    }

    /// Loads a corpus from a JSON file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Res<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read responses from `{}`: {}", path.display(), e))?;
        let corpus = Self::from_json(&json)?;

        info!("Loaded {} responses.", corpus.len());

        Ok(corpus)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Patterns that select the responses relevant to one sender.
#[derive(Debug, Clone)]
pub struct UserReplyRule {
    pub user: SenderId,
    pub patterns: Vec<Regex>,
}

/// All configured reply rules, keyed by sender.
#[derive(Debug, Clone, Default)]
pub struct UserReplyRules {
    rules: HashMap<SenderId, Vec<Regex>>,
}

#[derive(Deserialize)]
struct RawRules {
    #[serde(default)]
    users: Vec<RawRule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRule {
    slack_id: SenderId,
    #[serde(default)]
    message_regexps: Vec<String>,
}

impl UserReplyRules {
    pub fn new(rules: impl IntoIterator<Item = UserReplyRule>) -> Self {
        let mut map: HashMap<SenderId, Vec<Regex>> = HashMap::new();

        for rule in rules {
            map.entry(rule.user).or_default().extend(rule.patterns);
        }

        Self { rules: map }
    }

    /// Parses rules from JSON of the form
    /// `{"users": [{"slackId": "U1", "messageRegexps": ["pig"]}]}`.
    pub fn from_json(json: &str) -> Res<Self> {
        let raw: RawRules = serde_json::from_str(json)?;

        let rules = raw
            .users
            .into_iter()
            .map(|rule| {
                let patterns = rule
                    .message_regexps
                    .iter()
                    .map(|pattern| Regex::new(pattern).map_err(|e| anyhow::anyhow!("Invalid reply pattern `{}` for `{}`: {}", pattern, rule.slack_id, e)))
                    .collect::<Res<Vec<_>>>()?;

                Ok::<_, anyhow::Error>(UserReplyRule { user: rule.slack_id, patterns })
            })
            .collect::<Res<Vec<_>>>()?;

        Ok(Self::new(rules))
    }

    /// Loads rules from a JSON file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Res<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read user replies from `{}`: {}", path.display(), e))?;
        let rules = Self::from_json(&json)?;

        info!("Loaded reply rules for {} users.", rules.rules.len());

        Ok(rules)
    }

    /// Patterns configured for `user`, in configuration order.
    pub fn patterns(&self, user: &SenderId) -> &[Regex] {
        self.rules.get(user).map(Vec::as_slice).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_deserializes_in_order() {
        let corpus = ResponseCorpus::from_json(r#"{ "values": ["foo", "bar"] }"#).unwrap();
        assert_eq!(corpus.values(), ["foo", "bar"]);
    }

    #[test]
    fn empty_corpus_is_rejected() {
        assert!(ResponseCorpus::from_json(r#"{ "values": [] }"#).is_err());
    }

    #[test]
    fn rules_merge_per_user() {
        let rules = UserReplyRules::from_json(
            r#"{ "users": [
                { "slackId": "U1", "messageRegexps": ["pig"] },
                { "slackId": "U2", "messageRegexps": [] },
                { "slackId": "U1", "messageRegexps": ["^cow$"] }
            ] }"#,
        )
        .unwrap();

        let patterns: Vec<_> = rules.patterns(&SenderId::new("U1")).iter().map(Regex::as_str).collect();
        assert_eq!(patterns, ["pig", "^cow$"]);
        assert!(rules.patterns(&SenderId::new("U2")).is_empty());
        assert!(rules.patterns(&SenderId::new("U3")).is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = UserReplyRules::from_json(r#"{ "users": [{ "slackId": "U1", "messageRegexps": ["(unclosed"] }] }"#).unwrap_err();
        assert!(err.to_string().contains("(unclosed"));
    }
}
