//! Per-sender memoization of personalized replies.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::debug;

use crate::base::types::SenderId;

use super::corpus::{ResponseCorpus, UserReplyRules};

/// A set of personalized replies shared between lookups.
pub type Replies = Arc<[String]>;

/// Finds the corpus entries relevant to a sender.
pub trait ReplyMatcher: Send + Sync + 'static {
    /// Returns the matching responses, deduplicated and in a stable order.
    fn matching_replies(&self, sender: &SenderId) -> Vec<String>;
}

/// Matches corpus entries against the sender's configured patterns.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    corpus: Arc<ResponseCorpus>,
    rules: Arc<UserReplyRules>,
}

impl RuleMatcher {
    pub fn new(corpus: Arc<ResponseCorpus>, rules: Arc<UserReplyRules>) -> Self {
        Self { corpus, rules }
    }
}

impl ReplyMatcher for RuleMatcher {
    fn matching_replies(&self, sender: &SenderId) -> Vec<String> {
        let mut seen = HashSet::new();

        self.rules
            .patterns(sender)
            .iter()
            .flat_map(|pattern| self.corpus.values().iter().filter(move |response| pattern.is_match(response)))
            .filter(|response| seen.insert(response.as_str()))
            .cloned()
            .collect()
    }
}

/// Memoizes [`ReplyMatcher`] results for the life of the process.
///
/// Entries are computed on first lookup and never evicted. A sender whose
/// patterns match nothing is remembered as `None`.
pub struct UserReplyCache {
    matcher: Arc<dyn ReplyMatcher>,
    entries: Mutex<HashMap<SenderId, Option<Replies>>>,
}

impl UserReplyCache {
    pub fn new(matcher: Arc<dyn ReplyMatcher>) -> Self {
        Self {
            matcher,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the personalized replies for `sender`, if there are any.
    pub fn lookup(&self, sender: &SenderId) -> Option<Replies> {
        // The lock is held across the computation so concurrent first lookups
        // for a sender compute it once.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(found) = entries.get(sender) {
            return found.clone();
        }

        let matches = self.matcher.matching_replies(sender);
        debug!(%sender, count = matches.len(), "Computed personalized replies.");

        let found = (!matches.is_empty()).then(|| Replies::from(matches));
        entries.insert(sender.clone(), found.clone());

        found
    }

    /// Number of senders with a computed entry.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
