//! Decides whether, and with what, to answer a chat message.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::{
    base::{config::Config, types::SenderId},
    event::ChatMessage,
};

use super::{
    cache::UserReplyCache,
    corpus::ResponseCorpus,
    roll::{RandomSource, RollOutcome, roll},
};

/// The chances that drive reply decisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityConfig {
    /// Chance of replying from the full corpus.
    pub reply_chance: f64,
    /// Personalized chance once a sender has `reply_threshold` matches.
    pub max_reply_chance: f64,
    /// Same as `max_reply_chance`, used when the bot is mentioned.
    pub max_mention_reply_chance: f64,
    /// Always greater than zero.
    pub reply_threshold: u32,
}

impl From<&Config> for ProbabilityConfig {
    fn from(config: &Config) -> Self {
        Self {
            reply_chance: config.reply_chance,
            max_reply_chance: config.max_reply_chance,
            max_mention_reply_chance: config.max_mention_reply_chance,
            reply_threshold: config.reply_threshold,
        }
    }
}

impl ProbabilityConfig {
    /// Chance of a personalized reply given `count` candidates.
    pub fn personalized(&self, count: usize, is_mention: bool) -> f64 {
        let max = if is_mention { self.max_mention_reply_chance } else { self.max_reply_chance };
        let scale = (count as f64 / f64::from(self.reply_threshold.max(1))).min(1.0);

        max * scale
    }

    /// Chance of a reply from the full corpus. A mention always gets one.
    pub fn global(&self, is_mention: bool) -> f64 {
        if is_mention { 1.0 } else { self.reply_chance }
    }
}

/// Where a reply was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Personalized,
    Global,
}

/// Why no reply was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Silence {
    /// The message was written by the bot itself.
    SelfAuthored,
    /// There was nothing to pick from.
    EmptyCorpus,
    /// Every roll failed; the last outcome is kept.
    RollFailed(RollOutcome),
}

/// The result of deciding on a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Reply { text: String, source: ReplySource, roll: RollOutcome },
    NoReply(Silence),
}

/// Combines the corpus, the personalized cache, and the configured chances.
#[derive(Clone)]
pub struct DecisionEngine {
    bot_user_id: SenderId,
    probabilities: ProbabilityConfig,
    corpus: Arc<ResponseCorpus>,
    cache: Arc<UserReplyCache>,
    random: Arc<dyn RandomSource>,
}

impl DecisionEngine {
    pub fn new(bot_user_id: SenderId, probabilities: ProbabilityConfig, corpus: Arc<ResponseCorpus>, cache: Arc<UserReplyCache>, random: Arc<dyn RandomSource>) -> Self {
        Self {
            bot_user_id,
            probabilities,
            corpus,
            cache,
            random,
        }
    }

    pub fn bot_user_id(&self) -> &SenderId {
        &self.bot_user_id
    }

    /// Decides on at most one reply to `message`.
    #[instrument(skip_all, fields(sender = %message.user, channel = %message.channel))]
    pub fn decide(&self, message: &ChatMessage) -> Decision {
        if message.user == self.bot_user_id {
            debug!("Ignoring message from the bot itself.");
            return Decision::NoReply(Silence::SelfAuthored);
        }

        let is_mention = message.mentions_user(&self.bot_user_id);

        // Personalized replies get the first roll.

        if let Some(replies) = self.cache.lookup(&message.user) {
            let probability = self.probabilities.personalized(replies.len(), is_mention);
            let outcome = roll(probability, self.random.as_ref());
            debug!(is_mention, candidates = replies.len(), ?outcome, "Rolled for a personalized reply.");

            if outcome.succeeded {
                let text = replies[self.random.pick(replies.len())].clone();
                return Decision::Reply {
                    text,
                    source: ReplySource::Personalized,
                    roll: outcome,
                };
            }
        }

        // Fall back to the full corpus.

        if self.corpus.is_empty() {
            warn!("The response corpus is empty; not replying.");
            return Decision::NoReply(Silence::EmptyCorpus);
        }

        let outcome = roll(self.probabilities.global(is_mention), self.random.as_ref());
        debug!(is_mention, ?outcome, "Rolled for a global reply.");

        if !outcome.succeeded {
            return Decision::NoReply(Silence::RollFailed(outcome));
        }

        let values = self.corpus.values();
        Decision::Reply {
            text: values[self.random.pick(values.len())].clone(),
            source: ReplySource::Global,
            roll: outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use regex::Regex;

    use super::*;
    use crate::{
        base::types::ChannelId,
        reply::{
            cache::RuleMatcher,
            corpus::{UserReplyRule, UserReplyRules},
            roll::tests::FixedRandom,
        },
    };

    const BOT: &str = "botUser";
    const SENDER: &str = "triggerUser";

    fn probabilities(reply_chance: f64, max_reply_chance: f64, max_mention_reply_chance: f64, reply_threshold: u32) -> ProbabilityConfig {
        ProbabilityConfig {
            reply_chance,
            max_reply_chance,
            max_mention_reply_chance,
            reply_threshold,
        }
    }

    fn engine(probabilities: ProbabilityConfig, corpus: Vec<String>, patterns: &[&str], drawn: f64) -> DecisionEngine {
        let corpus = Arc::new(ResponseCorpus::new(corpus));
        let rules = UserReplyRules::new([UserReplyRule {
            user: SenderId::new(SENDER),
            patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
        }]);
        let cache = Arc::new(UserReplyCache::new(Arc::new(RuleMatcher::new(corpus.clone(), Arc::new(rules)))));

        DecisionEngine::new(SenderId::new(BOT), probabilities, corpus, cache, Arc::new(FixedRandom(drawn)))
    }

    fn message(user: &str, mentions: &[&str]) -> ChatMessage {
        ChatMessage {
            text: "Dude!".into(),
            user: SenderId::new(user),
            channel: ChannelId::new("channel"),
            mentions: mentions.iter().map(|m| SenderId::new(*m)).collect::<HashSet<_>>(),
        }
    }

    /// A large corpus where only the last entry is personalized, so a pick of
    /// index 0 distinguishes global from personalized replies.
    fn big_corpus() -> Vec<String> {
        (1..=1000).map(|i| i.to_string()).chain(["pig".to_string()]).collect()
    }

    #[test]
    fn personalized_chance_scales_with_candidates() {
        let p = probabilities(0.0, 1.0, 0.5, 5);

        assert!((p.personalized(1, false) - 0.2).abs() < 1e-12);
        assert!((p.personalized(1, true) - 0.1).abs() < 1e-12);
        assert_eq!(p.personalized(5, false), 1.0);
        assert_eq!(p.personalized(50, false), 1.0);
        assert_eq!(p.global(true), 1.0);
        assert_eq!(p.global(false), 0.0);
    }

    #[test]
    fn never_replies_to_itself() {
        let engine = engine(probabilities(1.0, 1.0, 1.0, 1), vec!["testResponse".into()], &[], 0.99);

        assert_eq!(engine.decide(&message(BOT, &[BOT])), Decision::NoReply(Silence::SelfAuthored));
    }

    #[test]
    fn replies_when_the_global_roll_succeeds() {
        let engine = engine(probabilities(0.1, 0.0, 0.0, 1), vec!["testResponse".into()], &[], 0.9);

        let Decision::Reply { text, source, .. } = engine.decide(&message(SENDER, &[])) else {
            panic!("expected a reply");
        };
        assert_eq!(text, "testResponse");
        assert_eq!(source, ReplySource::Global);
    }

    #[test]
    fn stays_silent_when_the_global_roll_fails() {
        let engine = engine(probabilities(0.1, 0.0, 0.0, 1), vec!["testResponse".into()], &[], 0.899_999);

        assert!(matches!(engine.decide(&message(SENDER, &[])), Decision::NoReply(Silence::RollFailed(_))));
    }

    #[test]
    fn zero_chance_never_replies() {
        let engine = engine(probabilities(0.0, 0.0, 0.0, 1), vec!["testResponse".into()], &[], 1.0);

        assert!(matches!(engine.decide(&message(SENDER, &[])), Decision::NoReply(_)));
    }

    #[test]
    fn a_mention_always_replies() {
        let engine = engine(probabilities(0.0, 0.0, 0.0, 1), vec!["testResponse".into()], &[], 0.0);

        assert!(matches!(engine.decide(&message(SENDER, &[BOT])), Decision::Reply { source: ReplySource::Global, .. }));
    }

    #[test]
    fn personalized_reply_wins_when_its_roll_succeeds() {
        let engine = engine(probabilities(0.0, 0.1, 0.0, 1), big_corpus(), &["pig"], 0.9);

        let decision = engine.decide(&message(SENDER, &[]));

        let Decision::Reply { text, source, roll } = decision else {
            panic!("expected a reply");
        };
        assert_eq!(text, "pig");
        assert_eq!(source, ReplySource::Personalized);
        assert!(roll.succeeded);
    }

    #[test]
    fn personalized_reply_on_mention_uses_the_mention_chance() {
        let engine = engine(probabilities(0.0, 0.0, 0.1, 1), big_corpus(), &["pig"], 0.9);

        let decision = engine.decide(&message(SENDER, &[BOT]));

        assert!(matches!(decision, Decision::Reply { source: ReplySource::Personalized, ref text, .. } if text == "pig"));
    }

    #[test]
    fn few_candidates_reduce_the_personalized_chance() {
        // One candidate against a threshold of five leaves a 0.2 chance.
        let above = engine(probabilities(0.0, 1.0, 0.0, 5), big_corpus(), &["pig"], 0.81);
        let below = engine(probabilities(0.0, 1.0, 0.0, 5), big_corpus(), &["pig"], 0.79);

        assert!(matches!(above.decide(&message(SENDER, &[])), Decision::Reply { source: ReplySource::Personalized, .. }));
        assert!(matches!(below.decide(&message(SENDER, &[])), Decision::NoReply(Silence::RollFailed(_))));
    }

    #[test]
    fn a_mention_falls_back_to_the_corpus_when_the_personalized_roll_fails() {
        let above = engine(probabilities(0.0, 0.0, 1.0, 5), big_corpus(), &["pig"], 0.81);
        let below = engine(probabilities(0.0, 0.0, 1.0, 5), big_corpus(), &["pig"], 0.79);

        assert!(matches!(above.decide(&message(SENDER, &[BOT])), Decision::Reply { source: ReplySource::Personalized, .. }));

        let Decision::Reply { text, source, .. } = below.decide(&message(SENDER, &[BOT])) else {
            panic!("a mention should always get a reply");
        };
        assert_eq!(source, ReplySource::Global);
        assert_eq!(text, "1");
    }

    #[test]
    fn an_empty_corpus_is_a_no_op() {
        let engine = engine(probabilities(1.0, 1.0, 1.0, 1), vec![], &["pig"], 0.5);

        assert_eq!(engine.decide(&message(SENDER, &[BOT])), Decision::NoReply(Silence::EmptyCorpus));
    }
}
