//! Runtime services and shared state for the reply-bot.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::{
    base::{
        config::Config,
        types::{Res, SenderId, Void},
    },
    reply::{
        cache::{RuleMatcher, UserReplyCache},
        corpus::{ResponseCorpus, UserReplyRules},
        engine::{DecisionEngine, ProbabilityConfig},
        roll::{RandomSource, ThreadRandom},
    },
    service::{chat::ChatClient, http},
};

/// Runtime service context that can be shared across the application.
///
/// Everything here is loaded once at startup and shared by every request.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The reply decision engine.
    pub engine: DecisionEngine,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Load the corpus and the reply rules.

        let corpus = ResponseCorpus::load(&config.responses_path)?;
        let rules = match &config.user_replies_path {
            Some(path) => UserReplyRules::load(path)?,
            None => UserReplyRules::default(),
        };

        // Initialize the slack client.
        let chat = ChatClient::slack(&config).await?;

        Ok(Self::from_parts(config, corpus, rules, chat, Arc::new(ThreadRandom)))
    }

    /// Assembles a runtime from already-loaded parts.
    pub fn from_parts(config: Config, corpus: ResponseCorpus, rules: UserReplyRules, chat: ChatClient, random: Arc<dyn RandomSource>) -> Self {
        let corpus = Arc::new(corpus);
        let matcher = RuleMatcher::new(corpus.clone(), Arc::new(rules));
        let cache = Arc::new(UserReplyCache::new(Arc::new(matcher)));

        let bot_user_id = SenderId::new(chat.bot_user_id());
        let engine = DecisionEngine::new(bot_user_id, ProbabilityConfig::from(&config), corpus, cache, random);

        Self { config, engine, chat }
    }

    /// Serve the event endpoint until Ctrl-C.
    pub async fn start(&self) -> Void {
        let listener = TcpListener::bind(&self.config.listen_address).await?;
        info!("Listening for events on {}{}", self.config.listen_address, self.config.event_path);

        axum::serve(listener, http::router(self.clone()))
            .with_graceful_shutdown(shutdown_signal(tokio::signal::ctrl_c()))
            .await?;

        Ok(())
    }
}

/// Resolves once `signal` fires. A signal that cannot be installed never resolves.
async fn shutdown_signal(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        error!("Failed to listen for Ctrl-C, serving until killed: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutting down ...");
}
