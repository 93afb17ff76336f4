//! Load configuration via `config` crate with env-override support.

use std::{
    ops::Deref,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::Deserialize;

use super::types::Res;

/// Default chance of replying to any message from the full corpus.
fn default_reply_chance() -> f64 {
    0.02
}

/// Default ceiling for the personalized reply chance.
fn default_max_reply_chance() -> f64 {
    0.1
}

/// Default ceiling for the personalized reply chance when the bot is mentioned.
fn default_max_mention_reply_chance() -> f64 {
    0.5
}

/// Default number of personalized replies needed to reach the full personalized chance.
fn default_reply_threshold() -> u32 {
    10
}

/// Default location of the response corpus.
fn default_responses_path() -> PathBuf {
    PathBuf::from("responses.json")
}

/// Default socket address for the event endpoint.
fn default_listen_address() -> String {
    "0.0.0.0:3000".to_string()
}

/// Default path of the event endpoint.
fn default_event_path() -> String {
    "/slack/event".to_string()
}

/// Configuration for the reply-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// The configuration values, as loaded.
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Slack bot token (`SLACK_BOT_TOKEN`).
    pub slack_bot_token: String,
    /// Slack signing secret (`SLACK_SIGNING_SECRET`).
    pub slack_signing_secret: String,
    /// The bot's own user ID (`BOT_USER_ID`).
    /// When unset, it is resolved through `auth.test` at startup.
    #[serde(default)]
    pub bot_user_id: Option<String>,
    /// Chance of replying from the full corpus (`REPLY_CHANCE`).
    #[serde(default = "default_reply_chance")]
    pub reply_chance: f64,
    /// Ceiling of the personalized reply chance (`MAX_REPLY_CHANCE`).
    #[serde(default = "default_max_reply_chance")]
    pub max_reply_chance: f64,
    /// Ceiling of the personalized reply chance on a mention (`MAX_MENTION_REPLY_CHANCE`).
    #[serde(default = "default_max_mention_reply_chance")]
    pub max_mention_reply_chance: f64,
    /// Personalized replies needed before the ceiling applies in full (`REPLY_THRESHOLD`).
    #[serde(default = "default_reply_threshold")]
    pub reply_threshold: u32,
    /// Path to the JSON response corpus (`RESPONSES_PATH`).
    #[serde(default = "default_responses_path")]
    pub responses_path: PathBuf,
    /// Path to the JSON per-user reply rules (`USER_REPLIES_PATH`).
    #[serde(default)]
    pub user_replies_path: Option<PathBuf>,
    /// Socket address to listen on (`LISTEN_ADDRESS`).
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Path of the event endpoint (`EVENT_PATH`).
    #[serde(default = "default_event_path")]
    pub event_path: String,
    /// Maximum allowed skew between the request timestamp and receipt (`MAX_REQUEST_AGE_SECS`).
    #[serde(default)]
    pub max_request_age_secs: Option<u64>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            slack_bot_token: String::new(),
            slack_signing_secret: String::new(),
            bot_user_id: None,
            reply_chance: default_reply_chance(),
            max_reply_chance: default_max_reply_chance(),
            max_mention_reply_chance: default_max_mention_reply_chance(),
            reply_threshold: default_reply_threshold(),
            responses_path: default_responses_path(),
            user_replies_path: None,
            listen_address: default_listen_address(),
            event_path: default_event_path(),
            max_request_age_secs: None,
        }
    }
}

impl Config {
    /// Loads the configuration from an optional TOML file, overridden by
    /// `REPLY_BOT_`-prefixed environment variables, and validates it.
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let mut cfg = config::Config::builder();

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        cfg = cfg.add_source(config::Environment::default().prefix("REPLY_BOT"));

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        result.validate()?;

        Ok(result)
    }

    /// Checks the invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Res<()> {
        let chances = [
            ("reply_chance", self.reply_chance),
            ("max_reply_chance", self.max_reply_chance),
            ("max_mention_reply_chance", self.max_mention_reply_chance),
        ];

        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow::anyhow!("{name} must be between 0 and 1."));
            }
        }

        if self.reply_threshold == 0 {
            return Err(anyhow::anyhow!("reply_threshold must be greater than 0."));
        }

        if !self.event_path.starts_with('/') {
            return Err(anyhow::anyhow!("event_path must start with `/`."));
        }

        Ok(())
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}
