//! Common types and result aliases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The application-wide error type.
pub type Err = anyhow::Error;
/// A result carrying the application-wide error.
pub type Res<T> = Result<T, Err>;
/// A result with no value.
pub type Void = Res<()>;

/// Identity of a message author (a Slack user ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SenderId(pub String);

/// Identity of a reply destination (a Slack channel ID).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub String);

impl SenderId {
    /// Wraps a raw user ID.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ChannelId {
    /// Wraps a raw channel ID.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
