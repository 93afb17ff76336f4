//! Service integrations for external APIs and clients.
//!
//! This module contains the collaborators the reply-bot talks to:
//! - Chat services (e.g., Slack), used to post replies
//! - The HTTP endpoint Slack delivers events to
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod chat;
pub mod http;
