//! Event handling for reply-bot.
//!
//! This module provides the request pipeline for the event endpoint:
//! - Verifying that requests come from Slack
//! - Acknowledging redeliveries without reprocessing them
//! - Dispatching decoded events, and replying to chat messages

pub mod auth;
pub mod chat_event;
pub mod request;
