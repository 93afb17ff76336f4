//! Library root for `reply-bot`.
//!
//! Reply-bot is a Slack Events API responder that occasionally chimes in on
//! conversations with a canned response:
//! - Verifies that each request was signed by Slack
//! - Acknowledges redelivered requests without reprocessing them
//! - Decodes events, keeping unknown kinds as data
//! - Rolls against configured chances to pick at most one reply per message,
//!   preferring responses tailored to the sender
//!
//! The corpus and per-user rules are loaded once at startup and shared by
//! every request.

#[deny(missing_docs)]
pub mod base;
pub mod event;
pub mod interaction;
pub mod reply;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the reply-bot runtime:
/// - Initializes the crypto provider
/// - Loads the corpus and creates the chat client
/// - Serves the event endpoint
pub async fn start(config: Config) -> Void {
    info!("Starting reply-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the default crypto provider."))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
