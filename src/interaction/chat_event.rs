use tracing::{debug, info, instrument};

use crate::{
    event::ChatMessage,
    reply::engine::{Decision, DecisionEngine},
    service::chat::ChatClient,
};

use super::request::{HandlerError, Outcome};

/// Decides on a reply to a chat message and posts it.
///
/// Delivery failures are returned, not retried.
#[instrument(skip_all, fields(channel = %message.channel))]
pub async fn handle_chat_message(engine: &DecisionEngine, chat: &ChatClient, message: &ChatMessage) -> Result<Outcome, HandlerError> {
    match engine.decide(message) {
        Decision::Reply { text, source, roll } => {
            info!(?source, drawn = roll.drawn, required = roll.required, "Replying ...");

            let response = chat.post_message(message.channel.as_str(), &text).await.map_err(HandlerError::Delivery)?;
            debug!("Post response: {}", response);

            Ok(Outcome::Replied { text, response })
        }
        Decision::NoReply(silence) => {
            debug!(?silence, "Not replying.");
            Ok(Outcome::NoReply)
        }
    }
}
