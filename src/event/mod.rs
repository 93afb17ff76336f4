//! The inbound Slack Events API wire protocol.
//!
//! Payloads are decoded into closed enums, each with an `Unknown` arm that
//! keeps the raw `type` string. Decoding never fails just because Slack sent
//! an event kind we do not know about; deciding what to do with such a value
//! is left to the caller.

pub mod blocks;
mod tagged;

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::base::types::{ChannelId, SenderId};

use blocks::Block;

/// The outer envelope of a request to the event endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Sent once when the endpoint is registered; the `challenge` must be echoed.
    UrlVerification { challenge: String },
    /// Wraps an event the app is subscribed to.
    EventCallback(EventCallback),
    /// Any other envelope kind.
    Unknown { kind: String },
}

/// The `event_callback` envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventCallback {
    pub event: InnerEvent,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// The event nested inside an `event_callback`.
///
/// Subtyped messages (`message_changed`, `bot_message`, ...) are `Unknown`
/// with a `message/<subtype>` kind.
#[derive(Debug, Clone, PartialEq)]
pub enum InnerEvent {
    Message(ChatMessage),
    Unknown { kind: String },
}

/// A message posted to a channel the bot can see.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub text: String,
    /// The sender.
    pub user: SenderId,
    pub channel: ChannelId,
    /// Users referenced through rich-text `user` elements.
    pub mentions: HashSet<SenderId>,
}

impl Event {
    /// Decodes a raw request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

impl ChatMessage {
    /// Whether `user` is among the mentioned users.
    pub fn mentions_user(&self, user: &SenderId) -> bool {
        self.mentions.contains(user)
    }
}

// Known shapes.

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownEvent {
    UrlVerification { challenge: String },
    EventCallback(EventCallback),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownInnerEvent {
    Message(RawChatMessage),
}

#[derive(Deserialize)]
struct RawChatMessage {
    #[serde(default)]
    text: String,
    user: SenderId,
    channel: ChannelId,
    #[serde(default)]
    blocks: Vec<Block>,
}

impl From<KnownEvent> for Event {
    fn from(known: KnownEvent) -> Self {
        match known {
            KnownEvent::UrlVerification { challenge } => Event::UrlVerification { challenge },
            KnownEvent::EventCallback(callback) => Event::EventCallback(callback),
        }
    }
}

impl From<KnownInnerEvent> for InnerEvent {
    fn from(known: KnownInnerEvent) -> Self {
        match known {
            KnownInnerEvent::Message(raw) => InnerEvent::Message(ChatMessage {
                mentions: blocks::mentions(&raw.blocks),
                text: raw.text,
                user: raw.user,
                channel: raw.channel,
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged::decode::<D, KnownEvent, _>(deserializer, &["url_verification", "event_callback"], |kind| Event::Unknown { kind })
    }
}

impl<'de> Deserialize<'de> for InnerEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged::decode_unsubtyped::<D, KnownInnerEvent, _>(deserializer, &["message"], |kind| InnerEvent::Unknown { kind })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(value: serde_json::Value) -> Event {
        Event::from_slice(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn decodes_url_verification() {
        let event = decode(json!({
            "token": "Jhj5dZrVaK7ZwHHjRyZWjbDl",
            "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
            "type": "url_verification"
        }));

        assert_eq!(
            event,
            Event::UrlVerification {
                challenge: "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".into()
            }
        );
    }

    #[test]
    fn decodes_message_with_mentions() {
        let event = decode(json!({
            "token": "XXYYZZ",
            "team_id": "TXXXXXXXX",
            "type": "event_callback",
            "event_id": "Ev08MFMKH6",
            "event": {
                "type": "message",
                "channel": "C2147483705",
                "user": "U2147483697",
                "text": "<@ABCDEFG> a b c <!channel>",
                "ts": "1355517523.000005",
                "blocks": [{
                    "type": "rich_text",
                    "elements": [{
                        "type": "rich_text_section",
                        "elements": [
                            { "type": "user", "user_id": "ABCDEFG" },
                            { "type": "text", "text": " a b c " },
                            { "type": "broadcast", "range": "channel" }
                        ]
                    }]
                }]
            }
        }));

        let Event::EventCallback(callback) = event else {
            panic!("expected an event callback");
        };
        let InnerEvent::Message(message) = callback.event else {
            panic!("expected a message");
        };

        assert_eq!(callback.event_id.as_deref(), Some("Ev08MFMKH6"));
        assert_eq!(message.text, "<@ABCDEFG> a b c <!channel>");
        assert_eq!(message.user, SenderId::new("U2147483697"));
        assert_eq!(message.channel, ChannelId::new("C2147483705"));
        assert!(message.mentions_user(&SenderId::new("ABCDEFG")));
        assert_eq!(message.mentions.len(), 1);
    }

    #[test]
    fn message_without_blocks_has_no_mentions() {
        let event = decode(json!({
            "type": "event_callback",
            "event": { "type": "message", "channel": "C1", "user": "U1", "text": "hello" }
        }));

        let Event::EventCallback(EventCallback {
            event: InnerEvent::Message(message),
            ..
        }) = event
        else {
            panic!("expected a message");
        };

        assert!(message.mentions.is_empty());
    }

    #[test]
    fn unknown_outer_kind_is_preserved() {
        let event = decode(json!({ "type": "app_rate_limited", "minute_rate_limited": 1518467820 }));
        assert_eq!(event, Event::Unknown { kind: "app_rate_limited".into() });
    }

    #[test]
    fn unknown_inner_kind_is_preserved() {
        let event = decode(json!({
            "type": "event_callback",
            "event": { "type": "reaction_added", "user": "U1", "reaction": "thumbsup" }
        }));

        let Event::EventCallback(callback) = event else {
            panic!("expected an event callback");
        };
        assert_eq!(callback.event, InnerEvent::Unknown { kind: "reaction_added".into() });
    }

    #[test]
    fn subtyped_message_is_unknown() {
        let event = decode(json!({
            "type": "event_callback",
            "event": {
                "type": "message",
                "subtype": "message_changed",
                "hidden": true,
                "channel": "C123ABC456",
                "ts": "1358878755.000001",
                "message": {
                    "type": "message",
                    "user": "U123ABC456",
                    "text": "Hello, world!",
                    "ts": "1355517523.000005",
                    "edited": { "user": "U123ABC456", "ts": "1358878755.000001" }
                }
            }
        }));

        let Event::EventCallback(callback) = event else {
            panic!("expected an event callback");
        };
        assert_eq!(callback.event, InnerEvent::Unknown { kind: "message/message_changed".into() });
    }

    #[test]
    fn known_kind_with_missing_fields_fails() {
        let result = Event::from_slice(json!({ "type": "event_callback", "event": { "type": "message", "text": "hi" } }).to_string().as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn malformed_json_fails() {
        assert!(Event::from_slice(b"{ not json").is_err());
    }
}
