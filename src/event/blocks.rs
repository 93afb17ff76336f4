//! Block Kit content attached to messages.
//!
//! Only the rich-text subset is modelled; it is where Slack records structured
//! user mentions. See <https://api.slack.com/reference/block-kit/blocks#rich_text>.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::base::types::SenderId;

use super::tagged;

/// A top-level message block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    RichText { elements: Vec<RichTextElement> },
    Unknown { kind: String },
}

/// An element of a `rich_text` block.
#[derive(Debug, Clone, PartialEq)]
pub enum RichTextElement {
    Section { elements: Vec<SectionElement> },
    Unknown { kind: String },
}

/// An inline element of a `rich_text_section`.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionElement {
    User { user_id: SenderId },
    Text { text: String },
    Broadcast { range: BroadcastRange },
    Unknown { kind: String },
}

/// Audience of an `@here`/`@channel`/`@everyone` broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BroadcastRange {
    Here,
    Channel,
    Everyone,
    #[serde(other)]
    Unknown,
}

impl Block {
    /// Users referenced by this block.
    pub fn mentions(&self) -> impl Iterator<Item = &SenderId> {
        let elements: &[RichTextElement] = match self {
            Block::RichText { elements } => elements,
            Block::Unknown { .. } => &[],
        };

        elements.iter().flat_map(RichTextElement::mentions)
    }
}

impl RichTextElement {
    pub fn mentions(&self) -> impl Iterator<Item = &SenderId> {
        let elements: &[SectionElement] = match self {
            RichTextElement::Section { elements } => elements,
            RichTextElement::Unknown { .. } => &[],
        };

        elements.iter().filter_map(|element| match element {
            SectionElement::User { user_id } => Some(user_id),
            _ => None,
        })
    }
}

/// Collects every user mentioned across `blocks`.
pub fn mentions(blocks: &[Block]) -> HashSet<SenderId> {
    blocks.iter().flat_map(Block::mentions).cloned().collect()
}

// Known shapes.

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownBlock {
    RichText {
        #[serde(default)]
        elements: Vec<RichTextElement>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownRichTextElement {
    RichTextSection {
        #[serde(default)]
        elements: Vec<SectionElement>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownSectionElement {
    User { user_id: SenderId },
    Text { text: String },
    Broadcast { range: BroadcastRange },
}

impl From<KnownBlock> for Block {
    fn from(known: KnownBlock) -> Self {
        match known {
            KnownBlock::RichText { elements } => Block::RichText { elements },
        }
    }
}

impl From<KnownRichTextElement> for RichTextElement {
    fn from(known: KnownRichTextElement) -> Self {
        match known {
            KnownRichTextElement::RichTextSection { elements } => RichTextElement::Section { elements },
        }
    }
}

impl From<KnownSectionElement> for SectionElement {
    fn from(known: KnownSectionElement) -> Self {
        match known {
            KnownSectionElement::User { user_id } => SectionElement::User { user_id },
            KnownSectionElement::Text { text } => SectionElement::Text { text },
            KnownSectionElement::Broadcast { range } => SectionElement::Broadcast { range },
        }
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged::decode::<D, KnownBlock, _>(deserializer, &["rich_text"], |kind| Block::Unknown { kind })
    }
}

impl<'de> Deserialize<'de> for RichTextElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged::decode::<D, KnownRichTextElement, _>(deserializer, &["rich_text_section"], |kind| RichTextElement::Unknown { kind })
    }
}

impl<'de> Deserialize<'de> for SectionElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        tagged::decode::<D, KnownSectionElement, _>(deserializer, &["user", "text", "broadcast"], |kind| SectionElement::Unknown { kind })
    }
}
