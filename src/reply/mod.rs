//! The reply model: the canned corpus, personalized reply lookup, and the
//! probability rolls that decide whether the bot speaks.

pub mod cache;
pub mod corpus;
pub mod engine;
pub mod roll;
