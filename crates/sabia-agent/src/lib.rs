//! # Sabia Agent
//! The reply pipeline that workers run for each chat message.
//!
//! ## Flow
//! - **Acknowledge**: "Processing..." is sent first and later replaced in place
//! - **Route**: `/start` and `/help`, `/wordcloud` and `/wc`, greetings, questions
//! - **Answer**: retrieval, then sentiment framing by [`ResponseAdapter`]
//! - **Voice**: optional spoken copy of the answer through the speech chain

pub mod adapter;
pub mod handler;
pub mod responder;
pub mod wordcloud;

pub use adapter::ResponseAdapter;
pub use handler::{ChatHandler, Route};
pub use responder::{Reply, Responder};
pub use wordcloud::WordCloudService;
