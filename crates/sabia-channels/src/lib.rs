//! # Sabia Channels
//! Chat transport for Sabia: the Telegram Bot API client and the parsing
//! of inbound updates, whether they arrive by webhook or long polling.

pub mod telegram;
pub mod webhook;

pub use telegram::{TelegramPollingStream, TelegramTransport};
pub use webhook::{InboundText, Skipped, parse_webhook};
