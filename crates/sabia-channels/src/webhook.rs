//! Inbound update parsing shared by the webhook endpoint and long polling.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A text message reduced to what the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundText {
    pub chat_id: i64,
    pub text: String,
}

/// Why a webhook payload produced no message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skipped {
    /// Not an object with `message.chat.id`.
    Malformed,
    /// A valid message without text (sticker, photo, voice...).
    NoText,
}

/// Parse a Telegram update. `message.chat.id` is required; `edited_message` is ignored.
pub fn parse_webhook(payload: &Value) -> Result<InboundText, Skipped> {
    let message = payload.get("message").filter(|m| m.is_object()).ok_or(Skipped::Malformed)?;
    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(Value::as_i64)
        .ok_or(Skipped::Malformed)?;
    let text = message.get("text").and_then(Value::as_str).ok_or(Skipped::NoText)?;
    Ok(InboundText {
        chat_id,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_text_message() {
        let payload = json!({
            "update_id": 10,
            "message": {"message_id": 5, "chat": {"id": -100123, "type": "group"}, "text": "What is AI?"}
        });
        assert_eq!(
            parse_webhook(&payload),
            Ok(InboundText {
                chat_id: -100123,
                text: "What is AI?".into()
            })
        );
    }

    #[test]
    fn test_malformed_payloads() {
        assert_eq!(parse_webhook(&json!([])), Err(Skipped::Malformed));
        assert_eq!(parse_webhook(&json!({"update_id": 1})), Err(Skipped::Malformed));
        assert_eq!(parse_webhook(&json!({"message": {"text": "hi"}})), Err(Skipped::Malformed));
        assert_eq!(
            parse_webhook(&json!({"message": {"chat": {"id": "abc"}, "text": "hi"}})),
            Err(Skipped::Malformed)
        );
    }

    #[test]
    fn test_message_without_text() {
        let payload = json!({"message": {"chat": {"id": 7}, "sticker": {}}});
        assert_eq!(parse_webhook(&payload), Err(Skipped::NoText));
    }
}
