//! Slack Web API request and response models.
//!
//! Only the fields the relay reads or writes are modelled. These types are
//! internal to the Slack adapter.

use serde::{Deserialize, Serialize};

/// Body of `chat.postMessage`.
#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest<'a> {
    /// Channel ID or name.
    pub channel: &'a str,
    /// mrkdwn text.
    pub text: &'a str,
}

/// Body of `chat.update`.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMessageRequest<'a> {
    /// Channel holding the message.
    pub channel: &'a str,
    /// Timestamp identifying the message.
    pub ts: &'a str,
    /// Replacement mrkdwn text.
    pub text: &'a str,
}

/// Envelope shared by Web API responses.
///
/// Slack answers HTTP 200 for most failures and reports them through
/// `ok: false` plus an `error` code.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackResponse {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Error code when `ok` is false (e.g. `channel_not_found`).
    #[serde(default)]
    pub error: Option<String>,
    /// Message timestamp, present on post and update.
    #[serde(default)]
    pub ts: Option<String>,
    /// Channel ID the message lives in.
    #[serde(default)]
    pub channel: Option<String>,
}

impl SlackResponse {
    /// The error code, or a placeholder when Slack sent none.
    pub fn error_code(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown_error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_success() {
        let json = r#"{"ok":true,"channel":"C123","ts":"1700000000.000100","message":{"text":"hi"}}"#;
        let resp: SlackResponse = serde_json::from_str(json).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.ts.as_deref(), Some("1700000000.000100"));
        assert_eq!(resp.channel.as_deref(), Some("C123"));
    }

    #[test]
    fn test_deserialize_failure() {
        let resp: SlackResponse =
            serde_json::from_str(r#"{"ok":false,"error":"message_not_found"}"#).unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error_code(), "message_not_found");
        assert_eq!(SlackResponse::default().error_code(), "unknown_error");
    }

    #[test]
    fn test_serialize_update() {
        let body = UpdateMessageRequest {
            channel: "C1",
            ts: "1.2",
            text: "*Banner*",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"channel": "C1", "ts": "1.2", "text": "*Banner*"})
        );
    }
}
