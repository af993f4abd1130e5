//! Inbound Deskfy webhook events.
//!
//! Deskfy payloads are loosely typed: the same field shows up under
//! different names depending on the event and on the webhook version, and
//! the body may or may not be wrapped in `{ "event": .., "data": .. }`.
//! [`InboundEvent::from_value`] normalizes all of that into one struct.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of a Deskfy webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    /// A task was created.
    NewTask,
    /// A task changed (usually its status).
    UpdateTask,
    /// A comment was added to a task.
    NewTaskComment,
    /// The task briefing was edited.
    UpdateBriefing,
    /// Any event name the relay has no dedicated template for.
    Other(String),
}

impl EventKind {
    /// Name used by Deskfy on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewTask => "NEW_TASK",
            Self::UpdateTask => "UPDATE_TASK",
            Self::NewTaskComment => "NEW_TASK_COMMENT",
            Self::UpdateBriefing => "UPDATE_BRIEFING",
            Self::Other(name) => name,
        }
    }

    /// Whether the event carries a comment body.
    pub const fn is_comment(&self) -> bool {
        matches!(self, Self::NewTaskComment)
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name.trim() {
            "NEW_TASK" => Self::NewTask,
            "UPDATE_TASK" => Self::UpdateTask,
            "NEW_TASK_COMMENT" => Self::NewTaskComment,
            "UPDATE_BRIEFING" => Self::UpdateBriefing,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event name used when the payload does not name one.
pub const DEFAULT_EVENT_NAME: &str = "update";

/// A normalized inbound event, before title resolution and filtering.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InboundEvent {
    /// Event kind.
    pub kind: Option<EventKind>,
    /// External task identifier, stringified.
    pub task_id: Option<String>,
    /// Title as sent by Deskfy, trimmed. `None` when missing or blank.
    pub raw_title: Option<String>,
    /// Raw status code (e.g. `WAITING_USER_ADJUST`).
    pub status: Option<String>,
    /// Designer or comment author.
    pub author: Option<String>,
    /// Free-text message or comment body.
    pub message: Option<String>,
    /// Tags attached to the task.
    pub tags: Vec<String>,
}

impl InboundEvent {
    /// Normalize a decoded webhook body.
    ///
    /// Accepts both the wrapped `{ event, data }` shape and a flat object.
    /// Anything that is not an object yields an empty event.
    pub fn from_value(body: &Value) -> Self {
        let empty = Map::new();
        let top = body.as_object().unwrap_or(&empty);
        let data = top.get("data").and_then(Value::as_object).unwrap_or(top);

        let kind = text_at(top, &["event"])
            .or_else(|| text_at(data, &["event"]))
            .or_else(|| text_at(data, &["action"]))
            .map(EventKind::from);

        Self {
            kind,
            task_id: first_text(data, &[&["id"], &["taskId"], &["task", "id"], &["job_id"]]),
            raw_title: first_text(data, &[&["name"], &["title"], &["taskTitle"]]),
            status: text_at(data, &["status"]),
            author: first_text(data, &[&["author_name"], &["author", "name"], &["designer"]]),
            message: first_text(data, &[&["message"], &["comment"]]),
            tags: tags_of(data),
        }
    }

    /// Event kind, falling back to the generic `update` event.
    pub fn kind_or_default(&self) -> EventKind {
        self.kind
            .clone()
            .unwrap_or_else(|| EventKind::from(DEFAULT_EVENT_NAME))
    }
}

/// Decode a raw request body.
///
/// Never fails: unparseable bodies become an empty object, and a body that
/// is a JSON string holding JSON is decoded a second time.
pub fn decode_body(bytes: &[u8]) -> Value {
    let value = match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::String(inner)) => serde_json::from_str(&inner).ok(),
        Ok(value) => Some(value),
        Err(err) => {
            if !bytes.is_empty() {
                tracing::warn!(error = %err, len = bytes.len(), "unparseable webhook body, using empty payload");
            }
            None
        }
    };

    match value {
        Some(value @ Value::Object(_)) => value,
        _ => Value::Object(Map::new()),
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = obj.get(*first)?;
    for key in rest {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

fn text_at(obj: &Map<String, Value>, path: &[&str]) -> Option<String> {
    match lookup(obj, path)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(obj: &Map<String, Value>, paths: &[&[&str]]) -> Option<String> {
    paths.iter().find_map(|path| text_at(obj, path))
}

fn tags_of(obj: &Map<String, Value>) -> Vec<String> {
    let Some(Value::Array(items)) = obj.get("tags") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(tag) => tag
                .get("name")
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_wrapped_payload() {
        let body = json!({
            "event": "NEW_TASK_COMMENT",
            "data": {
                "task": { "id": 981 },
                "taskTitle": "  Cardápio Verão  ",
                "status": "REVIEW",
                "author": { "name": "Ana Souza" },
                "comment": "Ajustar fonte",
                "tags": ["GEO RJ", { "name": "Urgente" }, 3]
            }
        });

        let event = InboundEvent::from_value(&body);
        assert_eq!(event.kind, Some(EventKind::NewTaskComment));
        assert_eq!(event.task_id.as_deref(), Some("981"));
        assert_eq!(event.raw_title.as_deref(), Some("Cardápio Verão"));
        assert_eq!(event.status.as_deref(), Some("REVIEW"));
        assert_eq!(event.author.as_deref(), Some("Ana Souza"));
        assert_eq!(event.message.as_deref(), Some("Ajustar fonte"));
        assert_eq!(event.tags, vec!["GEO RJ", "Urgente"]);
    }

    #[test]
    fn test_flat_payload() {
        let body = json!({
            "id": "job-7",
            "name": "Banner A",
            "status": "WAITING_USER_ADJUST",
            "author_name": "Designer - Caio",
            "message": "Nova versão enviada",
            "event": "UPDATE_TASK"
        });

        let event = InboundEvent::from_value(&body);
        assert_eq!(event.kind, Some(EventKind::UpdateTask));
        assert_eq!(event.task_id.as_deref(), Some("job-7"));
        assert_eq!(event.raw_title.as_deref(), Some("Banner A"));
        assert_eq!(event.author.as_deref(), Some("Designer - Caio"));
        assert_eq!(event.message.as_deref(), Some("Nova versão enviada"));
    }

    #[test]
    fn test_id_precedence_and_blank_title() {
        let body = json!({ "data": { "id": "", "taskId": "t-1", "job_id": "j-1", "name": "   ", "title": "Real" } });
        let event = InboundEvent::from_value(&body);
        assert_eq!(event.task_id.as_deref(), Some("t-1"));
        assert_eq!(event.raw_title.as_deref(), Some("Real"));
        assert_eq!(event.kind, None);
        assert_eq!(event.kind_or_default(), EventKind::Other("update".to_string()));
    }

    #[test]
    fn test_non_object_body_is_empty_event() {
        assert_eq!(InboundEvent::from_value(&json!([1, 2])), InboundEvent::default());
        assert_eq!(InboundEvent::from_value(&Value::Null), InboundEvent::default());
    }

    #[test]
    fn test_decode_body_variants() {
        assert_eq!(decode_body(b"{\"event\":\"NEW_TASK\"}"), json!({"event": "NEW_TASK"}));
        assert_eq!(
            decode_body(br#""{\"id\": 5}""#),
            json!({"id": 5}),
            "string-wrapped JSON is decoded twice"
        );
        assert_eq!(decode_body(b"not json"), json!({}));
        assert_eq!(decode_body(b""), json!({}));
        assert_eq!(decode_body(b"[1,2,3]"), json!({}));
    }

    #[test]
    fn test_event_kind_round_trip_names() {
        for name in ["NEW_TASK", "UPDATE_TASK", "NEW_TASK_COMMENT", "UPDATE_BRIEFING"] {
            let kind = EventKind::from(name);
            assert!(!matches!(kind, EventKind::Other(_)), "{name} should be known");
            assert_eq!(kind.as_str(), name);
        }
        assert_eq!(EventKind::from("TASK_DELETED").as_str(), "TASK_DELETED");
    }

    proptest! {
        #[test]
        fn decode_body_never_panics_and_yields_object(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            prop_assert!(decode_body(&bytes).is_object());
        }

        #[test]
        fn numeric_ids_are_stringified(id in any::<u32>()) {
            let event = InboundEvent::from_value(&json!({ "data": { "id": id } }));
            prop_assert_eq!(event.task_id, Some(id.to_string()));
        }
    }
}
