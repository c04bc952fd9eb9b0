use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::error::ErrorShape;

/// Inbound request frame.
///
/// `id` is optional: a request without one is fire-and-forget and
/// receives no acknowledgement (`host:join` is sent this way).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    #[serde(rename = "type", default = "req_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

fn req_kind() -> String {
    "req".into()
}

/// Acknowledgement for a request that carried an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorShape>,
}

impl ResponseFrame {
    pub fn ok(id: &str, payload: Value) -> Self {
        Self {
            kind: "res".into(),
            id: id.to_string(),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn err(id: &str, error: ErrorShape) -> Self {
        Self {
            kind: "res".into(),
            id: id.to_string(),
            ok: false,
            payload: None,
            error: Some(error),
        }
    }
}

/// Server-initiated push scoped to a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub event: String,
    pub seq: u64,
    pub payload: Value,
}

impl EventFrame {
    pub fn new(event: impl Into<String>, payload: Value, seq: u64) -> Self {
        Self {
            kind: "event".into(),
            event: event.into(),
            seq,
            payload,
        }
    }
}
