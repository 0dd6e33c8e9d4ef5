use serde::{Deserialize, Serialize};
use std::fmt;

use super::MessageId;

/// Name of the operation a message requests or reports (`action` on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionName(String);

impl ActionName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ActionName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Action + Payload + ID の“運搬用”データ。
///
/// payload の解釈は action 次第。ここでは検証しない（空文字も通す）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerMessage {
    action: ActionName,
    payload: serde_json::Value,
    id: MessageId,
}

impl WorkerMessage {
    pub fn new(action: impl Into<ActionName>, payload: serde_json::Value, id: MessageId) -> Self {
        Self {
            action: action.into(),
            payload,
            id,
        }
    }

    pub fn action(&self) -> &ActionName {
        &self.action
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn into_parts(self) -> (ActionName, serde_json::Value, MessageId) {
        (self.action, self.payload, self.id)
    }
}
