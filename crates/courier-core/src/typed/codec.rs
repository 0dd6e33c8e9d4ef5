//! PayloadCodec - WorkerMessage と Action 型の相互変換
//!
//! decode は payload に触る前に action 名を照合する。

use super::action::Action;
use crate::domain::{ActionName, MessageId, WorkerMessage};

/// CodecError は encode / decode のエラー
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("action mismatch: expected '{expected}', got '{actual}'")]
    ActionMismatch {
        expected: &'static str,
        actual: ActionName,
    },

    #[error("payload for action '{action}' could not be encoded/decoded: {source}")]
    Payload {
        action: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid wire message: {0}")]
    Wire(#[from] serde_json::Error),
}

/// PayloadCodec は typed action と `WorkerMessage` を変換する
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadCodec;

impl PayloadCodec {
    pub fn new() -> Self {
        Self
    }

    pub fn encode<A: Action>(&self, action: &A, id: MessageId) -> Result<WorkerMessage, CodecError> {
        let payload = serde_json::to_value(action).map_err(|source| CodecError::Payload {
            action: A::NAME.to_string(),
            source,
        })?;
        Ok(WorkerMessage::new(A::NAME, payload, id))
    }

    pub fn decode<A: Action>(&self, message: &WorkerMessage) -> Result<A, CodecError> {
        if message.action().as_str() != A::NAME {
            return Err(CodecError::ActionMismatch {
                expected: A::NAME,
                actual: message.action().clone(),
            });
        }
        A::deserialize(message.payload()).map_err(|source| CodecError::Payload {
            action: A::NAME.to_string(),
            source,
        })
    }

    /// JSON bytes へ
    pub fn to_wire(&self, message: &WorkerMessage) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(message)?)
    }

    /// JSON bytes から
    pub fn from_wire(&self, bytes: &[u8]) -> Result<WorkerMessage, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
