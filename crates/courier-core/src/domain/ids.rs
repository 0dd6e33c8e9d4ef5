//! Message identifiers.
//!
//! 外部とやり取りする ID はただの文字列（`"abc-123"` でも `"1"` でもよい）。
//! こちらで生成する ID は `msg-<ULID>` 形式にして、生成順にソートできるようにする。

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Prefix used for ids produced by an `IdGenerator`.
pub const MESSAGE_ID_PREFIX: &str = "msg-";

/// Identifier of a single `WorkerMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// ULID から `msg-<ULID>` を作る
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(format!("{MESSAGE_ID_PREFIX}{ulid}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `msg-<ULID>` 形式なら ULID 部分を返す
    pub fn ulid(&self) -> Option<Ulid> {
        self.0
            .strip_prefix(MESSAGE_ID_PREFIX)
            .and_then(|s| Ulid::from_string(s).ok())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Ulid> for MessageId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}
