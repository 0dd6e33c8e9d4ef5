//! Errors - handler が返すエラー
//!
//! retry はしないので分類（transient / permanent）は持たない。
//! consumer はログに残してカウントするだけ。

use crate::typed::CodecError;

/// HandlerError は handler 実行時のエラー
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// payload が Action 型に合わなかった
    #[error("payload decode failed: {0}")]
    Decode(#[from] CodecError),

    /// handler 自身が失敗を報告した
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
