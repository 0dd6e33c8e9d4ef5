//! Channel port - producer と consumer をつなぐ配送路
//!
//! 送る側（MessageSink）と受ける側（MessageSource）を分けておく。
//! 開発用には InMemoryChannel（impls）がある。
//!
//! 保証は実装側の範囲のみ: ack も再配送もしない。

use async_trait::async_trait;

use crate::domain::WorkerMessage;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel is closed")]
    Closed,
}

/// MessageSink は message を配送路に載せる
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// 満杯なら空くまで待つ
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError>;
}

/// MessageSource は配送路から message を取り出す
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// 次の message を待つ。閉じられていて残りもなければ `Ok(None)`。
    ///
    /// cancel-safe であること（consumer は shutdown と select する）。
    async fn recv(&self) -> Result<Option<WorkerMessage>, ChannelError>;
}
