//! InMemoryChannel - 開発用の配送路
//!
//! tokio の bounded mpsc をそのまま使う。
//! - 容量いっぱいなら send は待つ（backpressure はこれだけ）
//! - 受信側は tokio Mutex で包み、複数の consumer ループで共有する
//! - `close()` 後も残っている message は受信できる
//!
//! close は watch で知らせる。受信待ちの consumer が Mutex を握ったままでも
//! close 側はロックを取らずに済む。

use crate::domain::WorkerMessage;
use crate::ports::{ChannelError, MessageSink, MessageSource};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, watch};

/// InMemoryChannel は 1 本の bounded キュー
///
/// # 使用例
/// ```ignore
/// let channel = InMemoryChannel::new(16);
/// channel.sink().send(message).await?;
/// let next = channel.source().recv().await?;
/// ```
pub struct InMemoryChannel {
    sender: mpsc::Sender<WorkerMessage>,
    receiver: Arc<Mutex<mpsc::Receiver<WorkerMessage>>>,
    closed_tx: watch::Sender<bool>,
    capacity: usize,
}

impl InMemoryChannel {
    /// capacity 0 は 1 に丸める（mpsc::channel は 0 を受け付けない）
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        let (closed_tx, _) = watch::channel(false);
        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            closed_tx,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sink(&self) -> Arc<dyn MessageSink> {
        Arc::new(InMemorySink {
            sender: self.sender.clone(),
            closed: self.closed_tx.subscribe(),
        })
    }

    pub fn source(&self) -> Arc<dyn MessageSource> {
        Arc::new(InMemorySource {
            receiver: Arc::clone(&self.receiver),
            closed: self.closed_tx.subscribe(),
        })
    }

    /// 以降の send を拒否する。キューに残っている分は recv で取り出せる。
    pub fn close(&self) {
        self.closed_tx.send_replace(true);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }
}

struct InMemorySink {
    sender: mpsc::Sender<WorkerMessage>,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl MessageSink for InMemorySink {
    async fn send(&self, message: WorkerMessage) -> Result<(), ChannelError> {
        let mut closed = self.closed.clone();
        if *closed.borrow_and_update() {
            return Err(ChannelError::Closed);
        }
        // 満杯で待っている間に close されたら、その message は捨てて Closed
        tokio::select! {
            result = self.sender.send(message) => result.map_err(|_| ChannelError::Closed),
            _ = closed.changed() => Err(ChannelError::Closed),
        }
    }
}

struct InMemorySource {
    receiver: Arc<Mutex<mpsc::Receiver<WorkerMessage>>>,
    closed: watch::Receiver<bool>,
}

#[async_trait]
impl MessageSource for InMemorySource {
    async fn recv(&self) -> Result<Option<WorkerMessage>, ChannelError> {
        let mut receiver = self.receiver.lock().await;
        let mut closed = self.closed.clone();
        if !*closed.borrow_and_update() {
            tokio::select! {
                message = receiver.recv() => return Ok(message),
                // false に戻ることはないので、変化 = close（sender drop も同様）
                _ = closed.changed() => {}
            }
        }
        // closed: 送信待ちも含めて締め切り、残りを吐き出す
        receiver.close();
        Ok(receiver.recv().await)
    }
}
