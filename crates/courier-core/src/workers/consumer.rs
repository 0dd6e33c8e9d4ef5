//! ConsumerWorker - message を受け取って handler に渡す
//!
//! # フロー
//! 1. MessageSource::recv() で 1 件取得
//! 2. action から handler を引く（なければ reject）
//! 3. handler 実行
//! 4. 結果をログとカウンタに残す（retry はしない）

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::domain::WorkerMessage;
use crate::error::WorkerError;
use crate::observability::{ConsumerCounts, ConsumerStats};
use crate::ports::MessageSource;
use crate::typed::HandlerRegistry;

pub struct ConsumerWorker {
    source: Arc<dyn MessageSource>,
    registry: Arc<HandlerRegistry>,
    stats: ConsumerStats,
}

impl ConsumerWorker {
    pub fn new(source: Arc<dyn MessageSource>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            source,
            registry,
            stats: ConsumerStats::default(),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn counts(&self) -> ConsumerCounts {
        self.stats.snapshot()
    }

    /// Handle one message.
    ///
    /// Unknown actions are rejected with `WorkerError::UnknownAction`; handler
    /// failures come back as `WorkerError::Handler`. Both are logged and
    /// counted here.
    pub async fn process(&self, message: WorkerMessage) -> Result<(), WorkerError> {
        let span = info_span!(
            "consume",
            message.id = %message.id(),
            message.action = %message.action(),
        );
        self.dispatch(message).instrument(span).await
    }

    async fn dispatch(&self, message: WorkerMessage) -> Result<(), WorkerError> {
        self.stats.record_received();

        let Some(handler) = self.registry.get(message.action().as_str()) else {
            self.stats.record_rejected();
            warn!("rejecting message: no handler for action");
            return Err(WorkerError::UnknownAction(message.action().clone()));
        };

        match handler.handle_dyn(&message).await {
            Ok(()) => {
                self.stats.record_processed();
                debug!("message processed");
                Ok(())
            }
            Err(source) => {
                self.stats.record_failed();
                error!(error = %source, "handler failed");
                Err(WorkerError::Handler {
                    action: message.action().clone(),
                    source,
                })
            }
        }
    }

    /// Receive and process until shutdown is signalled or the source is
    /// closed and drained.
    ///
    /// Per-message errors do not stop the loop; only transport errors do.
    pub async fn run(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), WorkerError> {
        loop {
            if *shutdown.borrow() {
                debug!("shutdown requested, consumer stopping");
                return Ok(());
            }

            // recv は待つ可能性があるので shutdown と競合させる
            let next = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender drop も停止扱い
                        return Ok(());
                    }
                    continue;
                }
                next = self.source.recv() => next?,
            };

            let Some(message) = next else {
                debug!("source closed, consumer stopping");
                return Ok(());
            };

            // 失敗は process 内でログ・カウント済み
            let _ = self.process(message).await;
        }
    }
}
