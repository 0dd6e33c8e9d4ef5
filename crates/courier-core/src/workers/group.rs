use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span};

use crate::error::WorkerError;
use crate::workers::ConsumerWorker;

/// Consumer group handle.
/// - 全ループが同じ ConsumerWorker（同じ source）を共有する
/// - `request_shutdown()` で新しい受信をやめる
/// - `join()` は source が閉じて空になるまで待つ
pub struct ConsumerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<Result<(), WorkerError>>>,
}

impl ConsumerGroup {
    /// Spawn `n` consumer loops over `consumer`.
    pub fn spawn(n: usize, consumer: Arc<ConsumerWorker>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let consumer = Arc::clone(&consumer);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(
                async move { consumer.run(&mut rx).await }
                    .instrument(info_span!("consumer", worker_id)),
            );
            joins.push(join);
        }

        info!(consumers = n, "consumer group started");
        Self { shutdown_tx, joins }
    }

    pub fn len(&self) -> usize {
        self.joins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Request shutdown for all loops.
    /// In-flight handlers are not cancelled; loops just stop receiving.
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Shutdown and wait for all loops.
    pub async fn shutdown_and_join(self) -> Result<(), WorkerError> {
        self.request_shutdown();
        self.join().await
    }

    /// Wait for every loop to finish. Returns the first transport error, if any.
    pub async fn join(self) -> Result<(), WorkerError> {
        let mut first_error = None;
        for (worker_id, join) in self.joins.into_iter().enumerate() {
            match join.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(worker_id, error = %err, "consumer loop failed");
                    first_error.get_or_insert(err);
                }
                Err(err) => {
                    error!(worker_id, error = %err, "consumer task panicked or was cancelled");
                }
            }
        }
        info!("consumer group stopped");
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryChannel;
    use crate::typed::HandlerRegistry;
    use crate::typed::action::fixtures::Ping;
    use crate::typed::handler::fixtures::RecordingPing;
    use crate::domain::{MessageId, WorkerMessage};
    use std::time::Duration;

    fn consumer(channel: &InMemoryChannel) -> Arc<ConsumerWorker> {
        let registry = HandlerRegistry::new()
            .with::<Ping, _>(RecordingPing::default())
            .unwrap();
        Arc::new(ConsumerWorker::new(channel.source(), Arc::new(registry)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn group_drains_channel_after_close() {
        let channel = InMemoryChannel::new(16);
        let consumer = consumer(&channel);
        let group = ConsumerGroup::spawn(3, Arc::clone(&consumer));
        assert_eq!(group.len(), 3);

        let sink = channel.sink();
        for i in 0..10 {
            sink.send(WorkerMessage::new("ping", serde_json::Value::Null, MessageId::new(i.to_string())))
                .await
                .unwrap();
        }
        channel.close();

        tokio::time::timeout(Duration::from_secs(2), group.join())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(consumer.counts().processed, 10);
    }

    #[tokio::test]
    async fn shutdown_stops_idle_loops() {
        let channel = InMemoryChannel::new(4);
        let group = ConsumerGroup::spawn(2, consumer(&channel));

        tokio::time::timeout(Duration::from_secs(1), group.shutdown_and_join())
            .await
            .unwrap()
            .unwrap();
    }
}
