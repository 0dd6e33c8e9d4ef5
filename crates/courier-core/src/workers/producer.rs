//! ProducerWorker - 型付き Action を WorkerMessage にして送る

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use crate::domain::{MessageId, WorkerMessage};
use crate::error::WorkerError;
use crate::ports::{IdGenerator, MessageSink};
use crate::typed::{Action, PayloadCodec};

pub struct ProducerWorker {
    sink: Arc<dyn MessageSink>,
    ids: Arc<dyn IdGenerator>,
    codec: PayloadCodec,
    published: AtomicU64,
}

impl ProducerWorker {
    pub fn new(sink: Arc<dyn MessageSink>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            sink,
            ids,
            codec: PayloadCodec::new(),
            published: AtomicU64::new(0),
        }
    }

    /// Encode `action` under a fresh id and send it. Returns the id.
    ///
    /// Waits while the channel is full.
    pub async fn publish<A: Action>(&self, action: &A) -> Result<MessageId, WorkerError> {
        let id = self.ids.next_message_id();
        let message = self.codec.encode(action, id.clone())?;
        self.send(message).await?;
        Ok(id)
    }

    /// Send an already built message as is.
    pub async fn send(&self, message: WorkerMessage) -> Result<(), WorkerError> {
        let id = message.id().clone();
        let action = message.action().clone();

        match self.sink.send(message).await {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                debug!(message.id = %id, message.action = %action, "message published");
                Ok(())
            }
            Err(err) => {
                warn!(message.id = %id, message.action = %action, error = %err, "publish failed");
                Err(err.into())
            }
        }
    }

    /// Messages accepted by the sink so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
