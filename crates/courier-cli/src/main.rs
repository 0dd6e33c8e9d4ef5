use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use courier_core::config::CourierConfig;
use courier_core::container::ContainerBuilder;
use courier_core::domain::{HandlerError, MessageId, WorkerMessage};
use courier_core::impls::InMemoryChannel;
use courier_core::observability::init_tracing;
use courier_core::typed::{Action, Handler, HandlerRegistry};
use courier_core::workers::{ConsumerGroup, ConsumerWorker, ProducerWorker, WorkerPackage};

/// Run producer and consumer workers over an in-memory channel.
#[derive(Debug, Parser)]
#[command(name = "courier", version, about)]
struct Args {
    /// TOML config file (COURIER__* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of `process` messages to publish
    #[arg(short = 'n', long, default_value_t = 3)]
    count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PingAction;

impl Action for PingAction {
    const NAME: &'static str = "ping";
}

#[derive(Debug, Serialize, Deserialize)]
struct ProcessAction {
    item: String,
    seq: u32,
}

impl Action for ProcessAction {
    const NAME: &'static str = "process";
}

struct PingHandler;

#[async_trait]
impl Handler<PingAction> for PingHandler {
    async fn handle(&self, _action: PingAction, id: &MessageId) -> Result<(), HandlerError> {
        info!(%id, "pong");
        Ok(())
    }
}

/// 最初の `remaining_failures` 件だけわざと失敗する
struct ProcessHandler {
    remaining_failures: AtomicU32,
}

impl ProcessHandler {
    fn new(n: u32) -> Self {
        Self {
            remaining_failures: AtomicU32::new(n),
        }
    }
}

#[async_trait]
impl Handler<ProcessAction> for ProcessHandler {
    async fn handle(&self, action: ProcessAction, id: &MessageId) -> Result<(), HandlerError> {
        // 0 で止まる減算（並行する consumer で 0 を下回らない）
        if let Ok(before) = self.remaining_failures.fetch_update(
            Ordering::Relaxed,
            Ordering::Relaxed,
            |n| n.checked_sub(1),
        ) {
            return Err(HandlerError::failed(format!(
                "intentional failure (left={})",
                before - 1
            )));
        }

        info!(%id, item = %action.item, seq = action.seq, "processed");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // (A) 設定とログ
    let config = CourierConfig::load(args.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging);

    // (B) handler を登録して container を組む
    let registry = HandlerRegistry::new()
        .with::<PingAction, _>(PingHandler)?
        .with::<ProcessAction, _>(ProcessHandler::new(1))?;

    let container = ContainerBuilder::new()
        .install(&WorkerPackage::from_config(registry, &config))?
        .expect::<ConsumerWorker>()
        .expect::<ProducerWorker>()
        .build()?;
    info!(components = ?container.component_names(), "container ready");

    // (C) consumer を起動
    let consumer = container.resolve::<ConsumerWorker>()?;
    let group = ConsumerGroup::spawn(config.consumer.concurrency, Arc::clone(&consumer));

    // Ctrl-C でも channel を閉じて残りを処理させる
    let channel = container.resolve::<InMemoryChannel>()?;
    tokio::spawn({
        let channel = Arc::clone(&channel);
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, closing channel");
                channel.close();
            }
        }
    });

    // (D) publish
    let producer = container.resolve::<ProducerWorker>()?;
    producer.publish(&PingAction).await?;
    for seq in 0..args.count {
        producer
            .publish(&ProcessAction {
                item: format!("item-{seq}"),
                seq,
            })
            .await?;
    }
    producer
        .send(WorkerMessage::new(
            "unknown",
            serde_json::json!({ "note": "no handler for this" }),
            MessageId::new("manual-1"),
        ))
        .await?;

    // (E) close して drain を待つ
    channel.close();
    group.join().await?;

    let counts = consumer.counts();
    info!(
        published = producer.published(),
        received = counts.received,
        processed = counts.processed,
        failed = counts.failed,
        rejected = counts.rejected,
        "done"
    );
    println!("{}", serde_json::to_string_pretty(&counts)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(seq: u32) -> ProcessAction {
        ProcessAction {
            item: format!("item-{seq}"),
            seq,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn process_handler_fails_exactly_n_times_under_concurrency() {
        let handler = Arc::new(ProcessHandler::new(1));

        let mut joins = Vec::new();
        for seq in 0..16 {
            let handler = Arc::clone(&handler);
            joins.push(tokio::spawn(async move {
                handler.handle(action(seq), &MessageId::new(seq.to_string())).await
            }));
        }

        let mut failures = 0;
        for join in joins {
            if join.await.unwrap().is_err() {
                failures += 1;
            }
        }

        assert_eq!(failures, 1);
        assert_eq!(handler.remaining_failures.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn process_handler_succeeds_once_failures_are_used_up() {
        let handler = ProcessHandler::new(2);
        let id = MessageId::new("1");

        assert!(handler.handle(action(0), &id).await.is_err());
        assert!(handler.handle(action(1), &id).await.is_err());
        assert!(handler.handle(action(2), &id).await.is_ok());
        assert!(handler.handle(action(3), &id).await.is_ok());
    }
}
