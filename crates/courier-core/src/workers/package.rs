//! WorkerPackage - producer / consumer 一式を Container に登録する
//!
//! | component                   | lifetime  |
//! |-----------------------------|-----------|
//! | `HandlerRegistry`           | Singleton (instance) |
//! | `InMemoryChannel`           | Singleton |
//! | `UlidGenerator<SystemClock>`| Singleton |
//! | `ConsumerWorker`            | Scoped    |
//! | `ProducerWorker`            | Scoped    |
//!
//! worker は scope ごとに 1 つ。channel は全 scope で共有するので、
//! ある scope の producer が送った message を別 scope の consumer が受け取れる。

use std::sync::Arc;

use crate::config::CourierConfig;
use crate::container::{ContainerBuilder, ContainerError, Lifetime, Package};
use crate::impls::InMemoryChannel;
use crate::ports::{IdGenerator, SystemClock, UlidGenerator};
use crate::typed::HandlerRegistry;
use crate::workers::{ConsumerWorker, ProducerWorker};

pub struct WorkerPackage {
    registry: Arc<HandlerRegistry>,
    channel_capacity: usize,
}

/// `WorkerPackage` を作る
pub fn package(registry: HandlerRegistry, channel_capacity: usize) -> WorkerPackage {
    WorkerPackage {
        registry: Arc::new(registry),
        channel_capacity,
    }
}

impl WorkerPackage {
    pub fn from_config(registry: HandlerRegistry, config: &CourierConfig) -> Self {
        package(registry, config.channel.capacity)
    }
}

impl Package for WorkerPackage {
    fn name(&self) -> &'static str {
        "workers"
    }

    fn register(&self, builder: ContainerBuilder) -> Result<ContainerBuilder, ContainerError> {
        let capacity = self.channel_capacity;

        builder
            .register_instance(Arc::clone(&self.registry))?
            .register::<InMemoryChannel, _>(Lifetime::Singleton, move |_| {
                Ok(InMemoryChannel::new(capacity))
            })?
            .register::<UlidGenerator<SystemClock>, _>(Lifetime::Singleton, |_| {
                Ok(UlidGenerator::new(SystemClock))
            })?
            .register::<ConsumerWorker, _>(Lifetime::Scoped, |container| {
                let channel = container.resolve::<InMemoryChannel>()?;
                let registry = container.resolve::<HandlerRegistry>()?;
                Ok(ConsumerWorker::new(channel.source(), registry))
            })?
            .register::<ProducerWorker, _>(Lifetime::Scoped, |container| {
                let channel = container.resolve::<InMemoryChannel>()?;
                let ids: Arc<dyn IdGenerator> = container.resolve::<UlidGenerator<SystemClock>>()?;
                Ok(ProducerWorker::new(channel.sink(), ids))
            })
    }
}
