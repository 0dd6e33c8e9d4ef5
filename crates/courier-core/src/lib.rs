//! courier-core
//!
//! Core building blocks for the Courier worker runtime.
//!
//! # モジュール構成
//! - **domain**: WorkerMessage, MessageId, HandlerError
//! - **typed**: 型付き Action API（Action trait, Handler trait, HandlerRegistry, PayloadCodec）
//! - **ports**: 抽象化レイヤー（MessageSink / MessageSource, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryChannel）
//! - **container**: 遅延生成の DI コンテナ（Lifetime, ContainerBuilder, Package）
//! - **workers**: ProducerWorker, ConsumerWorker, ConsumerGroup, WorkerPackage
//! - **config** / **observability**: 設定の読み込みと tracing の初期化

pub mod config;
pub mod container;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;
pub mod workers;

pub use config::CourierConfig;
pub use container::{Container, ContainerBuilder, Lifetime, Package};
pub use domain::{ActionName, MessageId, WorkerMessage};
pub use error::WorkerError;
pub use workers::{ConsumerGroup, ConsumerWorker, ProducerWorker, WorkerPackage};
