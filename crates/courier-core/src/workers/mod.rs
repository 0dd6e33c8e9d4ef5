//! Workers - producer / consumer と、それを Container に載せる package
//!
//! - **ProducerWorker**: Action を encode して MessageSink に送る
//! - **ConsumerWorker**: MessageSource から受け取り HandlerRegistry で dispatch
//! - **ConsumerGroup**: 1 つの ConsumerWorker を N 本のループで回す
//! - **WorkerPackage**: 上記を遅延・scope 単位で登録する

pub mod consumer;
pub mod group;
pub mod package;
pub mod producer;

pub use self::consumer::ConsumerWorker;
pub use self::group::ConsumerGroup;
pub use self::package::{WorkerPackage, package};
pub use self::producer::ProducerWorker;
