//! Ports - 抽象化レイヤー
//!
//! workers はここの trait だけに依存する。
//! 実装は impls（開発用）かアプリケーション側が用意する。

pub mod channel;
pub mod clock;
pub mod id_generator;

pub use self::channel::{ChannelError, MessageSink, MessageSource};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
