//! Impls - ports の開発用実装
//!
//! # 含まれる実装
//! - **InMemoryChannel**: プロセス内の bounded 配送路

pub mod inmem_channel;

pub use self::inmem_channel::InMemoryChannel;
