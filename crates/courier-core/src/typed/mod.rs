//! Typed - 型付き Action API
//!
//! wire 上の payload は JSON のまま運ぶが、アプリケーションコードは
//! `action` で選ばれた型付き struct だけを扱う。
//!
//! # 二層構造
//! - **表層（Typed）**: `Action` trait, `Handler<A>` trait
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, type erasure

pub mod action;
pub mod codec;
pub mod handler;
pub mod registry;

pub use self::action::Action;
pub use self::codec::{CodecError, PayloadCodec};
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::registry::{HandlerRegistry, RegistryError};
