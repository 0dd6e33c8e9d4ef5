//! Handler trait - Action を処理する Handler の定義
//!
//! - `Handler<A>`: 型付き。`A` しか受け取れない
//! - `DynHandler`: object-safe。registry に `Arc<dyn DynHandler>` で入る
//! - `TypedHandler<A, H>`: 前者を後者に変換する type erasure

use super::action::Action;
use super::codec::PayloadCodec;
use crate::domain::{HandlerError, MessageId, WorkerMessage};
use async_trait::async_trait;
use std::marker::PhantomData;

/// Handler は decode 済みの Action を処理する
///
/// # 使用例
/// ```ignore
/// struct ResizeHandler;
///
/// #[async_trait]
/// impl Handler<Resize> for ResizeHandler {
///     async fn handle(&self, action: Resize, id: &MessageId) -> Result<(), HandlerError> {
///         tracing::info!(%id, width = action.width, "resizing");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Handler<A: Action>: Send + Sync {
    async fn handle(&self, action: A, id: &MessageId) -> Result<(), HandlerError>;
}

/// DynHandler は object-safe な Handler の抽象化
#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, message: &WorkerMessage) -> Result<(), HandlerError>;
    fn action(&self) -> &'static str;
}

pub struct TypedHandler<A: Action, H: Handler<A>> {
    handler: H,
    codec: PayloadCodec,
    _marker: PhantomData<fn() -> A>,
}

impl<A: Action, H: Handler<A>> TypedHandler<A, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            codec: PayloadCodec::new(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<A: Action, H: Handler<A>> DynHandler for TypedHandler<A, H> {
    async fn handle_dyn(&self, message: &WorkerMessage) -> Result<(), HandlerError> {
        let action: A = self.codec.decode(message)?;
        self.handler.handle(action, message.id()).await
    }

    fn action(&self) -> &'static str {
        A::NAME
    }
}
