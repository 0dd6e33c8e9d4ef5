//! IdGenerator port - MessageId 生成の抽象化
//!
//! # 実装
//! - **UlidGenerator**: ULID ベース（Clock で timestamp 部分を決める）

use crate::domain::MessageId;
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は producer が使う message id を生成
///
/// 複数の consumer/producer タスクから共有されるので `Send + Sync`。
pub trait IdGenerator: Send + Sync {
    fn next_message_id(&self) -> MessageId;
}

/// UlidGenerator は `msg-<ULID>` 形式の ID を生成する
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn next_message_id(&self) -> MessageId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        MessageId::from_ulid(Ulid::from_parts(timestamp_ms, rand::random()))
    }
}
