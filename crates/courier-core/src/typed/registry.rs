//! HandlerRegistry - action 名から Handler を引く
//!
//! 初期化時に組み立て（mutable）、実行時は読むだけ（immutable）。
//! consumer には `Arc<HandlerRegistry>` で渡すのでロックは不要。

use super::action::Action;
use super::handler::{DynHandler, Handler, TypedHandler};
use std::collections::HashMap;
use std::sync::Arc;

/// HandlerRegistry は型付き Handler を action 名で管理する
///
/// # 使用例
/// ```ignore
/// let mut registry = HandlerRegistry::new();
/// registry.register::<Resize, _>(ResizeHandler)?;
///
/// let handler = registry.get("image.resize");
/// ```
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn DynHandler>>,
}

/// RegistryError は HandlerRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler for action '{0}' is already registered")]
    AlreadyRegistered(String),
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<A: Action, H: Handler<A> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        let name = A::NAME.to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.handlers
            .insert(name, Arc::new(TypedHandler::<A, H>::new(handler)));
        Ok(())
    }

    /// builder 形式の register
    pub fn with<A: Action, H: Handler<A> + 'static>(
        mut self,
        handler: H,
    ) -> Result<Self, RegistryError> {
        self.register::<A, H>(handler)?;
        Ok(self)
    }

    pub fn get(&self, action: &str) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(action).cloned()
    }

    /// 登録済み action 名（ソート済み）
    pub fn actions(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
