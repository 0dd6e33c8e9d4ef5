//! ContainerBuilder - コンポーネントの登録とワイヤリング
//!
//! 登録フェーズ（mutable）と解決フェーズ（`Container`, immutable）を分ける。
//! `expect::<T>()` で必要なコンポーネントを宣言しておくと、`build()` 時に
//! 不足をまとめて報告する（起動時に落とす）。

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{ComponentError, Container, ContainerError, Factory, Instance, Lifetime, Package, Registration};

/// ContainerBuilder は factory を登録して Container を作る
///
/// # 使用例
/// ```ignore
/// let container = ContainerBuilder::new()
///     .register::<Settings, _>(Lifetime::Singleton, |_| Ok(Settings::default()))?
///     .install(&workers::package(registry, 64))?
///     .expect::<ConsumerWorker>()
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registrations: HashMap<TypeId, Registration>,
    expected: Vec<(TypeId, &'static str)>,
}

/// BuildError は Container 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These components were expected but not registered.")]
    MissingComponents(Vec<&'static str>),
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            expected: Vec::new(),
        }
    }

    /// factory を登録する。factory は最初の resolve まで呼ばれない。
    ///
    /// factory には resolve 中の Container が渡されるので、依存はそこから引く。
    pub fn register<T, F>(self, lifetime: Lifetime, factory: F) -> Result<Self, ContainerError>
    where
        T: Send + Sync + 'static,
        F: Fn(&Container) -> Result<T, ComponentError> + Send + Sync + 'static,
    {
        let factory: Factory =
            Arc::new(move |container: &Container| factory(container).map(|value| Arc::new(value) as Instance));
        self.insert::<T>(lifetime, factory)
    }

    /// 生成済みのインスタンスを singleton として登録する
    pub fn register_instance<T: Send + Sync + 'static>(
        self,
        instance: Arc<T>,
    ) -> Result<Self, ContainerError> {
        let instance: Instance = instance;
        let factory: Factory = Arc::new(move |_: &Container| Ok(Arc::clone(&instance)));
        self.insert::<T>(Lifetime::Singleton, factory)
    }

    /// package の登録をまとめて取り込む
    pub fn install<P: Package + ?Sized>(self, package: &P) -> Result<Self, ContainerError> {
        debug!(package = package.name(), "installing package");
        package.register(self)
    }

    /// build() 時に登録済みであることを要求する
    pub fn expect<T: 'static>(mut self) -> Self {
        self.expected.push((TypeId::of::<T>(), type_name::<T>()));
        self
    }

    /// Container を構築する
    ///
    /// expect() で宣言されたものが全て登録されていなければ
    /// BuildError::MissingComponents を返す
    pub fn build(self) -> Result<Container, BuildError> {
        let missing: Vec<&'static str> = self
            .expected
            .iter()
            .filter(|(type_id, _)| !self.registrations.contains_key(type_id))
            .map(|(_, name)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingComponents(missing));
        }
        debug!(components = self.registrations.len(), "container built");
        Ok(Container::new(self.registrations))
    }

    fn insert<T: 'static>(mut self, lifetime: Lifetime, factory: Factory) -> Result<Self, ContainerError> {
        let type_id = TypeId::of::<T>();
        let name = type_name::<T>();
        if self.registrations.contains_key(&type_id) {
            return Err(ContainerError::AlreadyRegistered(name));
        }
        self.registrations.insert(
            type_id,
            Registration {
                name,
                lifetime,
                factory,
            },
        );
        Ok(self)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
