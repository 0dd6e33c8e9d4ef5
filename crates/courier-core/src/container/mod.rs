//! Container - 遅延生成されるコンポーネントのレジストリ
//!
//! 型（`TypeId`）ごとに factory を 1 つ登録し、最初の `resolve` で生成して
//! キャッシュする。
//!
//! # ライフタイム
//! - `Singleton`: コンテナツリー全体（root と全 scope）で 1 つ
//! - `Scoped`: scope ごとに 1 つ
//!
//! # 並行性
//! キャッシュのスロット（`OnceCell`）は build 時に全部作っておくので、
//! resolve 中に map を書き換えることはない。初回の同時 resolve では factory は
//! 一度だけ走り、他の呼び出し側は完成を待って同じ `Arc` を受け取る。
//!
//! 循環依存と「singleton が scoped を掴む」ケースは、resolve 中のスレッドごとの
//! スタックで検出する（factory は同期なので同じスレッドで完結する）。

pub mod builder;
pub mod package;

pub use self::builder::{BuildError, ContainerBuilder};
pub use self::package::Package;

use once_cell::sync::OnceCell;
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// factory が返せるエラー
pub type ComponentError = Box<dyn std::error::Error + Send + Sync + 'static>;

type Instance = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&Container) -> Result<Instance, ComponentError> + Send + Sync>;
type Slots = HashMap<TypeId, OnceCell<Instance>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    Singleton,
    Scoped,
}

struct Registration {
    name: &'static str,
    lifetime: Lifetime,
    factory: Factory,
}

#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error("component '{0}' is not registered")]
    NotRegistered(&'static str),

    #[error("component '{0}' is already registered")]
    AlreadyRegistered(&'static str),

    #[error("failed to construct component '{component}': {source}")]
    Construction {
        component: &'static str,
        #[source]
        source: ComponentError,
    },

    #[error("circular dependency: {}", .0.join(" -> "))]
    CircularDependency(Vec<&'static str>),

    #[error("singleton '{singleton}' cannot depend on scoped component '{scoped}'")]
    ScopeViolation {
        singleton: &'static str,
        scoped: &'static str,
    },

    #[error("component '{0}' produced an instance of an unexpected type")]
    TypeMismatch(&'static str),
}

/// Container は登録済み factory からコンポーネントを解決する
///
/// `ContainerBuilder::build()` で作る。共有するときは `Arc<Container>`。
pub struct Container {
    registrations: Arc<HashMap<TypeId, Registration>>,
    singletons: Arc<Slots>,
    scoped: Slots,
}

impl Container {
    fn new(registrations: HashMap<TypeId, Registration>) -> Self {
        let singletons = slots_for(&registrations, Lifetime::Singleton);
        let scoped = slots_for(&registrations, Lifetime::Scoped);
        Self {
            registrations: Arc::new(registrations),
            singletons: Arc::new(singletons),
            scoped,
        }
    }

    /// 子 scope を作る（登録と singleton は共有、scoped キャッシュは空）
    pub fn scope(&self) -> Container {
        Container {
            registrations: Arc::clone(&self.registrations),
            singletons: Arc::clone(&self.singletons),
            scoped: slots_for(&self.registrations, Lifetime::Scoped),
        }
    }

    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let type_id = TypeId::of::<T>();
        let registration = self
            .registrations
            .get(&type_id)
            .ok_or(ContainerError::NotRegistered(std::any::type_name::<T>()))?;
        let slot = self
            .slot(type_id, registration.lifetime)
            .ok_or(ContainerError::NotRegistered(registration.name))?;

        check_scope(registration)?;

        let instance = match slot.get() {
            Some(instance) => Arc::clone(instance),
            None => {
                let _frame = ResolutionFrame::enter(type_id, registration)?;
                let instance = slot.get_or_try_init(|| {
                    debug!(
                        component = registration.name,
                        lifetime = ?registration.lifetime,
                        "constructing component"
                    );
                    (registration.factory)(self).map_err(|source| ContainerError::Construction {
                        component: registration.name,
                        source,
                    })
                })?;
                Arc::clone(instance)
            }
        };

        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch(registration.name))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// この scope から見てすでに生成済みか
    pub fn is_resolved<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.registrations
            .get(&type_id)
            .and_then(|registration| self.slot(type_id, registration.lifetime))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// 登録済みコンポーネント名（ソート済み）
    pub fn component_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> =
            self.registrations.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    fn slot(&self, type_id: TypeId, lifetime: Lifetime) -> Option<&OnceCell<Instance>> {
        match lifetime {
            Lifetime::Singleton => self.singletons.get(&type_id),
            Lifetime::Scoped => self.scoped.get(&type_id),
        }
    }
}

fn slots_for(registrations: &HashMap<TypeId, Registration>, lifetime: Lifetime) -> Slots {
    registrations
        .iter()
        .filter(|(_, registration)| registration.lifetime == lifetime)
        .map(|(type_id, _)| (*type_id, OnceCell::new()))
        .collect()
}

thread_local! {
    static RESOLVING: RefCell<Vec<(TypeId, &'static str, Lifetime)>> = const { RefCell::new(Vec::new()) };
}

fn check_scope(registration: &Registration) -> Result<(), ContainerError> {
    if registration.lifetime != Lifetime::Scoped {
        return Ok(());
    }
    RESOLVING.with(|stack| {
        let stack = stack.borrow();
        match stack
            .iter()
            .rev()
            .find(|(_, _, lifetime)| *lifetime == Lifetime::Singleton)
        {
            Some((_, singleton, _)) => Err(ContainerError::ScopeViolation {
                singleton: *singleton,
                scoped: registration.name,
            }),
            None => Ok(()),
        }
    })
}

/// 生成中のコンポーネントをスタックに積み、drop で降ろす
struct ResolutionFrame;

impl ResolutionFrame {
    fn enter(type_id: TypeId, registration: &Registration) -> Result<Self, ContainerError> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(id, _, _)| *id == type_id) {
                let mut path: Vec<&'static str> = stack
                    .iter()
                    .skip_while(|(id, _, _)| *id != type_id)
                    .map(|(_, name, _)| *name)
                    .collect();
                path.push(registration.name);
                return Err(ContainerError::CircularDependency(path));
            }
            stack.push((type_id, registration.name, registration.lifetime));
            Ok(ResolutionFrame)
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    struct Config {
        name: String,
    }

    struct Service {
        config: Arc<Config>,
    }

    struct Session;

    fn counting_builder(counter: Arc<AtomicUsize>) -> ContainerBuilder {
        ContainerBuilder::new()
            .register::<Config, _>(Lifetime::Singleton, |_| {
                Ok(Config {
                    name: "courier".to_string(),
                })
            })
            .unwrap()
            .register::<Session, _>(Lifetime::Scoped, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Session)
            })
            .unwrap()
    }

    #[test]
    fn factories_run_on_first_resolve_only() {
        let counter = Arc::new(AtomicUsize::new(0));
        let container = counting_builder(Arc::clone(&counter)).build().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(!container.is_resolved::<Session>());

        container.resolve::<Session>().unwrap();
        container.resolve::<Session>().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(container.is_resolved::<Session>());
    }

    #[test]
    fn scoped_instances_are_per_scope() {
        let container = counting_builder(Arc::new(AtomicUsize::new(0)))
            .build()
            .unwrap();
        let scope = container.scope();

        let a1 = container.resolve::<Session>().unwrap();
        let a2 = container.resolve::<Session>().unwrap();
        let b = scope.resolve::<Session>().unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }

    #[test]
    fn singletons_are_shared_across_scopes() {
        let container = counting_builder(Arc::new(AtomicUsize::new(0)))
            .build()
            .unwrap();
        let scope = container.scope();

        let root = container.resolve::<Config>().unwrap();
        let child = scope.resolve::<Config>().unwrap();

        assert!(Arc::ptr_eq(&root, &child));
        assert_eq!(child.name, "courier");
    }

    #[test]
    fn factories_resolve_dependencies() {
        let container = counting_builder(Arc::new(AtomicUsize::new(0)))
            .register::<Service, _>(Lifetime::Scoped, |c| {
                Ok(Service {
                    config: c.resolve::<Config>()?,
                })
            })
            .unwrap()
            .build()
            .unwrap();

        let service = container.resolve::<Service>().unwrap();
        assert!(Arc::ptr_eq(&service.config, &container.resolve::<Config>().unwrap()));
    }

    #[test]
    fn concurrent_first_resolve_constructs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory_counter = Arc::clone(&counter);
        let container = ContainerBuilder::new()
            .register::<Session, _>(Lifetime::Scoped, move |_| {
                std::thread::sleep(Duration::from_millis(20));
                factory_counter.fetch_add(1, Ordering::SeqCst);
                Ok(Session)
            })
            .unwrap()
            .build()
            .unwrap();

        let barrier = Barrier::new(8);
        let resolved: Vec<Arc<Session>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        container.resolve::<Session>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|s| Arc::ptr_eq(s, &resolved[0])));
    }

    #[test]
    fn concurrent_singleton_resolve_across_scopes_constructs_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory_counter = Arc::clone(&counter);
        let container = ContainerBuilder::new()
            .register::<Config, _>(Lifetime::Singleton, move |_| {
                std::thread::sleep(Duration::from_millis(20));
                factory_counter.fetch_add(1, Ordering::SeqCst);
                Ok(Config {
                    name: "shared".to_string(),
                })
            })
            .unwrap()
            .build()
            .unwrap();

        let scopes: Vec<Container> = (0..8).map(|_| container.scope()).collect();
        let barrier = Barrier::new(scopes.len());
        let resolved: Vec<Arc<Config>> = std::thread::scope(|s| {
            let handles: Vec<_> = scopes
                .iter()
                .map(|scope| {
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        scope.resolve::<Config>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(resolved.iter().all(|c| Arc::ptr_eq(c, &resolved[0])));
        assert_eq!(resolved[0].name, "shared");
        assert!(container.is_resolved::<Config>());
        assert!(Arc::ptr_eq(&container.resolve::<Config>().unwrap(), &resolved[0]));
    }

    #[test]
    fn failed_construction_is_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let factory_attempts = Arc::clone(&attempts);
        let container = ContainerBuilder::new()
            .register::<Session, _>(Lifetime::Scoped, move |_| {
                if factory_attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    return Err("not ready yet".into());
                }
                Ok(Session)
            })
            .unwrap()
            .build()
            .unwrap();

        let err = container.resolve::<Session>().err().unwrap();
        assert!(matches!(err, ContainerError::Construction { .. }));
        assert!(err.to_string().contains("not ready yet"));
        assert!(!container.is_resolved::<Session>());

        container.resolve::<Session>().unwrap();
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unregistered_component_is_reported() {
        let container = ContainerBuilder::new().build().unwrap();
        let err = container.resolve::<Session>().err().unwrap();
        assert!(matches!(err, ContainerError::NotRegistered(name) if name.ends_with("Session")));
        assert!(!container.contains::<Session>());
    }

    struct Left;
    struct Right;

    #[test]
    fn circular_dependency_is_reported() {
        let container = ContainerBuilder::new()
            .register::<Left, _>(Lifetime::Scoped, |c| {
                c.resolve::<Right>()?;
                Ok(Left)
            })
            .unwrap()
            .register::<Right, _>(Lifetime::Scoped, |c| {
                c.resolve::<Left>()?;
                Ok(Right)
            })
            .unwrap()
            .build()
            .unwrap();

        let err = container.resolve::<Left>().err().unwrap();
        assert!(err.to_string().contains("circular dependency"));
        // スタックは片付いている
        RESOLVING.with(|stack| assert!(stack.borrow().is_empty()));
    }

    #[test]
    fn singleton_cannot_capture_scoped() {
        let container = counting_builder(Arc::new(AtomicUsize::new(0)))
            .register::<Service, _>(Lifetime::Singleton, |c| {
                c.resolve::<Session>()?;
                Ok(Service {
                    config: c.resolve::<Config>()?,
                })
            })
            .unwrap()
            .build()
            .unwrap();

        let err = container.resolve::<Service>().err().unwrap();
        assert!(err.to_string().contains("cannot depend on scoped component"));
    }

    #[test]
    fn component_names_are_sorted() {
        let container = counting_builder(Arc::new(AtomicUsize::new(0)))
            .build()
            .unwrap();
        let names = container.component_names();

        assert_eq!(names.len(), 2);
        assert!(names.windows(2).all(|w| w[0] <= w[1]));
    }
}
