//! Action trait - action 名と payload 型の対応付け

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Action は `WorkerMessage::action` の値と payload の型を対応付ける
///
/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct Resize {
///     width: u32,
///     height: u32,
/// }
///
/// impl Action for Resize {
///     const NAME: &'static str = "image.resize";
/// }
/// ```
///
/// # Trait Bounds
/// - `Serialize` / `DeserializeOwned`: payload (JSON) との相互変換
/// - `Send + Sync + 'static`: handler を `Arc<dyn DynHandler>` に入れるため
pub trait Action: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// wire 上の `action` に入る名前
    const NAME: &'static str;
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use serde::{Deserialize, Serialize};

    use super::Action;

    /// payload を持たない action（payload は `null`）
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Ping;

    impl Action for Ping {
        const NAME: &'static str = "ping";
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Process(pub HashMap<String, String>);

    impl Process {
        pub fn single(k: &str, v: &str) -> Self {
            Self(HashMap::from([(k.to_string(), v.to_string())]))
        }
    }

    impl Action for Process {
        const NAME: &'static str = "process";
    }
}
