//! Package - 関連するコンポーネントの登録をひとまとめにする

use super::{ContainerBuilder, ContainerError};

/// Package は builder に自分のコンポーネントを登録する
///
/// 登録するだけで生成はしない（生成は最初の resolve 時）。
pub trait Package {
    /// ログ用の名前
    fn name(&self) -> &'static str;

    fn register(&self, builder: ContainerBuilder) -> Result<ContainerBuilder, ContainerError>;
}
