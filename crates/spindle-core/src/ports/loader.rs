//! HandlerLoader port - HandlerSpec から Handler を作る
//!
//! # 実装
//! - `InlineLoader`: 設定で渡されたプログラム本文
//! - `ArchiveLoader`: zip アーカイブ内のエントリファイル

use async_trait::async_trait;

use super::handler::Handler;
use crate::domain::{HandlerSpec, LoadError};

/// Produces a callable handler from one delivery form.
///
/// Fails fast: a loader never returns a partially initialised handler.
#[async_trait]
pub trait HandlerLoader: Send + Sync {
    async fn resolve(&self, spec: &HandlerSpec) -> Result<Box<dyn Handler>, LoadError>;
}
