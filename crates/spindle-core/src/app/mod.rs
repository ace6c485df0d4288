//! App - アプリケーション層
//!
//! ports を組み合わせてランタイムを組み立てる。
//!
//! # 主要コンポーネント
//! - **RuntimeConfig**: 環境変数からの設定
//! - **resolver**: ハンドラの供給元の決定とロード
//! - **Poller**: 入力セルの変化検出
//! - **FunctionRuntime**: poll → invoke → publish のループ
//! - **RetryPolicy / RetryingStore**: ストア操作の再試行

pub mod config;
pub mod poller;
pub mod resolver;
pub mod retry;
pub mod runtime;

pub use self::config::RuntimeConfig;
pub use self::poller::{PollOutcome, Poller};
pub use self::resolver::{load_handler, resolve_source};
pub use self::retry::{RetryPolicy, RetryingStore};
pub use self::runtime::{FunctionRuntime, LoopSettings, RunSummary, TickOutcome};
