//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **InMemoryStore / RedisStore**: KvStore
//! - **ProcessHandler**: 子プロセスとして動く Handler（`LaunchMode` で起動方法を選ぶ）
//! - **FnHandler**: プロセス内のクロージャ Handler（組み込み・テスト用）
//! - **InlineLoader / ArchiveLoader**: HandlerLoader

pub mod archive_loader;
pub mod fn_handler;
pub mod inline_loader;
pub mod inmem_store;
pub mod process_handler;
pub mod redis_store;

pub use self::archive_loader::ArchiveLoader;
pub use self::fn_handler::FnHandler;
pub use self::inline_loader::InlineLoader;
pub use self::inmem_store::InMemoryStore;
pub use self::process_handler::{LaunchMode, ProcessHandler, ProcessLauncher};
pub use self::redis_store::RedisStore;
