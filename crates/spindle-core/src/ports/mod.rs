//! Ports - 抽象化レイヤー
//!
//! 外部システム（key-value ストア、ハンドラプログラム）への
//! インターフェースを trait として定義し、実装の詳細を隠蔽します。

pub mod handler;
pub mod loader;
pub mod store;

pub use self::handler::Handler;
pub use self::loader::HandlerLoader;
pub use self::store::{KvStore, StoreError};
