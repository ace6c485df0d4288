//! KvStore port - 外部の key-value ストア（Redis または InMemory）
//!
//! ランタイムはセルを「文字列を 1 つ持つ原子的な箱」として扱う。
//! 読むときは全体を読み、書くときは全体を上書きする。トランザクションは仮定しない。

use async_trait::async_trait;

/// StoreError は KvStore の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),

    #[error("store {op} on key={key} failed: {message}")]
    Operation {
        op: &'static str,
        key: String,
        message: String,
    },
}

/// KvStore は string-valued なセルの読み書きを提供
///
/// # 実装
/// - `RedisStore`: 本番用（GET / SET）
/// - `InMemoryStore`: テスト・ローカル実行用
/// - `RetryingStore`: 任意の実装を包んで backoff 付きで再試行
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read the raw value of `key`. `None` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite `key` with `value`.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}
