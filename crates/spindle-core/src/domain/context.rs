//! ExecutionContext - 呼び出しをまたいで状態を持ち越すための環境
//!
//! # 設計
//! - プロセスごとに 1 つだけ作られ、起動時は空
//! - ランタイムが所有し、各呼び出しに `&mut` で貸し出す
//! - 変更は `merge` のみ（削除・丸ごと置き換えはできない）
//! - 呼び出しは逐次なのでロックは不要

use serde::Serialize;
use serde_json::{Map, Value};

/// A free-form bag of values that survives across invocations.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    env: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `updates` into the context. Existing keys with the same name are
    /// overwritten; every other key is kept.
    pub fn merge<I>(&mut self, updates: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.env.extend(updates);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.env.get(key)
    }

    pub fn len(&self) -> usize {
        self.env.len()
    }

    pub fn is_empty(&self) -> bool {
        self.env.is_empty()
    }
}
