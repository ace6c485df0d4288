//! Poller - 入力セルの変化検出
//!
//! # 状態
//! - Idle: 次の tick を待つ（待機はランタイムのループ側が持つ）
//! - Checking: 入力キーを 1 回読む
//!
//! 生の値（文字列）を先に比較し、変化した時だけデコードする。
//! 変化がなければデコードのコストは一切かからない。

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::domain::{ChangeState, DecodeError, codec};
use crate::ports::{KvStore, StoreError};

/// Result of one check of the input key.
#[derive(Debug)]
pub enum PollOutcome {
    /// The key does not exist.
    Absent,
    /// Same raw value as last time.
    Unchanged,
    /// A new value, decoded.
    Changed(Value),
    /// A new value that is not valid JSON. The change is still recorded.
    Malformed(DecodeError),
}

pub struct Poller {
    store: Arc<dyn KvStore>,
    input_key: String,
    state: ChangeState,
}

impl Poller {
    pub fn new(store: Arc<dyn KvStore>, input_key: impl Into<String>) -> Self {
        Self {
            store,
            input_key: input_key.into(),
            state: ChangeState::new(),
        }
    }

    pub fn input_key(&self) -> &str {
        &self.input_key
    }

    /// One Idle → Checking → Idle transition.
    pub async fn check(&mut self) -> Result<PollOutcome, StoreError> {
        let raw = self.store.get(&self.input_key).await?;
        if raw.is_none() {
            debug!(key = %self.input_key, "input key absent");
            return Ok(PollOutcome::Absent);
        }

        let Some(changed) = self.state.observe(raw) else {
            return Ok(PollOutcome::Unchanged);
        };

        debug!(key = %self.input_key, bytes = changed.len(), "input changed");
        Ok(match codec::decode(changed) {
            Ok(event) => PollOutcome::Changed(event),
            Err(err) => PollOutcome::Malformed(err),
        })
    }
}
