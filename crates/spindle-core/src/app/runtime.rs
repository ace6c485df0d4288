//! FunctionRuntime - poll → invoke → publish のループ
//!
//! # 並行性モデル
//! - 1 本の論理ループで poll と invoke を交互に行う（並列実行なし）
//! - 待機点は poll 間の sleep だけ
//! - シャットダウン信号はループ先頭と sleep 中に確認する
//!
//! # エラー方針
//! - DecodeError: ログを出してその tick をスキップ
//! - InvocationError: ログを出してループを終了（出力セルは書かない）
//! - StoreError: ストア側（`RetryingStore`）で再試行済み。ここに来たら致命的

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::poller::{PollOutcome, Poller};
use crate::domain::{ExecutionContext, InvocationId, RuntimeError, codec};
use crate::ports::{Handler, KvStore};

/// Where to read, where to write, how often.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub input_key: String,
    pub output_key: String,
    pub poll_period: Duration,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Input absent or unchanged.
    Idle,
    /// Input changed but could not be decoded.
    Skipped,
    /// Handler ran and its result was written to the output key.
    Published(Value),
}

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub published: u64,
    pub skipped: u64,
}

pub struct FunctionRuntime {
    store: Arc<dyn KvStore>,
    handler: Box<dyn Handler>,
    context: ExecutionContext,
    poller: Poller,
    output_key: String,
    poll_period: Duration,
}

impl FunctionRuntime {
    /// The context starts empty; it lives as long as this runtime.
    pub fn new(store: Arc<dyn KvStore>, handler: Box<dyn Handler>, settings: LoopSettings) -> Self {
        let poller = Poller::new(Arc::clone(&store), settings.input_key);
        Self {
            store,
            handler,
            context: ExecutionContext::new(),
            poller,
            output_key: settings.output_key,
            poll_period: settings.poll_period,
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    /// One poll, and at most one invoke-and-publish cycle.
    pub async fn tick(&mut self) -> Result<TickOutcome, RuntimeError> {
        let outcome = self.poller.check().await.map_err(RuntimeError::Poll)?;

        match outcome {
            PollOutcome::Absent | PollOutcome::Unchanged => Ok(TickOutcome::Idle),
            PollOutcome::Malformed(err) => {
                warn!(
                    phase = "poll",
                    key = %self.poller.input_key(),
                    error = %err,
                    "skipping malformed input"
                );
                Ok(TickOutcome::Skipped)
            }
            PollOutcome::Changed(event) => {
                let result = self.invoke_and_publish(event).await?;
                Ok(TickOutcome::Published(result))
            }
        }
    }

    /// Call the handler, encode its result, overwrite the output key.
    ///
    /// Nothing is written unless the handler returned and the result encoded.
    pub async fn invoke_and_publish(&mut self, event: Value) -> Result<Value, RuntimeError> {
        let invocation = InvocationId::generate();
        debug!(%invocation, "invoking handler");

        let result = match self.handler.call(event, &mut self.context).await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    phase = "invoke",
                    %invocation,
                    context_keys = self.context.len(),
                    error = %err,
                    "handler failed"
                );
                return Err(err.into());
            }
        };

        let encoded = codec::encode(&result)?;
        self.store
            .set(&self.output_key, &encoded)
            .await
            .map_err(RuntimeError::Publish)?;

        info!(
            %invocation,
            key = %self.output_key,
            bytes = encoded.len(),
            "result published"
        );
        Ok(result)
    }

    /// Poll forever, until `shutdown` turns true (or its sender is dropped),
    /// or a fatal error occurs.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<RunSummary, RuntimeError> {
        let mut summary = RunSummary::default();
        info!(
            input_key = %self.poller.input_key(),
            output_key = %self.output_key,
            poll_period_ms = self.poll_period.as_millis() as u64,
            "runtime loop started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            summary.ticks += 1;
            match self.tick().await? {
                TickOutcome::Idle => {}
                TickOutcome::Skipped => summary.skipped += 1,
                TickOutcome::Published(_) => summary.published += 1,
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender dropped: nobody can ask us to stop anymore
                        break;
                    }
                }
                _ = tokio::time::sleep(self.poll_period) => {}
            }
        }

        info!(
            ticks = summary.ticks,
            published = summary.published,
            skipped = summary.skipped,
            "runtime loop stopped"
        );
        Ok(summary)
    }
}
