//! Handler port - ロード済みのユーザー関数
//!
//! 呼び出し契約は固定: `(event, &mut context) -> result`。
//! ハンドラはプロセスの寿命の間ランタイムが所有し、再ロードはしない。

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ExecutionContext, InvocationError};

/// A loaded, callable handler.
///
/// `&mut self` because an out-of-process handler owns its pipes; the runtime
/// never calls a handler concurrently.
#[async_trait]
pub trait Handler: Send {
    async fn call(
        &mut self,
        event: Value,
        context: &mut ExecutionContext,
    ) -> Result<Value, InvocationError>;
}

