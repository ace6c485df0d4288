//! FnHandler - プロセス内で動く Rust クロージャのハンドラ
//!
//! 組み込み用途とテスト用。外部プログラムを使わずに `Handler` を満たす。

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{ExecutionContext, InvocationError};
use crate::ports::Handler;

/// Wraps a closure as a [`Handler`].
///
/// An `Err(message)` from the closure becomes [`InvocationError::Raised`].
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: FnMut(Value, &mut ExecutionContext) -> Result<Value, String> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Handler for FnHandler<F>
where
    F: FnMut(Value, &mut ExecutionContext) -> Result<Value, String> + Send,
{
    async fn call(
        &mut self,
        event: Value,
        context: &mut ExecutionContext,
    ) -> Result<Value, InvocationError> {
        (self.f)(event, context).map_err(InvocationError::Raised)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn closure_sees_event_and_context() {
        let mut handler = FnHandler::new(|event: Value, ctx: &mut ExecutionContext| {
            ctx.merge([("last".to_string(), event.clone())]);
            Ok(json!({ "echo": event }))
        });
        let mut ctx = ExecutionContext::new();

        let out = handler.call(json!(7), &mut ctx).await.unwrap();

        assert_eq!(out, json!({ "echo": 7 }));
        assert_eq!(ctx.get("last"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn closure_error_is_raised() {
        let mut handler = FnHandler::new(|_: Value, _: &mut ExecutionContext| Err("nope".into()));
        let err = handler
            .call(json!(null), &mut ExecutionContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, InvocationError::Raised(m) if m == "nope"));
    }
}
