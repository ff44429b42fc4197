//! The boundary tool implementations plug into

use async_trait::async_trait;
use serde_json::Value;

use super::error::BoxError;

/// An invocable tool capability
///
/// Implementations receive arguments that have already been validated
/// against the declared schema and return a JSON payload that is folded back
/// into the conversation. Handlers may perform their own I/O, but they never
/// see session history or orchestrator state.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> Result<Value, BoxError>;
}

/// Plain async functions and capturing closures work as handlers
#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    async fn call(&self, arguments: Value) -> Result<Value, BoxError> {
        (self)(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn echo(arguments: Value) -> Result<Value, BoxError> {
        Ok(json!({ "echo": arguments }))
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler: &dyn ToolHandler = &echo;
        let out = handler.call(json!({"x": 1})).await.unwrap();
        assert_eq!(out, json!({"echo": {"x": 1}}));
    }

    #[tokio::test]
    async fn test_closure_handler() {
        let greeting = "hello".to_string();
        let closure = move |_: Value| {
            let greeting = greeting.clone();
            async move { Ok::<Value, BoxError>(Value::String(greeting)) }
        };
        let handler: &dyn ToolHandler = &closure;
        let out = handler.call(json!({})).await.unwrap();
        assert_eq!(out, json!("hello"));
    }
}
