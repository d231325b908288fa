// ABOUTME: Tests for tool Registry - registration, name handling, overrides
// ABOUTME: and shared state between clones.

use super::*;
use crate::error::ToolError;
use crate::schema::{ToolParam, ToolParams};

/// A simple test tool.
struct EchoTool;

#[async_trait::async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes input back"
    }

    fn parameters(&self) -> ToolParams {
        ToolParams::new().required("message", ToolParam::string().describe("Text to echo"))
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        let message = params["message"].as_str().unwrap_or("");
        Ok(ToolResult::text(message))
    }
}

#[tokio::test]
async fn test_register_and_get() {
    let registry = Registry::new();
    registry.register(EchoTool).await.unwrap();

    let tool = registry.get("echo").await;
    assert_eq!(tool.unwrap().name(), "echo");
    assert!(registry.get("nonexistent").await.is_none());
}

#[tokio::test]
async fn test_unregister() {
    let registry = Registry::new();
    registry.register(EchoTool).await.unwrap();
    assert_eq!(registry.count().await, 1);

    registry.unregister("echo").await;
    assert_eq!(registry.count().await, 0);
}

#[tokio::test]
async fn test_def_without_override_keeps_declared_name() {
    let registry = Registry::new();
    registry
        .register_def(ToolDef::new(EchoTool).description("Repeat a message"))
        .await
        .unwrap();

    assert_eq!(registry.list().await, vec!["echo"]);
    let info = &registry.infos().await[0];
    assert_eq!(info.description, "Repeat a message");
}

#[tokio::test]
async fn test_def_overrides_name_and_param_description() {
    let registry = Registry::new();
    registry
        .register_def(
            ToolDef::new(EchoTool)
                .name("say")
                .param_description("message", "What to say"),
        )
        .await
        .unwrap();

    assert!(registry.get("echo").await.is_none());
    let info = registry.get("say").await.unwrap().info();
    assert_eq!(info.name, "say");
    assert_eq!(
        info.parameters.properties["message"].description.as_deref(),
        Some("What to say")
    );
}

#[tokio::test]
async fn test_def_rejects_unknown_param() {
    let registry = Registry::new();
    let result = registry
        .register_def(ToolDef::new(EchoTool).param_description("volume", "loud"))
        .await;
    assert!(matches!(result, Err(ToolError::InvalidParams(_))));
}

#[tokio::test]
async fn test_invalid_names_rejected() {
    let registry = Registry::new();
    for name in ["has space", "dots.not.allowed", ""] {
        let result = registry.register_def(ToolDef::new(EchoTool).name(name)).await;
        assert!(
            matches!(result, Err(ToolError::InvalidName(_))),
            "{:?} should be rejected",
            name
        );
    }
    assert!(validate_tool_name("bash_2-x").is_ok());
}

#[tokio::test]
async fn test_fn_tool() {
    let registry = Registry::new();
    let tool = FnTool::new(
        "add",
        "Add two integers",
        ToolParams::new()
            .required("x", ToolParam::integer())
            .required("y", ToolParam::integer()),
        |args: serde_json::Value| async move {
            let sum = args["x"].as_i64().unwrap_or(0) + args["y"].as_i64().unwrap_or(0);
            Ok::<_, anyhow::Error>(ToolResult::text(sum.to_string()))
        },
    );
    registry.register(tool).await.unwrap();

    let add = registry.get("add").await.unwrap();
    let result = add.execute(serde_json::json!({"x": 2, "y": 3})).await.unwrap();
    assert_eq!(result.content, "5");
    assert_eq!(add.info().parameters.required, vec!["x", "y"]);
}

#[tokio::test]
async fn test_infos_sorted() {
    let registry = Registry::new();
    registry.register(EchoTool).await.unwrap();
    registry
        .register_def(ToolDef::new(EchoTool).name("alpha"))
        .await
        .unwrap();

    let names: Vec<_> = registry.infos().await.into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["alpha", "echo"]);
}

#[tokio::test]
async fn test_clone_shares_state() {
    let registry = Registry::new();
    let clone = registry.clone();

    registry.register(EchoTool).await.unwrap();
    assert_eq!(clone.count().await, 1);
}
