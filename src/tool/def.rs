// ABOUTME: ToolDef wraps a tool with overrides for its name, description and
// ABOUTME: parameter descriptions. FnTool builds a tool from an async closure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Tool, ToolResult, validate_tool_name};
use crate::error::ToolError;
use crate::schema::ToolParams;

/// A tool plus presentation overrides.
///
/// Without a name override the wrapped tool's declared name is kept.
#[derive(Clone)]
pub struct ToolDef {
    tool: Arc<dyn Tool>,
    name: Option<String>,
    description: Option<String>,
    param_descriptions: HashMap<String, String>,
}

impl ToolDef {
    pub fn new<T: Tool + 'static>(tool: T) -> Self {
        Self::from_arc(Arc::new(tool))
    }

    pub fn from_arc(tool: Arc<dyn Tool>) -> Self {
        Self {
            tool,
            name: None,
            description: None,
            param_descriptions: HashMap::new(),
        }
    }

    /// Present the tool under a different name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the description of one parameter.
    pub fn param_description(
        mut self,
        param: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.param_descriptions
            .insert(param.into(), description.into());
        self
    }

    /// Check the effective name and that every overridden parameter exists.
    pub fn validate(&self) -> Result<(), ToolError> {
        validate_tool_name(Tool::name(self))?;
        let params = self.tool.parameters();
        for param in self.param_descriptions.keys() {
            if !params.properties.contains_key(param) {
                return Err(ToolError::InvalidParams(format!(
                    "tool '{}' has no parameter named '{}'",
                    Tool::name(self),
                    param
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Tool for ToolDef {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.tool.name())
    }

    fn description(&self) -> &str {
        self.description
            .as_deref()
            .unwrap_or_else(|| self.tool.description())
    }

    fn parameters(&self) -> ToolParams {
        let mut params = self.tool.parameters();
        for (name, description) in &self.param_descriptions {
            if let Some(param) = params.properties.get_mut(name) {
                param.description = Some(description.clone());
            }
        }
        params
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        self.tool.execute(params).await
    }
}

/// A tool implemented by an async closure over the raw JSON arguments.
pub struct FnTool<F> {
    name: String,
    description: String,
    parameters: ToolParams,
    f: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, anyhow::Error>> + Send,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: ToolParams,
        f: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            f,
        }
    }
}

#[async_trait]
impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, anyhow::Error>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> ToolParams {
        self.parameters.clone()
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult, anyhow::Error> {
        (self.f)(params).await
    }
}
