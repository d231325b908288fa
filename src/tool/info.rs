// ABOUTME: ToolInfo - the serializable description of a tool handed to a
// ABOUTME: model, plus tool name validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::schema::ToolParams;

/// Name, description and parameter schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: ToolParams,
}

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("tool name pattern compiles"));

/// Check that `name` is usable as a tool name.
pub fn validate_tool_name(name: &str) -> Result<(), ToolError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(ToolError::InvalidName(name.to_string()))
    }
}
