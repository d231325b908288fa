// ABOUTME: Dispatch of model tool calls - argument validation, execution,
// ABOUTME: and sorting failures into reported-to-model errors versus fatal ones.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Registry, ToolResult};
use crate::error::{
    EvalError, ExecError, LimitExceededError, SandboxError, ToolCallError, ToolCallErrorKind,
    ToolError,
};
use crate::sample::transcript;
use crate::trace::trace_action;
use crate::transcript::{Event, EventMeta, ToolEvent};

/// A tool invocation requested by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, function: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            function: function.into(),
            arguments,
        }
    }
}

/// The answer to a [`ToolCall`], sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolMessage {
    pub tool_call_id: String,
    pub function: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolCallError>,
}

/// Execute each call in order. Reportable failures become messages with an
/// error attached; the first fatal failure stops dispatch and is returned.
pub async fn execute_tools(
    registry: &Registry,
    calls: &[ToolCall],
) -> Result<Vec<ToolMessage>, EvalError> {
    let mut messages = Vec::with_capacity(calls.len());
    for call in calls {
        messages.push(execute_tool_call(registry, call).await?);
    }
    Ok(messages)
}

/// Execute a single call and record a tool event for it.
pub async fn execute_tool_call(
    registry: &Registry,
    call: &ToolCall,
) -> Result<ToolMessage, EvalError> {
    let outcome = match registry.get(&call.function).await {
        None => Err(ToolCallError::new(
            ToolCallErrorKind::Parsing,
            format!("Tool {} not found", call.function),
        )),
        Some(tool) => match tool.parameters().validate(&call.arguments) {
            Err(reason) => Err(ToolCallError::new(ToolCallErrorKind::Parsing, reason)),
            Ok(()) => {
                let run = tool.execute(call.arguments.clone());
                match trace_action("Tool", &call.function, run).await {
                    Ok(result) => Ok(result),
                    Err(e) => match classify(e) {
                        Ok(reported) => Err(reported),
                        Err(fatal) => {
                            let error = fatal_event_error(&fatal);
                            record_tool_event(call, String::new(), Some(error));
                            return Err(fatal);
                        }
                    },
                }
            }
        },
    };

    let message = match outcome {
        Ok(ToolResult {
            content,
            is_error: false,
            ..
        }) => ToolMessage {
            tool_call_id: call.id.clone(),
            function: call.function.clone(),
            content,
            error: None,
        },
        Ok(ToolResult { content, .. }) => ToolMessage {
            tool_call_id: call.id.clone(),
            function: call.function.clone(),
            content: String::new(),
            error: Some(ToolCallError::unknown(content)),
        },
        Err(error) => {
            tracing::debug!(tool = %call.function, kind = %error.kind, "tool call error: {}", error);
            ToolMessage {
                tool_call_id: call.id.clone(),
                function: call.function.clone(),
                content: String::new(),
                error: Some(error),
            }
        }
    };

    record_tool_event(call, message.content.clone(), message.error.clone());
    Ok(message)
}

fn record_tool_event(call: &ToolCall, result: String, error: Option<ToolCallError>) {
    transcript().record(Event::Tool(ToolEvent {
        meta: EventMeta::now(),
        call_id: call.id.clone(),
        function: call.function.clone(),
        arguments: call.arguments.clone(),
        result,
        error,
    }));
}

/// How a fatal failure appears in the tool event recorded before it propagates.
fn fatal_event_error(error: &EvalError) -> ToolCallError {
    match error {
        EvalError::LimitExceeded(e) => ToolCallError::new(ToolCallErrorKind::Limit, e.to_string()),
        other => ToolCallError::unknown(other.to_string()),
    }
}

/// Decide whether a tool failure goes back to the model (`Ok`) or ends the
/// sample (`Err`).
fn classify(error: anyhow::Error) -> Result<ToolCallError, EvalError> {
    if let Some(reported) = error.downcast_ref::<ToolCallError>() {
        return Ok(reported.clone());
    }
    if let Some(reported) = error.downcast_ref::<SandboxError>().and_then(reportable_sandbox) {
        return Ok(reported);
    }
    if let Some(ExecError::Timeout(_)) = error.downcast_ref::<ExecError>() {
        return Ok(ToolCallError::new(
            ToolCallErrorKind::Timeout,
            "Command timed out before completing.",
        ));
    }
    if let Some(EvalError::Sandbox(e)) = error.downcast_ref::<EvalError>() {
        if let Some(reported) = reportable_sandbox(e) {
            return Ok(reported);
        }
    }

    match error.downcast::<LimitExceededError>() {
        Ok(exceeded) => Err(EvalError::LimitExceeded(exceeded)),
        Err(error) => match error.downcast::<EvalError>() {
            Ok(eval) => Err(eval),
            Err(error) => Err(EvalError::Tool(ToolError::Execution(error))),
        },
    }
}

fn reportable_sandbox(error: &SandboxError) -> Option<ToolCallError> {
    let kind = error.reported_kind()?;
    let message = match error {
        SandboxError::Timeout(_) | SandboxError::Exec(ExecError::Timeout(_)) => {
            "Command timed out before completing.".to_string()
        }
        SandboxError::OutputLimitExceeded {
            truncated_output: Some(output),
            ..
        } => format!("{}. Truncated output:\n\n{}", error, output),
        _ => error.to_string(),
    };
    Some(ToolCallError::new(kind, message))
}
