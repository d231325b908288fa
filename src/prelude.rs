// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use evalkit::prelude::*;` to get started quickly.

pub use crate::concurrency::{concurrency, concurrency_status};
pub use crate::config::Config;
pub use crate::display::{DisplayType, display_counter, display_type};
pub use crate::error::{
    ConcurrencyError, EvalError, ExecError, LimitExceededError, LimitKind, SandboxError,
    StoreError, ToolCallError, ToolCallErrorKind, ToolError,
};
pub use crate::limit::{
    Limit, ModelUsage, apply_limits, check_message_limit, check_token_limit,
    check_working_time_limit, message_limit, record_model_usage, record_waiting_time,
    time_limit, token_limit, working_time_limit,
};
pub use crate::sample::{SampleContext, sandbox, sandbox_with, store, transcript};
pub use crate::sandbox::{
    ExecOptions, SandboxEnvironment, SandboxEnvironmentProxy, SandboxEnvironmentSpec,
    SandboxEnvironments, SandboxProvider, SandboxProviderRegistry, SandboxTask,
};
pub use crate::schema::{JsonSchema, ToolParam, ToolParams};
pub use crate::store::Store;
pub use crate::subprocess::{ExecResult, Subprocess};
pub use crate::tool::{
    FnTool, Registry, Tool, ToolCall, ToolDef, ToolInfo, ToolMessage, ToolResult, execute_tools,
};
pub use crate::tools::{BashTool, PythonTool, ReadFileTool, WriteFileTool, register_builtins};
pub use crate::trace::trace_action;
pub use crate::transcript::{Event, Transcript};
