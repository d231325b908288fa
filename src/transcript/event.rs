// ABOUTME: Event types recorded in a sample transcript.
// ABOUTME: Serialized with an "event" tag so logs can be read back by type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{LimitKind, ToolCallError};
use crate::store::StoreChange;

/// Fields shared by every event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl EventMeta {
    pub fn now() -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

/// Sandbox operation recorded by [`SandboxEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxAction {
    Exec,
    ReadFile,
    WriteFile,
}

/// A change in store state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub changes: Vec<StoreChange>,
}

/// A call into a sandbox environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub sandbox: String,
    pub action: SandboxAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Seconds between the start of the call and its completion.
    pub working_time: f64,
}

/// A tool call and its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub call_id: String,
    pub function: String,
    pub arguments: Value,
    pub result: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolCallError>,
}

/// A limit was reached or exceeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleLimitEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(rename = "type")]
    pub kind: LimitKind,
    pub message: String,
    pub limit: Option<f64>,
}

/// A subprocess run on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubprocessEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub args: Vec<String>,
    pub returncode: Option<i32>,
    pub timed_out: bool,
}

/// Free-form information recorded by user code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanBeginEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub span_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanEndEvent {
    #[serde(flatten)]
    pub meta: EventMeta,
    pub span_id: Uuid,
}

/// Any event that can appear in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Store(StoreEvent),
    Sandbox(SandboxEvent),
    Tool(ToolEvent),
    SampleLimit(SampleLimitEvent),
    Subprocess(SubprocessEvent),
    Info(InfoEvent),
    SpanBegin(SpanBeginEvent),
    SpanEnd(SpanEndEvent),
}

impl Event {
    /// The serialized tag of this event.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Store(_) => "store",
            Event::Sandbox(_) => "sandbox",
            Event::Tool(_) => "tool",
            Event::SampleLimit(_) => "sample_limit",
            Event::Subprocess(_) => "subprocess",
            Event::Info(_) => "info",
            Event::SpanBegin(_) => "span_begin",
            Event::SpanEnd(_) => "span_end",
        }
    }

    pub fn meta(&self) -> &EventMeta {
        match self {
            Event::Store(e) => &e.meta,
            Event::Sandbox(e) => &e.meta,
            Event::Tool(e) => &e.meta,
            Event::SampleLimit(e) => &e.meta,
            Event::Subprocess(e) => &e.meta,
            Event::Info(e) => &e.meta,
            Event::SpanBegin(e) => &e.meta,
            Event::SpanEnd(e) => &e.meta,
        }
    }
}
