// ABOUTME: Transcript - a shared, append-only list of sample events.
// ABOUTME: Clones share the same underlying log.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use uuid::Uuid;

use super::{Event, EventMeta, InfoEvent, SpanBeginEvent, SpanEndEvent};

/// Event log for a single sample.
///
/// Recording never blocks on async work, so events can be recorded from
/// synchronous code paths such as limit checks.
#[derive(Clone, Default)]
pub struct Transcript {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Transcript {
    /// Create a new empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transcript not attached to any sample. Events recorded here are
    /// dropped along with the handle.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn record(&self, event: Event) {
        tracing::trace!(event = event.name(), "transcript event");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Snapshot of all recorded events, in order.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record free-form information. Values that fail to serialize are
    /// recorded as their error message.
    pub fn info(&self, source: Option<&str>, data: impl Serialize) {
        let data = serde_json::to_value(data)
            .unwrap_or_else(|e| serde_json::Value::String(format!("<unserializable: {}>", e)));
        self.record(Event::Info(InfoEvent {
            meta: EventMeta::now(),
            source: source.map(str::to_string),
            data,
        }));
    }

    /// Run `fut` inside a named span. Begin and end events are recorded
    /// around it, including when the future returns an error.
    pub async fn span<F: Future>(&self, name: &str, fut: F) -> F::Output {
        let span_id = Uuid::new_v4();
        self.record(Event::SpanBegin(SpanBeginEvent {
            meta: EventMeta::now(),
            span_id,
            name: name.to_string(),
        }));
        let output = fut.await;
        self.record(Event::SpanEnd(SpanEndEvent {
            meta: EventMeta::now(),
            span_id,
        }));
        output
    }

    /// Serialize all events as JSON lines.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for event in self.events() {
            out.push_str(&serde_json::to_string(&event)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transcript")
            .field("events", &self.len())
            .finish()
    }
}
