//! Diagnostic trace of model lifecycle notifications.
//!
//! The engine reports every `start`, `ta`, `lambda` and transition call to a
//! [`TraceSink`]. The sink is passed in explicitly (there is no global), and
//! the engine checks [`TraceSink::enabled`] before building a record, so the
//! same binary serves instrumented and silent runs.
//!
//! Correctness never depends on the sink.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::time::SimTime;
use crate::types::ModelName;

/// What happened to a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TraceKind {
    Start,
    TimeAdvance,
    Lambda,
    Internal,
    External,
    Confluent,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraceKind::Start => "START",
            TraceKind::TimeAdvance => "TA",
            TraceKind::Lambda => "LAMBDA",
            TraceKind::Internal => "DELTA_INT",
            TraceKind::External => "DELTA_EXT",
            TraceKind::Confluent => "DELTA_CONF",
        };
        f.write_str(s)
    }
}

/// One trace record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceElement {
    /// The model the notification is about
    pub model_name: ModelName,
    /// Simulation time of the call
    pub time: SimTime,
    /// The kind of call
    pub kind: TraceKind,
    /// Optional payload summary (bag contents, time advance value)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl TraceElement {
    /// Creates a record without a payload summary.
    pub fn new(model_name: impl Into<ModelName>, time: SimTime, kind: TraceKind) -> Self {
        Self {
            model_name: model_name.into(),
            time,
            kind,
            comment: String::new(),
        }
    }

    /// Attaches a payload summary.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

impl fmt::Display for TraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TRACE: {} at {} <{}>", self.model_name, self.time, self.kind)?;
        if !self.comment.is_empty() {
            write!(f, " {}", self.comment)?;
        }
        Ok(())
    }
}

/// An ordered list of trace records with query helpers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceElements(Vec<TraceElement>);

impl TraceElements {
    /// Keeps only records about `name`.
    pub fn filter_model_name(&self, name: &str) -> TraceElements {
        self.filter(|e| e.model_name == name)
    }

    /// Keeps only records at `time`.
    pub fn filter_time(&self, time: SimTime) -> TraceElements {
        self.filter(|e| e.time == time)
    }

    /// Keeps only records of `kind`.
    pub fn filter_kind(&self, kind: TraceKind) -> TraceElements {
        self.filter(|e| e.kind == kind)
    }

    fn filter(&self, pred: impl Fn(&TraceElement) -> bool) -> TraceElements {
        TraceElements(self.0.iter().filter(|e| pred(e)).cloned().collect())
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the records in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, TraceElement> {
        self.0.iter()
    }

    /// Serializes the records as a JSON array.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

impl fmt::Display for TraceElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.0 {
            writeln!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// Receiver of lifecycle notifications.
pub trait TraceSink: Send + Sync {
    /// Whether records should be built at all.
    fn enabled(&self) -> bool {
        true
    }

    /// Appends a record.
    fn record(&self, element: TraceElement);
}

/// Shared handle to a sink, cloned into every coordinator of a tree.
pub type SharedSink = Arc<dyn TraceSink>;

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn enabled(&self) -> bool {
        false
    }

    fn record(&self, _element: TraceElement) {}
}

/// Returns a shared handle to the null sink.
pub fn null_sink() -> SharedSink {
    Arc::new(NullSink)
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct TraceLog {
    elements: Mutex<Vec<TraceElement>>,
}

impl TraceLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log behind a shared handle.
    pub fn shared() -> Arc<TraceLog> {
        Arc::new(Self::new())
    }

    /// Drops every record.
    pub fn clear(&self) {
        self.elements.lock().clear();
    }

    /// Returns a snapshot of the records.
    pub fn elements(&self) -> TraceElements {
        TraceElements(self.elements.lock().clone())
    }

    /// Takes every record, leaving the log empty.
    pub fn flush(&self) -> TraceElements {
        TraceElements(std::mem::take(&mut *self.elements.lock()))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.elements.lock().len()
    }

    /// Returns true if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.lock().is_empty()
    }
}

impl TraceSink for TraceLog {
    fn record(&self, element: TraceElement) {
        self.elements.lock().push(element);
    }
}

impl fmt::Display for TraceLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.elements().fmt(f)
    }
}

/// Records a notification if the sink is enabled.
///
/// The comment closure runs only for enabled sinks.
pub(crate) fn emit<F>(sink: &dyn TraceSink, model: &str, time: SimTime, kind: TraceKind, comment: F)
where
    F: FnOnce() -> String,
{
    if sink.enabled() {
        sink.record(TraceElement::new(model, time, kind).with_comment(comment()));
    }
}
