//! Event and bag definitions.
//!
//! An `ExternalEvent` is one payload on one port. A `Bag` is the ordered,
//! possibly empty collection of events a model emits (from `lambda`) or
//! receives (in `dext`/`dconf`) at one instant.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::PortName;

/// A single value travelling through a port.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalEvent {
    /// The port the event is attached to. For an output bag this is the
    /// emitting model's output port; after routing it is the receiving
    /// model's input port.
    pub port: PortName,
    /// The payload. Opaque to the engine.
    pub content: serde_json::Value,
}

impl ExternalEvent {
    /// Creates a new event on `port`.
    pub fn new(port: impl Into<PortName>, content: serde_json::Value) -> Self {
        Self {
            port: port.into(),
            content,
        }
    }

    /// Returns a copy of this event re-addressed to another port.
    pub fn on_port(&self, port: impl Into<PortName>) -> Self {
        Self {
            port: port.into(),
            content: self.content.clone(),
        }
    }
}

impl fmt::Display for ExternalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} : {})", self.port, self.content)
    }
}

/// An ordered collection of events exchanged at one instant.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag(Vec<ExternalEvent>);

impl Bag {
    /// Creates an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bag holding a single event.
    pub fn single(port: impl Into<PortName>, content: serde_json::Value) -> Self {
        Self(vec![ExternalEvent::new(port, content)])
    }

    /// Appends an event.
    pub fn push(&mut self, event: ExternalEvent) {
        self.0.push(event);
    }

    /// Appends every event of `other`, keeping order.
    pub fn extend(&mut self, other: Bag) {
        self.0.extend(other.0);
    }

    /// Returns true if the bag holds no event.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the events in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExternalEvent> {
        self.0.iter()
    }

    /// Iterates over the events attached to `port`.
    pub fn on_port<'a>(&'a self, port: &'a str) -> impl Iterator<Item = &'a ExternalEvent> + 'a {
        self.0.iter().filter(move |e| e.port == port)
    }

    /// Consumes the bag, returning its events.
    pub fn into_events(self) -> Vec<ExternalEvent> {
        self.0
    }
}

impl From<Vec<ExternalEvent>> for Bag {
    fn from(events: Vec<ExternalEvent>) -> Self {
        Self(events)
    }
}

impl FromIterator<ExternalEvent> for Bag {
    fn from_iter<I: IntoIterator<Item = ExternalEvent>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Bag {
    type Item = ExternalEvent;
    type IntoIter = std::vec::IntoIter<ExternalEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a ExternalEvent;
    type IntoIter = std::slice::Iter<'a, ExternalEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        for event in &self.0 {
            write!(f, "{} ", event)?;
        }
        write!(f, "}}")
    }
}
