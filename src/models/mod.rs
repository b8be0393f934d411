//! Built-in example models.
//!
//! These are small leaves that exercise the atomic contract. They are useful
//! in tests and demos and as references for writing custom models.
//!
//! - [`Pulse`] - Self-driven, emits every time unit; input triggers an immediate emission
//! - [`Relay`] - Passive until poked, then emits once
//! - [`Generator`] - Periodic source with a sequence counter
//! - [`Collector`] - Passive sink recording every delivery

pub mod collector;
pub mod generator;
pub mod pulse;
pub mod relay;

pub use collector::{Collector, CollectorHandle, Received};
pub use generator::Generator;
pub use pulse::{Phase, Pulse};
pub use relay::Relay;
