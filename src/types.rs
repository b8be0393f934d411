//! Core identity types for the simulation kernel.
//!
//! Names identify models and ports for routing and tracing. They never
//! influence behavior.

use std::collections::HashMap;

/// Name of a model, unique within its parent's scope.
pub type ModelName = String;

/// Name of an input or output port on a model.
pub type PortName = String;

/// Construction parameters handed to a model factory.
///
/// A model with no configurable options accepts an empty map.
pub type Parameters = HashMap<String, String>;

/// Returns the empty parameter set.
pub fn no_parameters() -> Parameters {
    Parameters::new()
}
