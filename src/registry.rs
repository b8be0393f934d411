//! Model factory registry for configuration-driven model trees.
//!
//! The registry maps type names to factories that build atomic models, so a
//! [`ModelConfig`] tree can be turned into nested coordinators.
//!
//! # Example
//!
//! ```
//! use pdevs::config::ModelConfig;
//! use pdevs::registry::create_default_registry;
//!
//! let registry = create_default_registry();
//! let model = ModelConfig::coupled("root")
//!     .with_child(ModelConfig::atomic("a", "Pulse").with_output("out"))
//!     .with_child(ModelConfig::atomic("b", "Relay").with_input("in").with_output("out"))
//!     .with_coupling("a.out", "b.in");
//!
//! let top = registry.build(&model).unwrap();
//! assert_eq!(top.graph().len(), 2);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{ConfigError, ModelConfig};
use crate::coordinator::Coordinator;
use crate::coupling::GraphManager;
use crate::error::{SimError, SimResult};
use crate::model::Dynamics;
use crate::types::Parameters;

/// Type alias for model factory functions. Receives the instance name and
/// its construction parameters.
pub type ModelFactory = Arc<dyn Fn(&str, &Parameters) -> Box<dyn Dynamics> + Send + Sync>;

/// A registry for atomic model factories.
#[derive(Default)]
pub struct ModelRegistry {
    factories: HashMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model factory under `name`, replacing any previous one.
    ///
    /// ```
    /// use pdevs::registry::ModelRegistry;
    /// use pdevs::models::Relay;
    ///
    /// let mut registry = ModelRegistry::new();
    /// registry.register("Relay", |_, _| Box::new(Relay::new()));
    /// assert!(registry.contains("Relay"));
    /// ```
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&str, &Parameters) -> Box<dyn Dynamics> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a model instance by type name.
    pub fn create(
        &self,
        type_name: &str,
        name: &str,
        params: &Parameters,
    ) -> Option<Box<dyn Dynamics>> {
        self.factories.get(type_name).map(|f| f(name, params))
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Returns an iterator over registered type names.
    pub fn type_names(&self) -> impl Iterator<Item = &String> {
        self.factories.keys()
    }

    /// Unregisters a model type.
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }

    /// Clears all registered types.
    pub fn clear(&mut self) {
        self.factories.clear();
    }

    /// Builds the coordinator tree described by a coupled `model`.
    ///
    /// Children are added in declaration order, which fixes their
    /// enumeration order. Every coupling is validated when the coordinator
    /// is created.
    pub fn build(&self, model: &ModelConfig) -> SimResult<Coordinator> {
        if !model.is_coupled() {
            return Err(ConfigError::Validation(format!("top model '{}' must be coupled", model.name)).into());
        }
        model.validate()?;
        self.build_coupled(model)
    }

    fn build_coupled(&self, model: &ModelConfig) -> SimResult<Coordinator> {
        let mut graph = GraphManager::new();

        for child in &model.children {
            match &child.model_type {
                Some(type_name) => {
                    let dynamics = self
                        .create(type_name, &child.name, &child.attrs)
                        .ok_or_else(|| SimError::UnknownModelType(type_name.clone()))?;
                    graph.add_atomic(child.desc(), dynamics);
                }
                None => {
                    graph.add_coupled(self.build_coupled(child)?);
                }
            }
        }

        for coupling in &model.couplings {
            graph.add_coupling(coupling.to_coupling()?);
        }

        tracing::debug!(
            model = %model.name,
            children = model.children.len(),
            couplings = model.couplings.len(),
            "coupled model built"
        );
        Coordinator::new(model.desc(), graph)
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("registered_types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Creates a registry with the built-in model types.
///
/// Includes:
/// - `Pulse` - Pulse (`value`)
/// - `Relay` - Relay
/// - `Generator` - Generator (`period`, `offset`)
/// - `Collector` - Collector
pub fn create_default_registry() -> ModelRegistry {
    use crate::models::{Collector, Generator, Pulse, Relay};

    let mut registry = ModelRegistry::new();
    registry.register("Pulse", |_, params| Box::new(Pulse::from_parameters(params)));
    registry.register("Relay", |_, _| Box::new(Relay::new()));
    registry.register("Generator", |_, params| {
        Box::new(Generator::from_parameters(params))
    });
    registry.register("Collector", |_, _| Box::new(Collector::new()));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Relay;
    use crate::types::no_parameters;

    #[test]
    fn test_registry_basic() {
        let mut registry = ModelRegistry::new();
        assert!(registry.is_empty());

        registry.register("Relay", |_, _| Box::new(Relay::new()));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("Relay"));
        assert!(registry.create("Relay", "b", &no_parameters()).is_some());
        assert!(registry.create("Missing", "b", &no_parameters()).is_none());
    }

    #[test]
    fn test_registry_unregister() {
        let mut registry = create_default_registry();
        assert_eq!(registry.len(), 4);
        assert!(registry.unregister("Relay"));
        assert!(!registry.unregister("Relay"));
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_build_nested() {
        let registry = create_default_registry();
        let inner = ModelConfig::coupled("inner")
            .with_input("in")
            .with_output("out")
            .with_child(ModelConfig::atomic("r", "Relay").with_input("in").with_output("out"))
            .with_coupling("in", "r.in")
            .with_coupling("r.out", "out");
        let top = ModelConfig::coupled("root")
            .with_child(ModelConfig::atomic("g", "Generator").with_attr("period", "2").with_output("out"))
            .with_child(inner)
            .with_coupling("g.out", "inner.in");

        let coord = registry.build(&top).unwrap();
        assert_eq!(coord.graph().children().collect::<Vec<_>>(), vec!["g", "inner"]);
    }

    #[test]
    fn test_build_rejects_atomic_top() {
        let registry = create_default_registry();
        let err = registry
            .build(&ModelConfig::atomic("a", "Pulse").with_output("out"))
            .unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::Validation(ref msg)) if msg.contains("'a'")));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_unknown_type() {
        let registry = create_default_registry();
        let model = ModelConfig::coupled("root").with_child(ModelConfig::atomic("x", "Teleporter"));
        let err = registry.build(&model).unwrap_err();
        assert!(matches!(err, SimError::UnknownModelType(ref t) if t == "Teleporter"));
    }

    #[test]
    fn test_build_rejects_bad_port() {
        let registry = create_default_registry();
        let model = ModelConfig::coupled("root")
            .with_child(ModelConfig::atomic("a", "Pulse").with_output("out"))
            .with_child(ModelConfig::atomic("b", "Relay").with_input("in"))
            .with_coupling("a.out", "b.inn");
        let err = registry.build(&model).unwrap_err();
        assert!(matches!(err, SimError::UnknownPort { .. }));
    }
}
