//! Coupling graph of a coupled model.
//!
//! A [`GraphManager`] owns the children of one coordinator (an index-addressed
//! arena of [`Child`] values) together with the static couplings between
//! them. Three kinds of coupling exist:
//!
//! - internal: child output port → sibling input port
//! - external input: parent input port → child input port
//! - external output: child output port → parent output port
//!
//! Couplings are written with names and resolved once, when the owning
//! coordinator is built. Resolution checks every name against the declared
//! ports and turns it into a [`ChildId`] handle, so routing during a cycle is
//! a plain map lookup.
//!
//! # Example
//!
//! ```
//! use pdevs::coupling::GraphManager;
//! use pdevs::model::ModelDesc;
//! use pdevs::models::{Pulse, Relay};
//!
//! let mut graph = GraphManager::new();
//! graph.add_atomic(ModelDesc::new("a").with_output("out"), Box::new(Pulse::new()));
//! graph.add_atomic(
//!     ModelDesc::new("b").with_input("in").with_output("out"),
//!     Box::new(Relay::new()),
//! );
//! graph.add_internal_coupling("a", "out", "b", "in");
//! assert_eq!(graph.children().collect::<Vec<_>>(), vec!["a", "b"]);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::config::ConfigError;
use crate::coordinator::Coordinator;
use crate::error::{SimError, SimResult};
use crate::model::{Dynamics, ModelDesc, PortDirection};
use crate::simulator::{Child, Simulator};
use crate::types::{ModelName, PortName};

/// Handle of a child inside its parent's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(pub usize);

/// One side of a coupling, by name. `model == None` is the parent's boundary.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub model: Option<ModelName>,
    pub port: PortName,
}

impl PortRef {
    /// A port on a child.
    pub fn child(model: impl Into<ModelName>, port: impl Into<PortName>) -> Self {
        Self {
            model: Some(model.into()),
            port: port.into(),
        }
    }

    /// A port on the enclosing coupled model.
    pub fn external(port: impl Into<PortName>) -> Self {
        Self {
            model: None,
            port: port.into(),
        }
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.model {
            Some(model) => write!(f, "{}.{}", model, self.port),
            None => write!(f, "{}", self.port),
        }
    }
}

/// A directed edge from an output port to an input port.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coupling {
    pub from: PortRef,
    pub to: PortRef,
}

impl Coupling {
    pub fn new(from: PortRef, to: PortRef) -> Self {
        Self { from, to }
    }
}

impl fmt::Display for Coupling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A resolved coupling endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Child(ChildId),
    External,
}

/// Where an event leaving a port ends up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    pub endpoint: Endpoint,
    pub port: PortName,
}

/// Children and couplings of one coupled model.
#[derive(Default)]
pub struct GraphManager {
    children: Vec<Child>,
    couplings: Vec<Coupling>,
    index: HashMap<ModelName, ChildId>,
    routes: HashMap<(Endpoint, PortName), Vec<Destination>>,
}

impl GraphManager {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an atomic child. Children are enumerated in insertion order.
    pub fn add_atomic(&mut self, desc: ModelDesc, dynamics: Box<dyn Dynamics>) -> ChildId {
        self.add_child(Child::Atomic(Simulator::new(desc, dynamics)))
    }

    /// Adds a nested coupled child.
    pub fn add_coupled(&mut self, coordinator: Coordinator) -> ChildId {
        self.add_child(Child::Coupled(Box::new(coordinator)))
    }

    /// Adds an already wrapped child.
    pub fn add_child(&mut self, child: Child) -> ChildId {
        let id = ChildId(self.children.len());
        self.children.push(child);
        id
    }

    /// Adds a coupling between two siblings.
    pub fn add_internal_coupling(
        &mut self,
        src_model: impl Into<ModelName>,
        src_port: impl Into<PortName>,
        dst_model: impl Into<ModelName>,
        dst_port: impl Into<PortName>,
    ) {
        self.add_coupling(Coupling::new(
            PortRef::child(src_model, src_port),
            PortRef::child(dst_model, dst_port),
        ));
    }

    /// Adds a coupling from the parent's input port to a child.
    pub fn add_input_coupling(
        &mut self,
        parent_port: impl Into<PortName>,
        dst_model: impl Into<ModelName>,
        dst_port: impl Into<PortName>,
    ) {
        self.add_coupling(Coupling::new(
            PortRef::external(parent_port),
            PortRef::child(dst_model, dst_port),
        ));
    }

    /// Adds a coupling from a child to the parent's output port.
    pub fn add_output_coupling(
        &mut self,
        src_model: impl Into<ModelName>,
        src_port: impl Into<PortName>,
        parent_port: impl Into<PortName>,
    ) {
        self.add_coupling(Coupling::new(
            PortRef::child(src_model, src_port),
            PortRef::external(parent_port),
        ));
    }

    /// Adds a coupling.
    pub fn add_coupling(&mut self, coupling: Coupling) {
        self.couplings.push(coupling);
    }

    /// Child names in enumeration order.
    pub fn children(&self) -> impl Iterator<Item = &str> + '_ {
        self.children.iter().map(|c| c.name())
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if the graph has no child.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// The couplings as declared.
    pub fn couplings(&self) -> &[Coupling] {
        &self.couplings
    }

    /// Looks up a child handle by name. Valid after resolution.
    pub fn child_id(&self, name: &str) -> Option<ChildId> {
        self.index.get(name).copied()
    }

    /// Returns a child by handle.
    pub fn child(&self, id: ChildId) -> Option<&Child> {
        self.children.get(id.0)
    }

    pub(crate) fn children_slice(&self) -> &[Child] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut [Child] {
        &mut self.children
    }

    /// Destinations of an event leaving `port` of `source`.
    ///
    /// An empty slice means the port is uncoupled and its output is dropped.
    pub fn destinations(&self, source: Endpoint, port: &str) -> &[Destination] {
        // tuple keys cannot be borrowed as (Endpoint, &str)
        self.routes
            .get(&(source, port.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validates names and couplings against `owner` and builds the routing
    /// table. Called once by [`Coordinator::new`].
    pub(crate) fn resolve(&mut self, owner: &ModelDesc) -> SimResult<()> {
        self.index.clear();
        self.routes.clear();

        for (i, child) in self.children.iter().enumerate() {
            let name = child.name().to_string();
            if self.index.insert(name.clone(), ChildId(i)).is_some() {
                return Err(SimError::DuplicateModel {
                    coordinator: owner.name.clone(),
                    model: name,
                });
            }
        }

        let mut seen = HashSet::new();
        for coupling in &self.couplings {
            if !seen.insert(coupling.clone()) {
                tracing::debug!(coordinator = %owner.name, %coupling, "duplicate coupling ignored");
                continue;
            }

            let source = self.resolve_end(owner, &coupling.from, PortDirection::Output)?;
            let target = self.resolve_end(owner, &coupling.to, PortDirection::Input)?;

            if source == Endpoint::External && target == Endpoint::External {
                return Err(ConfigError::Validation(format!(
                    "coupling '{}' in '{}' connects the boundary to itself",
                    coupling, owner.name
                ))
                .into());
            }

            self.routes
                .entry((source, coupling.from.port.clone()))
                .or_default()
                .push(Destination {
                    endpoint: target,
                    port: coupling.to.port.clone(),
                });
        }

        tracing::debug!(
            coordinator = %owner.name,
            children = self.children.len(),
            couplings = self.couplings.len(),
            "coupling graph resolved"
        );
        Ok(())
    }

    /// Resolves one side of a coupling. `child_direction` is the direction the
    /// port must have when it sits on a child; on the parent boundary the
    /// direction flips (events enter through the parent's inputs).
    fn resolve_end(
        &self,
        owner: &ModelDesc,
        port_ref: &PortRef,
        child_direction: PortDirection,
    ) -> SimResult<Endpoint> {
        match &port_ref.model {
            Some(model) => {
                let id = self.index.get(model).copied().ok_or_else(|| SimError::UnknownModel {
                    coordinator: owner.name.clone(),
                    model: model.clone(),
                })?;
                let desc = self.children[id.0].desc();
                if !desc.has_port(child_direction, &port_ref.port) {
                    return Err(SimError::UnknownPort {
                        model: model.clone(),
                        port: port_ref.port.clone(),
                        direction: child_direction,
                    });
                }
                Ok(Endpoint::Child(id))
            }
            None => {
                let direction = match child_direction {
                    PortDirection::Output => PortDirection::Input,
                    PortDirection::Input => PortDirection::Output,
                };
                if !owner.has_port(direction, &port_ref.port) {
                    return Err(SimError::UnknownPort {
                        model: owner.name.clone(),
                        port: port_ref.port.clone(),
                        direction,
                    });
                }
                Ok(Endpoint::External)
            }
        }
    }
}

impl fmt::Debug for GraphManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphManager")
            .field("children", &self.children().collect::<Vec<_>>())
            .field("couplings", &self.couplings)
            .finish()
    }
}
