use std::collections::BTreeMap;

use tracing::{debug, error};

use crate::{
    errors::RegistryErrorKind,
    finalizer::{boxed_finalizer_factory, BoxedCloneHook, Finalizer},
    graph::{DependencyGraph, NodeId},
    identity::Identity,
    initializer::{boxed_post_construct_factory, PostConstruct},
    instantiator::{boxed_instantiator_factory, BoxedCloneInstantiator, Instantiator},
};

/// Runtime behaviour of the declared components, keyed by identity.
#[derive(Default)]
pub struct RegistryBuilder {
    instantiators: BTreeMap<Identity, BoxedCloneInstantiator>,
    post_constructs: BTreeMap<Identity, BoxedCloneHook>,
    finalizers: BTreeMap<Identity, BoxedCloneHook>,
}

impl RegistryBuilder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the instantiator of `identity`. A second call for the same identity replaces the first.
    ///
    /// The instantiator receives the injected values in the order of the component's injection points.
    #[inline]
    #[must_use]
    pub fn provide(mut self, identity: Identity, instantiator: impl Instantiator) -> Self {
        self.instantiators.insert(identity, boxed_instantiator_factory(instantiator));
        self
    }

    /// Adds a hook called after every construction of `identity`, prototypes included.
    /// A failing hook fails the construction.
    #[inline]
    #[must_use]
    pub fn add_post_construct<Dep>(mut self, identity: Identity, hook: impl PostConstruct<Dep>) -> Self
    where
        Dep: Send + Sync + 'static,
    {
        self.post_constructs.insert(identity, boxed_post_construct_factory(hook));
        self
    }

    /// Adds a finalizer for the given cached component.
    /// Finalizers run while the container closes, in destruction order.
    ///
    /// # Warning
    /// Prototypes aren't tracked after construction, their finalizers never run.
    #[inline]
    #[must_use]
    pub fn add_finalizer<Dep>(mut self, identity: Identity, finalizer: impl Finalizer<Dep>) -> Self
    where
        Dep: Send + Sync + 'static,
    {
        self.finalizers.insert(identity, boxed_finalizer_factory(finalizer));
        self
    }

    /// Lines the bindings up with the nodes of `graph`.
    ///
    /// # Errors
    /// - [`RegistryErrorKind::UnknownComponent`] for a binding no node matches
    /// - [`RegistryErrorKind::DuplicateComponent`] for a binding that matches several nodes
    /// - [`RegistryErrorKind::NoInstantiator`] for a node without instantiator
    pub(crate) fn build(self, graph: &DependencyGraph) -> Result<Registry, RegistryErrorKind> {
        let mut entries: Vec<Entry> = (0..graph.len()).map(|_| Entry::default()).collect();

        for (identity, instantiator) in self.instantiators {
            entries[locate(graph, &identity)?.0].instantiator = Some(instantiator);
        }
        for (identity, hook) in self.post_constructs {
            entries[locate(graph, &identity)?.0].post_construct = Some(hook);
        }
        for (identity, hook) in self.finalizers {
            entries[locate(graph, &identity)?.0].finalizer = Some(hook);
        }

        let mut bound = Vec::with_capacity(entries.len());
        for (node, entry) in graph.nodes().iter().zip(entries) {
            let Some(instantiator) = entry.instantiator else {
                let err = RegistryErrorKind::NoInstantiator {
                    identity: node.identity().clone(),
                };
                error!("{}", err);
                return Err(err);
            };
            bound.push(Bound {
                instantiator,
                post_construct: entry.post_construct,
                finalizer: entry.finalizer,
            });
        }
        debug!(components = bound.len(), "Registry built");

        Ok(Registry { entries: bound })
    }
}

fn locate(graph: &DependencyGraph, identity: &Identity) -> Result<NodeId, RegistryErrorKind> {
    let err = match graph.find(identity).as_slice() {
        [id] => return Ok(*id),
        [] => RegistryErrorKind::UnknownComponent {
            identity: identity.clone(),
        },
        _ => RegistryErrorKind::DuplicateComponent {
            identity: identity.clone(),
        },
    };
    error!("{}", err);
    Err(err)
}

#[derive(Default)]
struct Entry {
    instantiator: Option<BoxedCloneInstantiator>,
    post_construct: Option<BoxedCloneHook>,
    finalizer: Option<BoxedCloneHook>,
}

pub(crate) struct Bound {
    pub(crate) instantiator: BoxedCloneInstantiator,
    pub(crate) post_construct: Option<BoxedCloneHook>,
    pub(crate) finalizer: Option<BoxedCloneHook>,
}

/// Bindings indexed by [`NodeId`]
pub(crate) struct Registry {
    entries: Vec<Bound>,
}

impl Registry {
    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Bound {
        &self.entries[id.0]
    }
}
