use core::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Weak};

use crate::{
    container::ContainerInner,
    errors::ResolveErrorKind,
    graph::NodeId,
    identity::Identity,
    instantiator::downcast,
    lifecycle::Instance,
};

/// Handle injected at a deferred injection point, resolving its component on each call.
///
/// Holds a weak reference, so it never keeps the container alive.
#[derive(Clone)]
pub struct Provider {
    container: Weak<ContainerInner>,
    node: NodeId,
    identity: Identity,
}

impl Provider {
    pub(crate) fn new(container: Weak<ContainerInner>, node: NodeId, identity: Identity) -> Self {
        Self {
            container,
            node,
            identity,
        }
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// # Errors
    /// - [`ResolveErrorKind::Closed`] once the container is closed or dropped
    /// - [`ResolveErrorKind::NotReady`] for a singleton that isn't built yet
    /// - [`ResolveErrorKind::IncorrectType`] when the component isn't a `T`
    /// - Any error of the component's construction
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveErrorKind> {
        downcast(&self.identity, self.get_instance()?)
    }

    /// # Errors
    /// Same as [`Provider::get`], without the type check
    pub fn get_instance(&self) -> Result<Instance, ResolveErrorKind> {
        let Some(container) = self.container.upgrade() else {
            return Err(ResolveErrorKind::Closed);
        };
        container.resolve_node(self.node)
    }
}

impl Debug for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("identity", &self.identity)
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}
