use std::sync::Arc;

use crate::{
    finalizer::{downcast_hook_target, BoxedCloneHook},
    lifecycle::Instance,
    service::{service_fn, BoxCloneService},
};

/// Post-construct hook, run right after the instantiator and before the instance is published.
///
/// Runs for every prototype instance too.
pub trait PostConstruct<Dep>: Clone + Send + Sync + 'static {
    /// # Errors
    /// A failure counts as a failed construction
    fn post_construct(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error>;
}

impl<F, Dep> PostConstruct<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Result<(), anyhow::Error> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn post_construct(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error> {
        self(dependency)
    }
}

#[must_use]
pub(crate) fn boxed_post_construct_factory<Dep, Hook>(mut hook: Hook) -> BoxedCloneHook
where
    Dep: Send + Sync + 'static,
    Hook: PostConstruct<Dep>,
{
    BoxCloneService(Box::new(service_fn(move |instance: Instance| {
        let dependency = downcast_hook_target::<Dep>(instance)?;
        hook.post_construct(dependency)
    })))
}
