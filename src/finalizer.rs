use std::sync::Arc;

use crate::{
    lifecycle::Instance,
    service::{service_fn, BoxCloneService},
};

/// Pre-destroy hook, run once per cached instance while the container closes.
pub trait Finalizer<Dep>: Clone + Send + Sync + 'static {
    /// # Errors
    /// A failure is logged and reported by [`crate::Container::close`], the rest of the shutdown still runs
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error>;
}

impl<F, Dep> Finalizer<Dep> for F
where
    F: FnMut(Arc<Dep>) -> Result<(), anyhow::Error> + Clone + Send + Sync + 'static,
{
    #[inline]
    fn finalize(&mut self, dependency: Arc<Dep>) -> Result<(), anyhow::Error> {
        self(dependency)
    }
}

/// Type-erased lifecycle hook, shared by finalizers and post-construct hooks
pub(crate) type BoxedCloneHook = BoxCloneService<Instance, (), anyhow::Error>;

pub(crate) fn downcast_hook_target<Dep: Send + Sync + 'static>(instance: Instance) -> Result<Arc<Dep>, anyhow::Error> {
    instance
        .downcast::<Dep>()
        .map_err(|_| anyhow::anyhow!("Hook bound to an instance that isn't a {}", core::any::type_name::<Dep>()))
}

#[must_use]
pub(crate) fn boxed_finalizer_factory<Dep, Fin>(mut finalizer: Fin) -> BoxedCloneHook
where
    Dep: Send + Sync + 'static,
    Fin: Finalizer<Dep>,
{
    BoxCloneService(Box::new(service_fn(move |instance: Instance| {
        let dependency = downcast_hook_target::<Dep>(instance)?;
        finalizer.finalize(dependency)
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::boxed_finalizer_factory;
    use crate::lifecycle::Instance;

    struct Pool {
        closed: AtomicBool,
    }

    #[test]
    fn test_finalizer() {
        let finalizer = boxed_finalizer_factory(|pool: Arc<Pool>| -> anyhow::Result<()> {
            pool.closed.store(true, Ordering::SeqCst);
            Ok(())
        });
        let pool = Arc::new(Pool {
            closed: AtomicBool::new(false),
        });

        finalizer.call_cloned(pool.clone() as Instance).unwrap();
        assert!(pool.closed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_finalizer_wrong_type() {
        let finalizer = boxed_finalizer_factory(|_: Arc<Pool>| -> anyhow::Result<()> { Ok(()) });

        let err = finalizer.call_cloned(Arc::new(1_u8) as Instance).unwrap_err();
        assert!(err.to_string().contains("isn't a"));
    }
}
