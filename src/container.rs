use core::fmt::{self, Debug, Formatter};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tracing::{debug, error, info_span, warn};

use crate::{
    analysis::Plan,
    cache::{self, CacheKey},
    errors::{CloseErrorKind, ConstructionErrorKind, DestructionFailure, InstantiateErrorKind, ResolveErrorKind},
    graph::{NodeId, Resolution},
    identity::Identity,
    instantiator::{downcast, Arg, Args},
    lifecycle::{InitError, Instance, LifecycleState, ScopeCell},
    provider::Provider,
    registry::{Registry, RegistryBuilder},
    scope::Scope,
};

/// Owns every cached component of a [`Plan`].
///
/// Cloning shares the same components. Dropping the last clone closes the container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Binds `registry` to `plan` and constructs every singleton in construction order.
    ///
    /// Lazy singletons are left for their first request, unless a singleton depends on them.
    ///
    /// # Errors
    /// - [`ConstructionErrorKind::Registry`] when the bindings don't line up with the plan
    /// - [`ConstructionErrorKind::Component`] when a singleton fails to construct.
    ///   What was already constructed is torn down first, finalizers included.
    pub fn new(plan: Plan, registry: RegistryBuilder) -> Result<Self, ConstructionErrorKind> {
        let span = info_span!("startup", components = plan.graph().len());
        let _guard = span.enter();

        let registry = registry.build(plan.graph())?;
        let inner = Arc::new(ContainerInner {
            id: cache::next_container_id(),
            cells: (0..plan.graph().len()).map(|_| ScopeCell::new()).collect(),
            closed: AtomicBool::new(false),
            plan,
            registry,
        });

        for &id in inner.plan.construction_order() {
            let node = inner.plan.graph().node(id);
            if node.declaration().scope() != Scope::Singleton {
                continue;
            }
            if let Err(err) = inner.cells[id.0].get_or_init(|| inner.construct(id)) {
                let identity = node.identity().clone();
                let source = match err {
                    InitError::Failed(source) => source,
                    InitError::Reentrant => ResolveErrorKind::Reentrant {
                        identity: identity.clone(),
                    }
                    .into(),
                    InitError::Closed => ResolveErrorKind::Closed.into(),
                };
                let err = ConstructionErrorKind::Component { identity, source };
                error!("{}", err);

                if let Err(close_err) = inner.close() {
                    warn!("Teardown after failed startup: {}", close_err);
                }
                return Err(err);
            }
            debug!(component = %node.identity(), "Constructed");
        }
        debug!("Started");

        Ok(Self { inner })
    }

    #[inline]
    #[must_use]
    pub fn plan(&self) -> &Plan {
        &self.inner.plan
    }

    /// Resolves `identity` with the same rules as an injection point and downcasts the instance.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoComponent`] / [`ResolveErrorKind::Ambiguous`] when `identity` doesn't pick one component
    /// - [`ResolveErrorKind::IncorrectType`] when the component isn't a `T`
    /// - [`ResolveErrorKind::Closed`] after [`Container::close`]
    /// - Any error of a lazy singleton's or prototype's construction
    pub fn get<T: Send + Sync + 'static>(&self, identity: &Identity) -> Result<Arc<T>, ResolveErrorKind> {
        let span = info_span!("get", component = %identity);
        let _guard = span.enter();

        let instance = self.inner.get_instance(identity)?;
        downcast(identity, instance).inspect_err(|err| error!("{}", err))
    }

    /// # Errors
    /// Same as [`Container::get`], without the type check
    pub fn get_instance(&self, identity: &Identity) -> Result<Instance, ResolveErrorKind> {
        let span = info_span!("get_instance", component = %identity);
        let _guard = span.enter();

        self.inner.get_instance(identity)
    }

    /// Handle resolving `identity` on demand, the same one a deferred injection point gets.
    ///
    /// # Errors
    /// [`ResolveErrorKind::NoComponent`] / [`ResolveErrorKind::Ambiguous`] when `identity` doesn't pick one component
    pub fn provider(&self, identity: &Identity) -> Result<Provider, ResolveErrorKind> {
        let id = self.inner.locate(identity)?;
        Ok(Provider::new(
            Arc::downgrade(&self.inner),
            id,
            self.inner.plan.graph().node(id).identity().clone(),
        ))
    }

    /// Lifecycle state of the component `identity` resolves to.
    /// Prototypes stay `Uninitialized` until the container closes.
    ///
    /// # Errors
    /// [`ResolveErrorKind::NoComponent`] / [`ResolveErrorKind::Ambiguous`] when `identity` doesn't pick one component
    pub fn state(&self, identity: &Identity) -> Result<LifecycleState, ResolveErrorKind> {
        let id = self.inner.locate(identity)?;
        Ok(self.inner.cells[id.0].state())
    }

    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Runs the finalizers in destruction order and drops every cached instance.
    /// Only the first call does anything, later ones return `Ok(())`.
    ///
    /// # Errors
    /// [`CloseErrorKind::Destruction`] listing the finalizers that failed, after the whole shutdown ran
    pub fn close(&self) -> Result<(), CloseErrorKind> {
        self.inner.close()
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("components", &self.inner.cells.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub(crate) struct ContainerInner {
    id: u64,
    plan: Plan,
    registry: Registry,
    /// One per node, prototypes included so they can report `Destroyed`
    cells: Vec<ScopeCell>,
    closed: AtomicBool,
}

impl ContainerInner {
    fn locate(&self, identity: &Identity) -> Result<NodeId, ResolveErrorKind> {
        self.plan.graph().resolve(identity).inspect_err(|err| error!("{}", err))
    }

    fn get_instance(self: &Arc<Self>, identity: &Identity) -> Result<Instance, ResolveErrorKind> {
        let id = self.locate(identity)?;
        self.resolve_node(id).inspect_err(|err| error!("{}", err))
    }

    /// Instance of `id` according to its scope
    pub(crate) fn resolve_node(self: &Arc<Self>, id: NodeId) -> Result<Instance, ResolveErrorKind> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ResolveErrorKind::Closed);
        }

        match self.plan.graph().node(id).declaration().scope() {
            Scope::Prototype => self.construct(id).map_err(|source| self.construction_error(id, source)),
            Scope::Singleton => self.published(id),
            Scope::LazySingleton => match self.published(id) {
                Err(ResolveErrorKind::NotReady { .. }) => {
                    self.cells[id.0].get_or_init(|| self.construct(id)).map_err(|err| match err {
                        InitError::Closed => ResolveErrorKind::Closed,
                        InitError::Reentrant => ResolveErrorKind::Reentrant {
                            identity: self.plan.graph().node(id).identity().clone(),
                        },
                        InitError::Failed(source) => self.construction_error(id, source),
                    })
                }
                result => result,
            },
        }
    }

    /// Published instance of a cached component, through the thread-local mirror when possible
    fn published(&self, id: NodeId) -> Result<Instance, ResolveErrorKind> {
        let cell = &self.cells[id.0];
        let key = CacheKey {
            container: self.id,
            node: id.0,
        };
        let generation = cell.generation();
        if let Some(instance) = cache::lookup(key, generation) {
            debug!("Found in cache");
            return Ok(instance);
        }

        match cell.state() {
            LifecycleState::Ready => {
                if let Some(instance) = cell.load() {
                    cache::mirror(key, generation, &instance);
                    return Ok(instance);
                }
                Err(ResolveErrorKind::Closed)
            }
            LifecycleState::Destroyed => Err(ResolveErrorKind::Closed),
            state => Err(ResolveErrorKind::NotReady {
                identity: self.plan.graph().node(id).identity().clone(),
                state,
            }),
        }
    }

    fn construction_error(&self, id: NodeId, source: InstantiateErrorKind) -> ResolveErrorKind {
        ResolveErrorKind::Construction {
            identity: self.plan.graph().node(id).identity().clone(),
            source: Box::new(source),
        }
    }

    /// Resolves the injection points of `id`, runs its instantiator and post-construct hook
    fn construct(self: &Arc<Self>, id: NodeId) -> Result<Instance, InstantiateErrorKind> {
        let graph = self.plan.graph();
        let declaration = graph.node(id).declaration();

        let mut values = Vec::with_capacity(declaration.dependencies().len());
        for (point, resolution) in declaration.dependencies().iter().zip(graph.resolutions(id)) {
            let value = match *resolution {
                Resolution::Resolved(target) => {
                    let identity = graph.node(target).identity().clone();
                    if point.is_deferred() {
                        (identity.clone(), Arg::Provider(Provider::new(Arc::downgrade(self), target, identity)))
                    } else {
                        (identity, Arg::Instance(self.resolve_node(target)?))
                    }
                }
                Resolution::Absent | Resolution::Unresolved => (point.requested().clone(), Arg::Absent),
            };
            values.push(value);
        }

        let bound = self.registry.get(id);
        let instance = bound.instantiator.call_cloned(Args::new(values))?;
        if let Some(hook) = &bound.post_construct {
            hook.call_cloned(instance.clone())
                .map_err(InstantiateErrorKind::PostConstruct)?;
            debug!(component = %declaration.identity(), "Post-construct hook called");
        }

        Ok(instance)
    }

    fn close(&self) -> Result<(), CloseErrorKind> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let span = info_span!("close", container = self.id);
        let _guard = span.enter();

        let graph = self.plan.graph();
        let mut failures = Vec::new();
        for &id in self.plan.destruction_order() {
            let cell = &self.cells[id.0];
            if let (Some(instance), Some(finalizer)) = (cell.load(), &self.registry.get(id).finalizer) {
                let identity = graph.node(id).identity();
                match finalizer.call_cloned(instance) {
                    Ok(()) => debug!(component = %identity, "Finalizer called"),
                    Err(source) => {
                        error!(component = %identity, "Finalizer failed: {}", source);
                        failures.push(DestructionFailure {
                            identity: identity.clone(),
                            source,
                        });
                    }
                }
            }
            cell.destroy();
        }
        for cell in &self.cells {
            cell.destroy();
        }
        cache::forget_container(self.id);

        if failures.is_empty() {
            debug!("Closed");
            Ok(())
        } else {
            let err = CloseErrorKind::Destruction { failures };
            error!("{}", err);
            Err(err)
        }
    }
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        if self.close().is_ok() {
            debug!("Container closed on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use parking_lot::Mutex;

    use super::Container;
    use crate::{
        analysis::analyze,
        condition::ConditionContext,
        declaration::ComponentDeclaration,
        dependency::InjectionPoint,
        errors::{CloseErrorKind, ConstructionErrorKind, InstantiateErrorKind, ResolveErrorKind},
        identity::Identity,
        instantiator::{instance, Args},
        lifecycle::LifecycleState,
        registry::RegistryBuilder,
        scope::Scope,
    };

    use tracing_test::traced_test;

    struct Logger {
        lines: Mutex<Vec<String>>,
    }

    struct Repository {
        logger: Arc<Logger>,
    }

    struct Service {
        repository: Arc<Repository>,
        logger: Arc<Logger>,
    }

    type Journal = Arc<Mutex<Vec<String>>>;

    fn plan() -> crate::analysis::Plan {
        analyze(
            vec![
                ComponentDeclaration::of::<Service>()
                    .constructor_arg(Identity::of::<Repository>())
                    .constructor_arg(Identity::of::<Logger>()),
                ComponentDeclaration::of::<Repository>().constructor_arg(Identity::of::<Logger>()),
                ComponentDeclaration::of::<Logger>(),
            ],
            &mut ConditionContext::new(),
        )
        .unwrap()
    }

    fn registry(journal: &Journal) -> RegistryBuilder {
        let (built, closed) = (journal.clone(), journal.clone());
        let record = move |name: &str| built.lock().push(format!("new {name}"));
        let (record_logger, record_repository, record_service) = (record.clone(), record.clone(), record);

        RegistryBuilder::new()
            .provide(Identity::of::<Logger>(), move |_: Args| {
                record_logger("Logger");
                Ok::<_, InstantiateErrorKind>(Logger {
                    lines: Mutex::new(vec![]),
                })
            })
            .provide(Identity::of::<Repository>(), move |args: Args| {
                record_repository("Repository");
                Ok::<_, InstantiateErrorKind>(Repository { logger: args.get(0)? })
            })
            .provide(Identity::of::<Service>(), move |args: Args| {
                record_service("Service");
                Ok::<_, InstantiateErrorKind>(Service {
                    repository: args.get(0)?,
                    logger: args.get(1)?,
                })
            })
            .add_finalizer(Identity::of::<Service>(), {
                let closed = closed.clone();
                move |_: Arc<Service>| -> anyhow::Result<()> {
                    closed.lock().push("close Service".to_owned());
                    Ok(())
                }
            })
            .add_finalizer(Identity::of::<Logger>(), move |_: Arc<Logger>| -> anyhow::Result<()> {
                closed.lock().push("close Logger".to_owned());
                Ok(())
            })
    }

    #[test]
    #[traced_test]
    fn test_startup_and_close_order() {
        let journal = Journal::default();
        let container = Container::new(plan(), registry(&journal)).unwrap();

        let service = container.get::<Service>(&Identity::of::<Service>()).unwrap();
        assert!(Arc::ptr_eq(&service.logger, &service.repository.logger));
        service.logger.lines.lock().push("hello".to_owned());
        assert_eq!(container.get::<Logger>(&Identity::of::<Logger>()).unwrap().lines.lock().len(), 1);

        container.close().unwrap();
        assert_eq!(
            *journal.lock(),
            ["new Logger", "new Repository", "new Service", "close Service", "close Logger"]
        );
        assert!(matches!(
            container.get::<Service>(&Identity::of::<Service>()),
            Err(ResolveErrorKind::Closed)
        ));
        assert_eq!(container.state(&Identity::of::<Logger>()).unwrap(), LifecycleState::Destroyed);

        container.close().unwrap();
        assert_eq!(journal.lock().len(), 5);
    }

    #[test]
    #[traced_test]
    fn test_close_on_drop() {
        let journal = Journal::default();
        let container = Container::new(plan(), registry(&journal)).unwrap();
        let clone = container.clone();

        drop(container);
        assert_eq!(journal.lock().len(), 3);
        drop(clone);
        assert_eq!(journal.lock().len(), 5);
    }

    #[test]
    #[traced_test]
    fn test_wrong_type() {
        let container = Container::new(plan(), registry(&Journal::default())).unwrap();

        assert!(matches!(
            container.get::<Repository>(&Identity::of::<Logger>()),
            Err(ResolveErrorKind::IncorrectType { .. })
        ));
        assert!(matches!(
            container.get::<Logger>(&Identity::new("Missing")),
            Err(ResolveErrorKind::NoComponent { .. })
        ));
    }

    #[test]
    #[traced_test]
    fn test_lazy_and_prototype() {
        let built = Arc::new(AtomicUsize::new(0));
        let plan = analyze(
            vec![
                ComponentDeclaration::new(Identity::new("Pool")).in_scope(Scope::LazySingleton),
                ComponentDeclaration::new(Identity::new("Request"))
                    .in_scope(Scope::Prototype)
                    .constructor_arg(Identity::new("Pool")),
            ],
            &mut ConditionContext::new(),
        )
        .unwrap();
        let registry = RegistryBuilder::new()
            .provide(Identity::new("Pool"), {
                let built = built.clone();
                move |_: Args| Ok::<_, InstantiateErrorKind>(built.fetch_add(1, Ordering::SeqCst))
            })
            .provide(Identity::new("Request"), |args: Args| {
                Ok::<_, InstantiateErrorKind>((args.get::<usize>(0)?, Arc::new(())))
            });
        let container = Container::new(plan, registry).unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 0);
        assert_eq!(container.state(&Identity::new("Pool")).unwrap(), LifecycleState::Uninitialized);

        let first = container.get::<(Arc<usize>, Arc<()>)>(&Identity::new("Request")).unwrap();
        let second = container.get::<(Arc<usize>, Arc<()>)>(&Identity::new("Request")).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first.1, &second.1));
        assert!(Arc::ptr_eq(&first.0, &second.0));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(container.state(&Identity::new("Pool")).unwrap(), LifecycleState::Ready);
    }

    #[test]
    #[traced_test]
    fn test_provider() {
        let plan = analyze(
            vec![
                ComponentDeclaration::new(Identity::new("A"))
                    .dependency(InjectionPoint::constructor(0, Identity::new("B")).deferred()),
                ComponentDeclaration::new(Identity::new("B")).constructor_arg(Identity::new("A")),
            ],
            &mut ConditionContext::new(),
        )
        .unwrap();
        let early = Arc::new(Mutex::new(None));
        let registry = RegistryBuilder::new()
            .provide(Identity::new("A"), {
                let early = early.clone();
                move |args: Args| {
                    let provider = args.provider(0)?;
                    *early.lock() = Some(provider.get::<&str>().map(|_| ()));
                    Ok::<_, InstantiateErrorKind>(provider)
                }
            })
            .provide(Identity::new("B"), instance("b"));
        let container = Container::new(plan, registry).unwrap();

        assert!(matches!(
            early.lock().take(),
            Some(Err(ResolveErrorKind::NotReady {
                state: LifecycleState::Uninitialized,
                ..
            }))
        ));
        let provider = container.get::<crate::provider::Provider>(&Identity::new("A")).unwrap();
        assert_eq!(*provider.get::<&str>().unwrap(), "b");

        drop(container);
        assert!(matches!(provider.get::<&str>(), Err(ResolveErrorKind::Closed)));
    }

    #[test]
    #[traced_test]
    fn test_startup_failure_tears_down() {
        let journal = Journal::default();
        let registry = registry(&journal).provide(Identity::of::<Service>(), |_: Args| {
            Err::<Service, _>(InstantiateErrorKind::Custom(anyhow::anyhow!("database unreachable")))
        });

        let err = Container::new(plan(), registry).unwrap_err();
        assert!(
            matches!(&err, ConstructionErrorKind::Component { identity, .. } if *identity == Identity::of::<Service>())
        );
        assert!(err.to_string().ends_with("database unreachable"));
        assert_eq!(*journal.lock(), ["new Logger", "new Repository", "close Logger"]);
    }

    #[test]
    #[traced_test]
    fn test_singleton_post_construct_failure_aborts_startup() {
        let journal = Journal::default();
        let registry = registry(&journal)
            .add_post_construct(Identity::of::<Repository>(), {
                let journal = journal.clone();
                move |_: Arc<Repository>| -> anyhow::Result<()> {
                    journal.lock().push("init Repository".to_owned());
                    Err(anyhow::anyhow!("schema mismatch"))
                }
            })
            .add_finalizer(Identity::of::<Repository>(), {
                let journal = journal.clone();
                move |_: Arc<Repository>| -> anyhow::Result<()> {
                    journal.lock().push("close Repository".to_owned());
                    Ok(())
                }
            });

        let err = Container::new(plan(), registry).unwrap_err();
        assert!(matches!(
            &err,
            ConstructionErrorKind::Component { identity, source: InstantiateErrorKind::PostConstruct(_) }
                if *identity == Identity::of::<Repository>()
        ));
        assert!(err.to_string().ends_with("schema mismatch"));
        // Repository never became ready, so only Logger is finalized
        assert_eq!(
            *journal.lock(),
            ["new Logger", "new Repository", "init Repository", "close Logger"]
        );
    }

    #[test]
    #[traced_test]
    fn test_close_aggregates_failures() {
        let plan = analyze(
            vec![
                ComponentDeclaration::new(Identity::new("A")),
                ComponentDeclaration::new(Identity::new("B")),
                ComponentDeclaration::new(Identity::new("C")),
            ],
            &mut ConditionContext::new(),
        )
        .unwrap();
        let finalized = Arc::new(AtomicUsize::new(0));
        let failing = |name: &'static str| move |_: Arc<()>| -> anyhow::Result<()> { Err(anyhow::anyhow!("{name} stuck")) };
        let registry = RegistryBuilder::new()
            .provide(Identity::new("A"), instance(()))
            .provide(Identity::new("B"), instance(()))
            .provide(Identity::new("C"), instance(()))
            .add_finalizer(Identity::new("A"), failing("A"))
            .add_finalizer(Identity::new("B"), {
                let finalized = finalized.clone();
                move |_: Arc<()>| -> anyhow::Result<()> {
                    finalized.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .add_finalizer(Identity::new("C"), failing("C"));
        let container = Container::new(plan, registry).unwrap();

        let CloseErrorKind::Destruction { failures } = container.close().unwrap_err();
        assert_eq!(finalized.load(Ordering::SeqCst), 1);
        assert_eq!(
            failures.iter().map(ToString::to_string).collect::<Vec<_>>(),
            ["C: C stuck", "A: A stuck"]
        );
        assert!(logs_contain("Finalizer failed"));
    }

    #[test]
    #[traced_test]
    fn test_post_construct_failure() {
        let plan = analyze(
            vec![ComponentDeclaration::new(Identity::new("Config")).in_scope(Scope::Prototype)],
            &mut ConditionContext::new(),
        )
        .unwrap();
        let registry = RegistryBuilder::new()
            .provide(Identity::new("Config"), instance(0_u8))
            .add_post_construct(Identity::new("Config"), |config: Arc<u8>| -> anyhow::Result<()> {
                anyhow::ensure!(*config > 0, "config is empty");
                Ok(())
            });
        let container = Container::new(plan, registry).unwrap();

        let err = container.get::<u8>(&Identity::new("Config")).unwrap_err();
        assert!(matches!(
            err,
            ResolveErrorKind::Construction { ref source, .. } if matches!(**source, InstantiateErrorKind::PostConstruct(_))
        ));
    }
}
