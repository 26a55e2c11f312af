use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
    time::Duration,
};

use froodi_static::{
    analyze, condition::ConditionContext, instance, Args, ComponentDeclaration, Container, Identity, InjectionPoint,
    InstantiateErrorKind, LifecycleState, Provider, RegistryBuilder, ResolveErrorKind, Scope,
};

struct ConnectionPool {
    id: usize,
}

#[test]
fn test_lazy_singleton_constructed_once_under_contention() {
    const THREADS: usize = 16;

    let plan = analyze(
        vec![ComponentDeclaration::of::<ConnectionPool>().in_scope(Scope::LazySingleton)],
        &mut ConditionContext::new(),
    )
    .unwrap();
    let constructed = Arc::new(AtomicUsize::new(0));
    let registry = RegistryBuilder::new().provide(Identity::of::<ConnectionPool>(), {
        let constructed = constructed.clone();
        move |_: Args| {
            let id = constructed.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok::<_, InstantiateErrorKind>(ConnectionPool { id })
        }
    });
    let container = Container::new(plan, registry).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let (container, barrier) = (container.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                container.get::<ConnectionPool>(&Identity::of::<ConnectionPool>()).unwrap()
            })
        })
        .collect();
    let pools: Vec<Arc<ConnectionPool>> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert!(pools.iter().all(|pool| pool.id == 0 && Arc::ptr_eq(pool, &pools[0])));
    assert_eq!(
        container.state(&Identity::of::<ConnectionPool>()).unwrap(),
        LifecycleState::Ready
    );
}

#[test]
fn test_failed_lazy_construction_is_retried() {
    let plan = analyze(
        vec![ComponentDeclaration::new(Identity::new("Client")).in_scope(Scope::LazySingleton)],
        &mut ConditionContext::new(),
    )
    .unwrap();
    let attempts = Arc::new(AtomicUsize::new(0));
    let registry = RegistryBuilder::new().provide(Identity::new("Client"), {
        let attempts = attempts.clone();
        move |_: Args| -> Result<&'static str, InstantiateErrorKind> {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(anyhow::anyhow!("connection refused").into());
            }
            Ok("client")
        }
    });
    let container = Container::new(plan, registry).unwrap();

    let err = container.get::<&str>(&Identity::new("Client")).unwrap_err();
    assert_eq!(err.to_string(), "Failed to construct Client: connection refused");
    assert_eq!(
        container.state(&Identity::new("Client")).unwrap(),
        LifecycleState::Uninitialized
    );

    assert_eq!(*container.get::<&str>(&Identity::new("Client")).unwrap(), "client");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_reentrant_construction_is_reported() {
    let plan = analyze(
        vec![
            ComponentDeclaration::new(Identity::new("A"))
                .in_scope(Scope::LazySingleton)
                .dependency(InjectionPoint::constructor(0, Identity::new("B")).deferred()),
            ComponentDeclaration::new(Identity::new("B"))
                .in_scope(Scope::LazySingleton)
                .constructor_arg(Identity::new("A")),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap();
    let registry = RegistryBuilder::new()
        .provide(Identity::new("A"), |args: Args| {
            // Resolving B needs A, which is still under construction
            let b = args.provider(0)?.get::<&str>()?;
            Ok::<_, InstantiateErrorKind>(*b)
        })
        .provide(Identity::new("B"), |args: Args| {
            Ok::<_, InstantiateErrorKind>(*args.get::<&str>(0)?)
        });
    let container = Container::new(plan, registry).unwrap();

    let err = container.get::<&str>(&Identity::new("A")).unwrap_err();
    let mut source: &dyn std::error::Error = &err;
    while let Some(next) = source.source() {
        source = next;
    }
    assert!(source.to_string().contains("requested again while it is being constructed"));
    assert_eq!(container.state(&Identity::new("A")).unwrap(), LifecycleState::Uninitialized);
}

#[test]
fn test_prototype_is_fresh_per_request() {
    struct Request {
        pool: Arc<ConnectionPool>,
    }

    let plan = analyze(
        vec![
            ComponentDeclaration::of::<ConnectionPool>(),
            ComponentDeclaration::of::<Request>()
                .in_scope(Scope::Prototype)
                .constructor_arg(Identity::of::<ConnectionPool>()),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap();
    let post_constructed = Arc::new(AtomicUsize::new(0));
    let registry = RegistryBuilder::new()
        .provide(Identity::of::<ConnectionPool>(), |_: Args| {
            Ok::<_, InstantiateErrorKind>(ConnectionPool { id: 7 })
        })
        .provide(Identity::of::<Request>(), |args: Args| {
            Ok::<_, InstantiateErrorKind>(Request { pool: args.get(0)? })
        })
        .add_post_construct(Identity::of::<Request>(), {
            let post_constructed = post_constructed.clone();
            move |_: Arc<Request>| -> anyhow::Result<()> {
                post_constructed.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
    let container = Container::new(plan, registry).unwrap();

    let requests: Vec<Arc<Request>> = (0..3)
        .map(|_| container.get::<Request>(&Identity::of::<Request>()).unwrap())
        .collect();

    assert!(!Arc::ptr_eq(&requests[0], &requests[1]));
    assert!(requests.iter().all(|request| request.pool.id == 7 && Arc::ptr_eq(&request.pool, &requests[0].pool)));
    assert_eq!(post_constructed.load(Ordering::SeqCst), 3);
}

#[test]
fn test_provider_after_close() {
    let plan = analyze(
        vec![ComponentDeclaration::new(Identity::new("Settings"))],
        &mut ConditionContext::new(),
    )
    .unwrap();
    let container = Container::new(plan, RegistryBuilder::new().provide(Identity::new("Settings"), instance(1_u32))).unwrap();
    let provider: Provider = container.provider(&Identity::new("Settings")).unwrap();

    assert_eq!(*provider.get::<u32>().unwrap(), 1);
    container.close().unwrap();
    assert!(matches!(provider.get::<u32>(), Err(ResolveErrorKind::Closed)));
    assert!(container.is_closed());
}
