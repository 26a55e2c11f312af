use std::{sync::Arc, thread};

use froodi_static::{
    analyze, clear_thread_caches, condition::ConditionContext, instance, ComponentDeclaration, Container, Identity,
    RegistryBuilder,
};

// Kept alone in its binary: clearing bumps a process-wide epoch
#[test]
fn test_clear_thread_caches() {
    let plan = analyze(vec![ComponentDeclaration::new(Identity::new("Clock"))], &mut ConditionContext::new()).unwrap();
    let container = Container::new(plan, RegistryBuilder::new().provide(Identity::new("Clock"), instance(5_u64))).unwrap();
    let clock = Identity::new("Clock");

    let first = container.get::<u64>(&clock).unwrap();
    let cached = container.get::<u64>(&clock).unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    clear_thread_caches();
    assert!(Arc::ptr_eq(&container.get::<u64>(&clock).unwrap(), &first));

    let other = {
        let container = container.clone();
        thread::spawn(move || container.get::<u64>(&Identity::new("Clock")).unwrap())
            .join()
            .unwrap()
    };
    assert!(Arc::ptr_eq(&other, &first));

    container.close().unwrap();
    assert!(container.get::<u64>(&clock).is_err());
}
