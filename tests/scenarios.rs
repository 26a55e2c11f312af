use froodi_static::{
    analyze,
    condition::{ConditionContext, MissingBeanCondition, ProfileCondition},
    ComponentDeclaration, DiagnosticKind, Identity, InjectionPoint, Plan,
};

fn id(name: &str) -> Identity {
    Identity::new(name)
}

fn names(plan: &Plan, ids: &[froodi_static::NodeId]) -> Vec<String> {
    ids.iter().map(|id| plan.graph().node(*id).identity().to_string()).collect()
}

#[test]
fn test_logger_repository_service() {
    let plan = analyze(
        vec![
            ComponentDeclaration::new(id("Service"))
                .constructor_arg(id("Repository"))
                .constructor_arg(id("Logger")),
            ComponentDeclaration::new(id("Repository")).constructor_arg(id("Logger")),
            ComponentDeclaration::new(id("Logger")),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap();

    assert_eq!(names(&plan, plan.construction_order()), ["Logger", "Repository", "Service"]);
    assert_eq!(names(&plan, plan.destruction_order()), ["Service", "Repository", "Logger"]);
    assert!(plan.warnings().is_empty());
}

#[test]
fn test_profile_rejects_component() {
    let mut context = ConditionContext::builder().profiles(["prod"]).build();
    let plan = analyze(
        vec![
            ComponentDeclaration::new(id("DevTools")).condition(ProfileCondition::new(["dev", "!prod"])),
            ComponentDeclaration::new(id("Metrics")).condition(ProfileCondition::new(["prod"])),
        ],
        &mut context,
    )
    .unwrap();

    assert_eq!(names(&plan, plan.construction_order()), ["Metrics"]);
    assert_eq!(plan.rejected().len(), 1);
    assert_eq!(plan.rejected()[0].declaration.identity(), &id("DevTools"));
}

#[test]
fn test_missing_bean_is_order_sensitive() {
    let fallback = || ComponentDeclaration::new(id("InMemoryCache")).condition(MissingBeanCondition::for_types(["RedisCache"]));
    let redis = || ComponentDeclaration::new(id("RedisCache"));

    let fallback_first = analyze(vec![fallback(), redis()], &mut ConditionContext::new()).unwrap();
    let redis_first = analyze(vec![redis(), fallback()], &mut ConditionContext::new()).unwrap();

    assert_eq!(fallback_first.graph().len(), 2);
    assert_eq!(redis_first.graph().len(), 1);
    assert_eq!(redis_first.rejected().len(), 1);
}

#[test]
fn test_deterministic_output() {
    let declarations = || {
        vec![
            ComponentDeclaration::new(id("Api"))
                .constructor_arg(id("Auth"))
                .constructor_arg(id("Store")),
            ComponentDeclaration::new(id("Auth")).constructor_arg(id("Store")),
            ComponentDeclaration::new(id("Store")).implements("Repository"),
            ComponentDeclaration::new(id("Clock")).with_order(-10),
            ComponentDeclaration::new(id("Jobs")).constructor_arg(id("Repository")),
        ]
    };

    let first = analyze(declarations(), &mut ConditionContext::new()).unwrap();
    let expected = first.factories().to_string();
    for _ in 0..32 {
        let plan = analyze(declarations(), &mut ConditionContext::new()).unwrap();
        assert_eq!(plan.order(), first.order());
        assert_eq!(plan.factories().to_string(), expected);
    }
    assert_eq!(names(&first, first.construction_order()), ["Clock", "Store", "Auth", "Api", "Jobs"]);
}

#[test]
fn test_deferred_edge_allows_cycle() {
    let plan = analyze(
        vec![
            ComponentDeclaration::new(id("EventBus")).dependency(InjectionPoint::setter("subscribe", 0, id("Listener")).deferred()),
            ComponentDeclaration::new(id("Listener")).constructor_arg(id("EventBus")),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap();

    assert_eq!(names(&plan, plan.construction_order()), ["EventBus", "Listener"]);
}

#[test]
fn test_eager_cycle_is_reported() {
    let report = analyze(
        vec![
            ComponentDeclaration::new(id("EventBus")).dependency(InjectionPoint::setter("subscribe", 0, id("Listener"))),
            ComponentDeclaration::new(id("Listener")).constructor_arg(id("EventBus")),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap_err();

    assert!(matches!(
        &report.errors[0].kind,
        DiagnosticKind::CyclicDependency { path } if path == &[id("EventBus"), id("Listener"), id("EventBus")]
    ));
}

#[test]
fn test_primary_breaks_tie() {
    let plan = analyze(
        vec![
            ComponentDeclaration::new(id("PgRepo")).implements("Repo"),
            ComponentDeclaration::new(id("MemRepo")).implements("Repo").primary(),
            ComponentDeclaration::new(id("Handler")).constructor_arg(id("Repo")),
        ],
        &mut ConditionContext::new(),
    )
    .unwrap();

    let handler = plan.graph().resolve(&id("Handler")).unwrap();
    assert_eq!(names(&plan, &plan.graph().dependencies_of(handler)), ["MemRepo"]);
}
