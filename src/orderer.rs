use std::collections::BTreeSet;

use tracing::{debug, error, info_span};

use crate::{
    errors::OrderErrorKind,
    graph::{DependencyGraph, NodeId},
    scope::Scope,
};

/// Startup and shutdown sequences of the cached components.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConstructionOrder {
    /// Dependencies before dependents
    pub construction: Vec<NodeId>,
    /// Exact reverse of `construction`
    pub destruction: Vec<NodeId>,
}

/// Kahn's algorithm over the eager edges.
///
/// Among the nodes ready at the same time, the lowest `order` goes first, then the earliest discovered.
/// Prototypes constrain the order but don't appear in it.
///
/// # Errors
/// Returns [`OrderErrorKind::Cycle`] with the nodes left unordered when eager edges form a cycle
pub fn order(graph: &DependencyGraph) -> Result<ConstructionOrder, OrderErrorKind> {
    let span = info_span!("order", nodes = graph.len());
    let _guard = span.enter();

    let mut pending: Vec<usize> = graph
        .nodes()
        .iter()
        .map(|node| graph.edges_from(node.id()).filter(|edge| edge.kind.is_eager()).count())
        .collect();

    let key = |id: NodeId| {
        let node = graph.node(id);
        (node.declaration().order(), node.discovery_index(), id)
    };
    let mut ready: BTreeSet<(i32, usize, NodeId)> = graph
        .nodes()
        .iter()
        .filter(|node| pending[node.id().0] == 0)
        .map(|node| key(node.id()))
        .collect();

    let mut sorted = Vec::with_capacity(graph.len());
    while let Some((_, _, id)) = ready.pop_first() {
        sorted.push(id);
        for edge in graph.edges_to(id) {
            if !edge.kind.is_eager() {
                continue;
            }
            pending[edge.from.0] -= 1;
            if pending[edge.from.0] == 0 {
                ready.insert(key(edge.from));
            }
        }
    }

    if sorted.len() < graph.len() {
        let err = OrderErrorKind::Cycle {
            remaining: graph
                .nodes()
                .iter()
                .filter(|node| pending[node.id().0] > 0)
                .map(|node| node.identity().clone())
                .collect(),
        };
        error!("{}", err);
        return Err(err);
    }

    let construction: Vec<NodeId> = sorted
        .into_iter()
        .filter(|id| graph.node(*id).declaration().scope() != Scope::Prototype)
        .collect();
    let destruction = construction.iter().rev().copied().collect();
    debug!(?construction, "Ordered");

    Ok(ConstructionOrder {
        construction,
        destruction,
    })
}

/// Per-request construction sequence of `id`: its transitive prototype dependencies
/// over eager edges, dependencies first, ending with `id` itself.
/// Cached dependencies are already built and don't appear.
#[must_use]
pub fn site_order(graph: &DependencyGraph, id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut visited = BTreeSet::from([id]);
    let mut frames = vec![(id, graph.edges_from(id))];

    while let Some((current, edges)) = frames.last_mut() {
        match edges.next() {
            Some(edge) => {
                if edge.kind.is_eager()
                    && graph.node(edge.to).declaration().scope() == Scope::Prototype
                    && visited.insert(edge.to)
                {
                    frames.push((edge.to, graph.edges_from(edge.to)));
                }
            }
            None => {
                out.push(*current);
                frames.pop();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{order, site_order};
    use crate::{
        condition::ConditionContext,
        declaration::ComponentDeclaration,
        dependency::InjectionPoint,
        errors::OrderErrorKind,
        graph::{DependencyGraph, GraphBuilder, NodeId},
        identity::Identity,
        scope::Scope,
    };

    use tracing_test::traced_test;

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    fn component(name: &str, deps: &[&str]) -> ComponentDeclaration {
        deps.iter()
            .fold(ComponentDeclaration::new(id(name)), |declaration, dep| declaration.constructor_arg(id(dep)))
    }

    fn build(declarations: Vec<ComponentDeclaration>) -> DependencyGraph {
        GraphBuilder::build(declarations, &mut ConditionContext::new())
    }

    fn names(graph: &DependencyGraph, ids: &[NodeId]) -> Vec<String> {
        ids.iter().map(|id| graph.node(*id).identity().to_string()).collect()
    }

    #[test]
    #[traced_test]
    fn test_logger_repository_service() {
        let graph = build(vec![
            component("Service", &["Repository", "Logger"]),
            component("Repository", &["Logger"]),
            component("Logger", &[]),
        ]);
        let order = order(&graph).unwrap();

        assert_eq!(names(&graph, &order.construction), ["Logger", "Repository", "Service"]);
        assert_eq!(names(&graph, &order.destruction), ["Service", "Repository", "Logger"]);
    }

    #[test]
    fn test_ties_by_order_then_discovery() {
        let graph = build(vec![
            component("C", &[]),
            component("A", &[]).with_order(5),
            component("B", &[]).with_order(-1),
            component("D", &[]),
        ]);

        assert_eq!(names(&graph, &order(&graph).unwrap().construction), ["B", "C", "D", "A"]);
    }

    #[test]
    fn test_prototypes_are_excluded() {
        let graph = build(vec![
            component("Request", &["Logger"]).in_scope(Scope::Prototype),
            component("Handler", &["Request"]),
            component("Logger", &[]),
            component("Pool", &[]).in_scope(Scope::LazySingleton),
        ]);

        assert_eq!(names(&graph, &order(&graph).unwrap().construction), ["Logger", "Handler", "Pool"]);
    }

    #[test]
    fn test_deferred_edge_ordering() {
        let graph = build(vec![
            ComponentDeclaration::new(id("A")).dependency(InjectionPoint::constructor(0, id("B")).deferred()),
            component("B", &["A"]),
        ]);

        assert_eq!(names(&graph, &order(&graph).unwrap().construction), ["A", "B"]);
    }

    #[test]
    #[traced_test]
    fn test_cycle() {
        let graph = build(vec![component("A", &["B"]), component("B", &["A"]), component("C", &["A"])]);

        assert_eq!(
            order(&graph),
            Err(OrderErrorKind::Cycle {
                remaining: vec![id("A"), id("B"), id("C")]
            })
        );
    }

    #[test]
    fn test_deterministic() {
        let declarations = || {
            vec![
                component("E", &["A", "B"]),
                component("A", &[]),
                component("B", &["A"]),
                component("C", &[]),
                component("D", &["C", "B"]),
            ]
        };
        let first = order(&build(declarations())).unwrap();
        for _ in 0..16 {
            assert_eq!(order(&build(declarations())).unwrap(), first);
        }
    }

    #[test]
    fn test_site_order() {
        let graph = build(vec![
            component("Logger", &[]),
            component("Context", &["Logger"]).in_scope(Scope::Prototype),
            component("Request", &["Context", "Logger", "Context"]).in_scope(Scope::Prototype),
        ]);

        assert_eq!(names(&graph, &site_order(&graph, NodeId(2))), ["Context", "Request"]);
        assert_eq!(site_order(&graph, NodeId(0)), vec![NodeId(0)]);
    }

    #[test]
    fn test_deep_prototype_chain() {
        const LEN: usize = 50_000;
        let names: Vec<String> = (0..LEN).map(|idx| format!("P{idx}")).collect();
        let declarations = (0..LEN).map(|idx| {
            let dep = names.get(idx + 1).map(String::as_str);
            component(&names[idx], dep.as_slice()).in_scope(Scope::Prototype)
        });
        let graph = build(declarations.collect());

        let sequence = site_order(&graph, NodeId(0));
        assert_eq!(sequence.len(), LEN);
        assert_eq!(sequence.first(), Some(&NodeId(LEN - 1)));
        assert_eq!(sequence.last(), Some(&NodeId(0)));
        assert!(order(&graph).unwrap().construction.is_empty());
    }
}
