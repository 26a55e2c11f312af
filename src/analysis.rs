use tracing::{debug, error, info_span};

use crate::{
    codegen::FactoryPlan,
    condition::ConditionContext,
    declaration::ComponentDeclaration,
    dependency::InjectionSite,
    errors::{Diagnostic, DiagnosticKind, OrderErrorKind},
    graph::{DependencyGraph, GraphBuilder, NodeId, Rejected},
    identity::Identity,
    orderer::{self, ConstructionOrder},
    validator::{self, ValidationReport},
};

/// Injection point the generated code can't reach without a synthesized accessor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntheticAccessor {
    pub component: Identity,
    pub site: InjectionSite,
    pub requested: Identity,
}

/// A validated graph with its construction and destruction orders.
#[derive(Clone, Debug)]
pub struct Plan {
    graph: DependencyGraph,
    order: ConstructionOrder,
    warnings: Vec<Diagnostic>,
}

impl Plan {
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> &ConstructionOrder {
        &self.order
    }

    #[inline]
    #[must_use]
    pub fn construction_order(&self) -> &[NodeId] {
        &self.order.construction
    }

    #[inline]
    #[must_use]
    pub fn destruction_order(&self) -> &[NodeId] {
        &self.order.destruction
    }

    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    #[inline]
    #[must_use]
    pub fn rejected(&self) -> &[Rejected] {
        self.graph.rejected()
    }

    /// Per-request construction sequence of a prototype, see [`orderer::site_order`]
    #[inline]
    #[must_use]
    pub fn site_order(&self, id: NodeId) -> Vec<NodeId> {
        orderer::site_order(&self.graph, id)
    }

    /// Private fields and setters that need an accessor synthesized, in discovery order
    #[must_use]
    pub fn synthetic_accessors(&self) -> Vec<SyntheticAccessor> {
        self.graph
            .nodes()
            .iter()
            .flat_map(|node| {
                node.declaration()
                    .dependencies()
                    .iter()
                    .filter(|point| point.requires_synthetic_accessor())
                    .map(move |point| SyntheticAccessor {
                        component: node.identity().clone(),
                        site: point.site().clone(),
                        requested: point.requested().clone(),
                    })
            })
            .collect()
    }

    #[must_use]
    pub fn factories(&self) -> FactoryPlan<'_> {
        FactoryPlan::new(&self.graph, &self.order)
    }
}

/// Builds, validates and orders the graph in one go.
///
/// # Errors
/// Returns the full report when validation finds at least one error
pub fn analyze(
    declarations: impl IntoIterator<Item = ComponentDeclaration>,
    context: &mut ConditionContext,
) -> Result<Plan, ValidationReport> {
    let span = info_span!("analyze");
    let _guard = span.enter();

    let graph = GraphBuilder::build(declarations, context);
    let warnings = validator::validate(&graph).into_result()?;

    let order = match orderer::order(&graph) {
        Ok(order) => order,
        Err(OrderErrorKind::Cycle { remaining }) => {
            error!("Graph passed validation but couldn't be ordered");
            return Err(ValidationReport {
                errors: vec![Diagnostic::error(DiagnosticKind::CyclicDependency { path: remaining })],
                warnings,
            });
        }
    };
    debug!(
        components = graph.len(),
        rejected = graph.rejected().len(),
        warnings = warnings.len(),
        "Plan ready"
    );

    Ok(Plan { graph, order, warnings })
}
