use std::collections::BTreeMap;

use tracing::{debug, info_span, warn};

use super::{DependencyGraph, Edge, EdgeKind, Node, NodeId, Rejected, Resolution};
use crate::{
    condition::{ConditionContext, ConditionEvaluator, Verdict},
    declaration::ComponentDeclaration,
    errors::{Candidate, Diagnostic, DiagnosticKind, NearMiss},
    identity::Identity,
};

/// Outcome of matching a requested identity against the accepted components.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Selection {
    One(NodeId),
    /// Components of the requested type that were filtered out, with the reason
    Missing { near_misses: Vec<(NodeId, String)> },
    /// Candidates left after every tie-break, in discovery order
    Tied(Vec<NodeId>),
}

/// Picks the component satisfying `requested`.
///
/// A requested qualifier is matched against the qualifier and the component name. When nothing
/// matches, unqualified candidates of the type stand in and differently qualified ones are near-misses.
/// Without a qualifier, unqualified candidates are preferred when there are any.
/// Remaining candidates are narrowed to the primary ones, then to the lowest order.
pub(crate) fn select(nodes: &[Node], type_index: &BTreeMap<String, Vec<NodeId>>, requested: &Identity) -> Selection {
    let candidates = type_index.get(&requested.type_name).map_or(&[][..], Vec::as_slice);

    let mut near_misses = Vec::new();
    let mut eligible: Vec<NodeId> = match &requested.qualifier {
        Some(qualifier) => {
            let mut exact = Vec::new();
            let mut unqualified = Vec::new();
            for &id in candidates {
                let declaration = &nodes[id.0].declaration;
                match &declaration.identity().qualifier {
                    Some(actual) if actual == qualifier => exact.push(id),
                    _ if declaration.name() == qualifier => exact.push(id),
                    None => unqualified.push(id),
                    Some(actual) => near_misses.push((id, format!("qualifier \"{actual}\" doesn't match \"{qualifier}\""))),
                }
            }
            if exact.is_empty() {
                unqualified
            } else {
                exact
            }
        }
        None => {
            let unqualified: Vec<NodeId> = candidates
                .iter()
                .copied()
                .filter(|id| nodes[id.0].identity().qualifier.is_none())
                .collect();
            if unqualified.is_empty() {
                candidates.to_vec()
            } else {
                unqualified
            }
        }
    };

    if eligible.is_empty() {
        return Selection::Missing { near_misses };
    }

    if eligible.iter().any(|id| nodes[id.0].declaration.is_primary()) {
        eligible.retain(|id| nodes[id.0].declaration.is_primary());
    }
    if let Some(lowest) = eligible.iter().map(|id| nodes[id.0].declaration.order()).min() {
        eligible.retain(|id| nodes[id.0].declaration.order() == lowest);
    }

    match eligible.as_slice() {
        [id] => Selection::One(*id),
        _ => Selection::Tied(eligible),
    }
}

pub struct GraphBuilder;

impl GraphBuilder {
    /// Filters the declarations through their conditions and resolves every injection point.
    ///
    /// Declarations are evaluated in the given order. Each accepted declaration registers its name,
    /// type and interfaces into `context` before the next one is evaluated.
    /// Nothing here aborts the build: problems are recorded in [`DependencyGraph::diagnostics`]
    /// and [`DependencyGraph::rejected`].
    #[must_use]
    pub fn build(
        declarations: impl IntoIterator<Item = ComponentDeclaration>,
        context: &mut ConditionContext,
    ) -> DependencyGraph {
        let span = info_span!("build");
        let _guard = span.enter();

        let mut nodes = Vec::new();
        let mut rejected = Vec::new();
        let mut diagnostics = Vec::new();

        for (discovery_index, declaration) in declarations.into_iter().enumerate() {
            let verdict = ConditionEvaluator::explain(declaration.identity(), declaration.conditions(), context);
            match verdict {
                Verdict::Accepted => {
                    context.register_bean_name(declaration.name());
                    context.register_bean_type(declaration.identity().type_name.as_str());
                    context.register_bean_interfaces(declaration.implemented_interfaces().iter().cloned());
                    debug!(component = %declaration.identity(), "Accepted");

                    nodes.push(Node {
                        id: NodeId(nodes.len()),
                        discovery_index,
                        declaration,
                    });
                }
                verdict => {
                    if let Verdict::Error { condition, error, .. } = &verdict {
                        diagnostics.push(Diagnostic::warning(DiagnosticKind::ConditionEvaluation {
                            component: declaration.identity().clone(),
                            condition: condition.clone(),
                            message: error.to_string(),
                        }));
                    }
                    debug!(component = %declaration.identity(), reason = ?verdict.reason(), "Rejected");
                    rejected.push(Rejected { declaration, verdict });
                }
            }
        }

        let mut type_index: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
        let mut identity_counts: BTreeMap<&Identity, usize> = BTreeMap::new();
        for node in &nodes {
            let declaration = &node.declaration;
            type_index
                .entry(declaration.identity().type_name.clone())
                .or_default()
                .push(node.id);
            for interface in declaration.implemented_interfaces() {
                let ids = type_index.entry(interface.clone()).or_default();
                if !ids.contains(&node.id) {
                    ids.push(node.id);
                }
            }
            *identity_counts.entry(declaration.identity()).or_default() += 1;
        }
        for (identity, count) in identity_counts {
            if count > 1 {
                let diagnostic = Diagnostic::warning(DiagnosticKind::DuplicateComponent {
                    identity: identity.clone(),
                    count,
                });
                warn!("{}", diagnostic.kind);
                diagnostics.push(diagnostic);
            }
        }

        let mut edges = Vec::new();
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut resolutions = Vec::with_capacity(nodes.len());

        for node in &nodes {
            let declaration = &node.declaration;
            let mut node_resolutions = Vec::with_capacity(declaration.dependencies().len());

            for (point_index, point) in declaration.dependencies().iter().enumerate() {
                let resolution = match select(&nodes, &type_index, point.requested()) {
                    Selection::One(target) => {
                        let kind = if point.is_deferred() {
                            EdgeKind::Deferred
                        } else if point.is_optional() {
                            EdgeKind::Optional
                        } else {
                            EdgeKind::Required
                        };
                        outgoing[node.id.0].push(edges.len());
                        incoming[target.0].push(edges.len());
                        edges.push(Edge {
                            from: node.id,
                            to: target,
                            point: point_index,
                            kind,
                        });
                        Resolution::Resolved(target)
                    }
                    Selection::Missing { .. } if point.is_optional() => {
                        debug!(component = %declaration.identity(), requested = %point.requested(), "Optional dependency absent");
                        Resolution::Absent
                    }
                    Selection::Missing { near_misses } => {
                        let mut near_misses: Vec<NearMiss> = near_misses
                            .into_iter()
                            .map(|(id, reason)| NearMiss {
                                identity: nodes[id.0].identity().clone(),
                                reason,
                            })
                            .collect();
                        near_misses.extend(
                            rejected
                                .iter()
                                .filter(|rejected| rejected.declaration.satisfies(&point.requested().type_name))
                                .map(|rejected| NearMiss {
                                    identity: rejected.declaration.identity().clone(),
                                    reason: format!("excluded by its conditions: {}", rejected.reason()),
                                }),
                        );
                        let diagnostic = Diagnostic::error(DiagnosticKind::MissingDependency {
                            requester: declaration.identity().clone(),
                            site: point.site().clone(),
                            requested: point.requested().clone(),
                            near_misses,
                        });
                        debug!("{}", diagnostic.kind);
                        diagnostics.push(diagnostic);
                        Resolution::Unresolved
                    }
                    Selection::Tied(tied) => {
                        let diagnostic = Diagnostic::error(DiagnosticKind::AmbiguousDependency {
                            requester: declaration.identity().clone(),
                            site: point.site().clone(),
                            requested: point.requested().clone(),
                            candidates: tied
                                .into_iter()
                                .map(|id| {
                                    let candidate = &nodes[id.0].declaration;
                                    Candidate {
                                        identity: candidate.identity().clone(),
                                        order: candidate.order(),
                                        primary: candidate.is_primary(),
                                    }
                                })
                                .collect(),
                        });
                        debug!("{}", diagnostic.kind);
                        diagnostics.push(diagnostic);
                        Resolution::Unresolved
                    }
                };
                node_resolutions.push(resolution);
            }
            resolutions.push(node_resolutions);
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            rejected = rejected.len(),
            diagnostics = diagnostics.len(),
            "Graph built"
        );

        DependencyGraph {
            nodes,
            edges,
            outgoing,
            incoming,
            resolutions,
            rejected,
            diagnostics,
            type_index,
        }
    }
}
