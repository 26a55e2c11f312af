use core::fmt::{self, Display, Formatter};
use std::collections::BTreeSet;

use tracing::{debug, error, info_span, warn};

use crate::{
    errors::{Diagnostic, DiagnosticKind},
    graph::{DependencyGraph, NodeId},
    scope::Scope,
};

/// Every problem found in a graph, split by severity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl ValidationReport {
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.errors.push(diagnostic);
        } else {
            self.warnings.push(diagnostic);
        }
    }

    /// # Errors
    /// Returns the whole report when it holds at least one error
    pub fn into_result(self) -> Result<Vec<Diagnostic>, Self> {
        if self.is_valid() {
            Ok(self.warnings)
        } else {
            Err(self)
        }
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} error(s), {} warning(s)", self.errors.len(), self.warnings.len())?;
        for diagnostic in self.errors.iter().chain(&self.warnings) {
            write!(f, "\n{diagnostic}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

struct CycleFinder<'a> {
    graph: &'a DependencyGraph,
    colors: Vec<Color>,
    stack: Vec<NodeId>,
    /// Rotated so the smallest node comes first
    cycles: BTreeSet<Vec<NodeId>>,
    found: Vec<Vec<NodeId>>,
}

impl CycleFinder<'_> {
    /// Depth-first walk from `root` with an explicit stack of outgoing edge iterators
    fn dfs_visit(&mut self, root: NodeId) {
        let graph = self.graph;
        self.colors[root.0] = Color::Gray;
        self.stack.push(root);
        let mut frames = vec![graph.edges_from(root)];

        while let Some(edges) = frames.last_mut() {
            let Some(edge) = edges.next() else {
                frames.pop();
                if let Some(id) = self.stack.pop() {
                    self.colors[id.0] = Color::Black;
                }
                continue;
            };
            if !edge.kind.is_eager() {
                continue;
            }
            match self.colors[edge.to.0] {
                Color::White => {
                    self.colors[edge.to.0] = Color::Gray;
                    self.stack.push(edge.to);
                    frames.push(graph.edges_from(edge.to));
                }
                Color::Gray => self.record(edge.to),
                Color::Black => {}
            }
        }
    }

    fn record(&mut self, entry: NodeId) {
        let Some(start) = self.stack.iter().position(|id| *id == entry) else {
            return;
        };
        let cycle = &self.stack[start..];

        let min = cycle
            .iter()
            .enumerate()
            .min_by_key(|(_, id)| **id)
            .map_or(0, |(idx, _)| idx);
        let mut canonical = cycle[min..].to_vec();
        canonical.extend_from_slice(&cycle[..min]);

        if self.cycles.insert(canonical) {
            let mut path = cycle.to_vec();
            path.push(entry);
            self.found.push(path);
        }
    }
}

/// Cycles among eager edges, each as a path starting and ending at the same node, in discovery order
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Vec<NodeId>> {
    let mut finder = CycleFinder {
        graph,
        colors: vec![Color::White; graph.len()],
        stack: Vec::new(),
        cycles: BTreeSet::new(),
        found: Vec::new(),
    };
    for node in graph.nodes() {
        if finder.colors[node.id().0] == Color::White {
            finder.dfs_visit(node.id());
        }
    }
    finder.found
}

/// Collects every problem of the graph in one report: the diagnostics gathered by the builder,
/// every cycle among eager edges and the scope conflicts.
#[must_use]
pub fn validate(graph: &DependencyGraph) -> ValidationReport {
    let span = info_span!("validate", nodes = graph.len());
    let _guard = span.enter();

    let mut report = ValidationReport::default();
    for diagnostic in graph.diagnostics() {
        report.push(diagnostic.clone());
    }

    for path in find_cycles(graph) {
        report.push(Diagnostic::error(DiagnosticKind::CyclicDependency {
            path: path.into_iter().map(|id| graph.node(id).identity().clone()).collect(),
        }));
    }

    for edge in graph.edges() {
        if !edge.kind.is_eager() {
            continue;
        }
        let dependent = graph.node(edge.from).declaration();
        let dependency = graph.node(edge.to).declaration();

        match (dependent.scope(), dependency.scope()) {
            (dependent_scope, Scope::Prototype) if dependent_scope.is_cached() => {
                report.push(Diagnostic::warning(DiagnosticKind::ScopeWidening {
                    dependent: dependent.identity().clone(),
                    dependent_scope,
                    dependency: dependency.identity().clone(),
                }));
            }
            (Scope::Singleton, Scope::LazySingleton) => {
                report.push(Diagnostic::warning(DiagnosticKind::LazyForcedEager {
                    dependent: dependent.identity().clone(),
                    dependency: dependency.identity().clone(),
                }));
            }
            _ => {}
        }
    }

    for diagnostic in &report.warnings {
        warn!("{}", diagnostic.kind);
    }
    for diagnostic in &report.errors {
        error!("{}", diagnostic.kind);
    }
    debug!(errors = report.errors.len(), warnings = report.warnings.len(), "Validated");

    report
}
