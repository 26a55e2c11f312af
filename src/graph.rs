mod builder;
#[cfg(feature = "dot")]
mod dot;

pub use builder::GraphBuilder;

use core::fmt::{self, Display, Formatter};
use std::collections::BTreeMap;

use crate::{
    condition::Verdict,
    declaration::ComponentDeclaration,
    errors::{Diagnostic, ResolveErrorKind},
    identity::Identity,
};

/// Index of an accepted component, equal to its position among the accepted components
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeKind {
    Required,
    /// Optional injection point that found a component
    Optional,
    /// Provider injection, resolved on demand
    Deferred,
}

impl EdgeKind {
    /// Takes part in cycle detection and construction ordering
    #[inline]
    #[must_use]
    pub const fn is_eager(self) -> bool {
        !matches!(self, EdgeKind::Deferred)
    }

    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EdgeKind::Required => "requires",
            EdgeKind::Optional => "optional",
            EdgeKind::Deferred => "provider",
        }
    }
}

/// `dependent -> dependency`, one per resolved injection point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    /// Index of the injection point in the dependent's declaration
    pub point: usize,
    pub kind: EdgeKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved(NodeId),
    /// Optional injection point without a matching component
    Absent,
    /// Missing or ambiguous, reported as a diagnostic
    Unresolved,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) discovery_index: usize,
    pub(crate) declaration: ComponentDeclaration,
}

impl Node {
    #[inline]
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Position of the declaration in the input, rejected declarations included
    #[inline]
    #[must_use]
    pub fn discovery_index(&self) -> usize {
        self.discovery_index
    }

    #[inline]
    #[must_use]
    pub fn declaration(&self) -> &ComponentDeclaration {
        &self.declaration
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Identity {
        self.declaration.identity()
    }
}

/// A declaration excluded by its conditions.
#[derive(Clone, Debug)]
pub struct Rejected {
    pub declaration: ComponentDeclaration,
    pub verdict: Verdict,
}

impl Rejected {
    #[must_use]
    pub fn reason(&self) -> String {
        self.verdict.reason().unwrap_or_default()
    }
}

/// Accepted components and the resolved edges between them.
///
/// Immutable once built and safe to share between threads.
#[derive(Clone, Debug)]
pub struct DependencyGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) outgoing: Vec<Vec<usize>>,
    pub(crate) incoming: Vec<Vec<usize>>,
    pub(crate) resolutions: Vec<Vec<Resolution>>,
    pub(crate) rejected: Vec<Rejected>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    /// Type and interface names to the nodes satisfying them, in discovery order
    pub(crate) type_index: BTreeMap<String, Vec<NodeId>>,
}

impl DependencyGraph {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// # Panics
    /// Panics if `id` doesn't belong to this graph
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges of `id` to its dependencies, in injection point order
    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing[id.0].iter().map(|&idx| &self.edges[idx])
    }

    /// Edges of the dependents of `id`, in dependent discovery order
    pub fn edges_to(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming[id.0].iter().map(|&idx| &self.edges[idx])
    }

    /// Resolution of each injection point of `id`, indexed like its declared dependencies
    #[inline]
    #[must_use]
    pub fn resolutions(&self, id: NodeId) -> &[Resolution] {
        &self.resolutions[id.0]
    }

    #[inline]
    #[must_use]
    pub fn rejected(&self) -> &[Rejected] {
        &self.rejected
    }

    /// Diagnostics gathered while resolving injection points and evaluating conditions
    #[inline]
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Nodes declared with exactly this identity, in discovery order
    #[must_use]
    pub fn find(&self, identity: &Identity) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|node| node.identity() == identity)
            .map(Node::id)
            .collect()
    }

    /// Nodes whose type or implemented interfaces satisfy `type_name`
    #[must_use]
    pub fn candidates(&self, type_name: &str) -> &[NodeId] {
        self.type_index.get(type_name).map_or(&[], Vec::as_slice)
    }

    /// Resolves a requested identity with the same rules as injection points
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoComponent`] when nothing matches
    /// - [`ResolveErrorKind::Ambiguous`] when the tie-break leaves several candidates
    pub fn resolve(&self, identity: &Identity) -> Result<NodeId, ResolveErrorKind> {
        match builder::select(&self.nodes, &self.type_index, identity) {
            builder::Selection::One(id) => Ok(id),
            builder::Selection::Missing { .. } => Err(ResolveErrorKind::NoComponent {
                identity: identity.clone(),
            }),
            builder::Selection::Tied(ids) => Err(ResolveErrorKind::Ambiguous {
                identity: identity.clone(),
                candidates: ids.into_iter().map(|id| self.node(id).identity().clone()).collect(),
            }),
        }
    }

    /// Dependencies of `id`, deduplicated, in injection point order
    #[must_use]
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for edge in self.edges_from(id) {
            if !out.contains(&edge.to) {
                out.push(edge.to);
            }
        }
        out
    }

    /// Dependents of `id`, deduplicated, in discovery order
    #[must_use]
    pub fn dependents_of(&self, id: NodeId) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for edge in self.edges_to(id) {
            if !out.contains(&edge.from) {
                out.push(edge.from);
            }
        }
        out
    }

    /// Nodes nothing depends on
    #[must_use]
    pub fn root_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .map(Node::id)
            .filter(|id| self.incoming[id.0].is_empty())
            .collect()
    }

    /// Nodes without dependencies
    #[must_use]
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .map(Node::id)
            .filter(|id| self.outgoing[id.0].is_empty())
            .collect()
    }
}
