use core::fmt::{self, Display, Formatter};

use crate::{
    dependency::InjectionSite,
    graph::{DependencyGraph, NodeId, Resolution},
    identity::Identity,
    orderer::ConstructionOrder,
    scope::Scope,
};

/// Value passed for one injection point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argument {
    /// Direct accessor call to the dependency
    Component(NodeId),
    /// Handle resolving the dependency on demand
    Provider(NodeId),
    /// Optional injection point without a matching component
    Absent,
}

/// Construction recipe of one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factory {
    pub node: NodeId,
    pub identity: Identity,
    pub scope: Scope,
    /// One per injection point, in declaration order
    pub arguments: Vec<(InjectionSite, Argument)>,
    pub post_construct: Option<String>,
    pub pre_destroy: Option<String>,
}

impl Factory {
    pub fn constructor_arguments(&self) -> impl Iterator<Item = Argument> + '_ {
        self.arguments
            .iter()
            .filter(|(site, _)| matches!(site, InjectionSite::Constructor { .. }))
            .map(|(_, argument)| *argument)
    }
}

/// Everything a generator needs to emit straight-line accessors:
/// one factory per component, cached components in construction order, then prototypes in discovery order.
#[derive(Clone, Debug)]
pub struct FactoryPlan<'g> {
    graph: &'g DependencyGraph,
    factories: Vec<Factory>,
}

impl<'g> FactoryPlan<'g> {
    pub(crate) fn new(graph: &'g DependencyGraph, order: &ConstructionOrder) -> Self {
        let prototypes = graph
            .nodes()
            .iter()
            .filter(|node| node.declaration().scope() == Scope::Prototype)
            .map(|node| node.id());

        let factories = order
            .construction
            .iter()
            .copied()
            .chain(prototypes)
            .map(|id| {
                let declaration = graph.node(id).declaration();
                let arguments = declaration
                    .dependencies()
                    .iter()
                    .zip(graph.resolutions(id))
                    .map(|(point, resolution)| {
                        let argument = match *resolution {
                            Resolution::Resolved(target) if point.is_deferred() => Argument::Provider(target),
                            Resolution::Resolved(target) => Argument::Component(target),
                            // Validated graphs have no unresolved points
                            Resolution::Absent | Resolution::Unresolved => Argument::Absent,
                        };
                        (point.site().clone(), argument)
                    })
                    .collect();

                Factory {
                    node: id,
                    identity: declaration.identity().clone(),
                    scope: declaration.scope(),
                    arguments,
                    post_construct: declaration.post_construct_hook().map(ToOwned::to_owned),
                    pre_destroy: declaration.pre_destroy_hook().map(ToOwned::to_owned),
                }
            })
            .collect();

        Self { graph, factories }
    }

    #[inline]
    #[must_use]
    pub fn factories(&self) -> &[Factory] {
        &self.factories
    }

    #[must_use]
    pub fn factory(&self, id: NodeId) -> Option<&Factory> {
        self.factories.iter().find(|factory| factory.node == id)
    }

    fn write_argument(&self, f: &mut Formatter<'_>, argument: Argument) -> fmt::Result {
        match argument {
            Argument::Component(id) => write!(f, "{}", self.graph.node(id).identity()),
            Argument::Provider(id) => write!(f, "provider({})", self.graph.node(id).identity()),
            Argument::Absent => f.write_str("none"),
        }
    }
}

impl Display for FactoryPlan<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (idx, factory) in self.factories.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{} {} = new(", factory.scope, factory.identity)?;
            for (idx, argument) in factory.constructor_arguments().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                self.write_argument(f, argument)?;
            }
            f.write_str(")")?;

            let mut setters: Vec<(&str, Vec<(usize, Argument)>)> = Vec::new();
            for (site, argument) in &factory.arguments {
                match site {
                    InjectionSite::Constructor { .. } => {}
                    InjectionSite::Field { name } => {
                        write!(f, "\n    .{name} = ")?;
                        self.write_argument(f, *argument)?;
                    }
                    InjectionSite::Setter { method, position } => {
                        match setters.iter_mut().find(|(name, _)| *name == method.as_str()) {
                            Some((_, params)) => params.push((*position, *argument)),
                            None => setters.push((method.as_str(), vec![(*position, *argument)])),
                        }
                    }
                }
            }
            for (method, mut params) in setters {
                params.sort_by_key(|(position, _)| *position);
                write!(f, "\n    .{method}(")?;
                for (idx, (_, argument)) in params.into_iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    self.write_argument(f, argument)?;
                }
                f.write_str(")")?;
            }

            if let Some(hook) = &factory.post_construct {
                write!(f, "\n    post_construct {hook}")?;
            }
            if let Some(hook) = &factory.pre_destroy {
                write!(f, "\n    pre_destroy {hook}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Argument;
    use crate::{
        analysis::analyze,
        condition::ConditionContext,
        declaration::ComponentDeclaration,
        dependency::InjectionPoint,
        graph::NodeId,
        identity::Identity,
        scope::Scope,
    };

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    #[test]
    fn test_factory_plan() {
        let plan = analyze(
            vec![
                ComponentDeclaration::new(id("Service"))
                    .constructor_arg(id("Repository"))
                    .dependency(InjectionPoint::field("audit", id("Audit")).optional())
                    .dependency(InjectionPoint::setter("configure", 1, id("Clock")).deferred())
                    .dependency(InjectionPoint::setter("configure", 0, id("Logger")))
                    .post_construct("init")
                    .pre_destroy("close"),
                ComponentDeclaration::new(id("Repository")).constructor_arg(id("Logger")),
                ComponentDeclaration::new(id("Logger")),
                ComponentDeclaration::new(id("Clock")).in_scope(Scope::Prototype),
            ],
            &mut ConditionContext::new(),
        )
        .unwrap();
        let factories = plan.factories();

        let nodes: Vec<NodeId> = factories.factories().iter().map(|factory| factory.node).collect();
        assert_eq!(nodes, vec![NodeId(2), NodeId(1), NodeId(0), NodeId(3)]);

        let service = factories.factory(NodeId(0)).unwrap();
        assert_eq!(
            service.arguments.iter().map(|(_, argument)| *argument).collect::<Vec<_>>(),
            vec![
                Argument::Component(NodeId(1)),
                Argument::Absent,
                Argument::Provider(NodeId(3)),
                Argument::Component(NodeId(2))
            ]
        );

        assert_eq!(
            factories.to_string(),
            "singleton Logger = new()\n\
             singleton Repository = new(Logger)\n\
             singleton Service = new(Repository)\n    \
             .audit = none\n    \
             .configure(Logger, provider(Clock))\n    \
             post_construct init\n    \
             pre_destroy close\n\
             prototype Clock = new()"
        );
    }
}
