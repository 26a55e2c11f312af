pub(crate) mod analysis;
pub(crate) mod cache;
pub(crate) mod codegen;
pub(crate) mod config;
pub(crate) mod container;
pub(crate) mod declaration;
pub(crate) mod dependency;
pub(crate) mod errors;
pub(crate) mod finalizer;
pub(crate) mod graph;
pub(crate) mod identity;
pub(crate) mod initializer;
pub(crate) mod instantiator;
pub(crate) mod lifecycle;
pub(crate) mod orderer;
pub(crate) mod provider;
pub(crate) mod registry;
pub(crate) mod scope;
pub(crate) mod service;
pub(crate) mod validator;

pub mod condition;

pub use analysis::{analyze, Plan, SyntheticAccessor};
pub use cache::clear_thread_caches;
pub use codegen::{Argument, Factory, FactoryPlan};
pub use config::{Config, Properties, PropertySource};
pub use container::Container;
pub use declaration::ComponentDeclaration;
pub use dependency::{InjectionPoint, InjectionSite, Visibility};
pub use errors::{
    Candidate, CloseErrorKind, ConditionErrorKind, ConstructionErrorKind, DestructionFailure, Diagnostic,
    DiagnosticKind, InstantiateErrorKind, NearMiss, OrderErrorKind, RegistryErrorKind, ResolveErrorKind, Severity,
};
pub use finalizer::Finalizer;
pub use graph::{DependencyGraph, Edge, EdgeKind, GraphBuilder, Node, NodeId, Rejected, Resolution};
pub use identity::Identity;
pub use initializer::PostConstruct;
pub use instantiator::{instance, Arg, Args, Instantiator};
pub use lifecycle::{Instance, LifecycleState};
pub use orderer::{order, site_order, ConstructionOrder};
pub use provider::Provider;
pub use registry::RegistryBuilder;
pub use scope::Scope;
pub use validator::{find_cycles, validate, ValidationReport};
