use std::{collections::BTreeSet, sync::Arc};

use crate::{
    condition::{Condition, SharedCondition},
    dependency::InjectionPoint,
    identity::Identity,
    scope::Scope,
};

/// A discovered injectable type, as handed over by the discovery step.
///
/// Immutable once passed to [`crate::GraphBuilder::build`].
#[derive(Clone, Debug)]
pub struct ComponentDeclaration {
    identity: Identity,
    name: String,
    scope: Scope,
    dependencies: Vec<InjectionPoint>,
    conditions: Vec<SharedCondition>,
    order: i32,
    primary: bool,
    implemented_interfaces: BTreeSet<String>,
    post_construct: Option<String>,
    pre_destroy: Option<String>,
}

impl ComponentDeclaration {
    /// Singleton with no dependencies or conditions, named after its qualifier
    /// or its lower-camel short type name
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        let name = identity
            .qualifier
            .clone()
            .unwrap_or_else(|| decapitalize(identity.short_name()));
        Self {
            identity,
            name,
            scope: Scope::Singleton,
            dependencies: Vec::new(),
            conditions: Vec::new(),
            order: 0,
            primary: false,
            implemented_interfaces: BTreeSet::new(),
            post_construct: None,
            pre_destroy: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(Identity::of::<T>())
    }

    #[inline]
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    #[inline]
    #[must_use]
    pub fn dependency(mut self, point: InjectionPoint) -> Self {
        self.dependencies.push(point);
        self
    }

    /// Appends a constructor parameter at the next position
    #[inline]
    #[must_use]
    pub fn constructor_arg(self, requested: Identity) -> Self {
        let position = self.dependencies.len();
        self.dependency(InjectionPoint::constructor(position, requested))
    }

    #[inline]
    #[must_use]
    pub fn condition(mut self, condition: impl Condition + 'static) -> Self {
        self.conditions.push(Arc::new(condition));
        self
    }

    #[inline]
    #[must_use]
    pub fn shared_condition(mut self, condition: SharedCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    #[inline]
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.implemented_interfaces.insert(interface.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn post_construct(mut self, method: impl Into<String>) -> Self {
        self.post_construct = Some(method.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn pre_destroy(mut self, method: impl Into<String>) -> Self {
        self.pre_destroy = Some(method.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    #[inline]
    #[must_use]
    pub fn dependencies(&self) -> &[InjectionPoint] {
        &self.dependencies
    }

    #[inline]
    #[must_use]
    pub fn conditions(&self) -> &[SharedCondition] {
        &self.conditions
    }

    #[inline]
    #[must_use]
    pub fn order(&self) -> i32 {
        self.order
    }

    #[inline]
    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    #[inline]
    #[must_use]
    pub fn implemented_interfaces(&self) -> &BTreeSet<String> {
        &self.implemented_interfaces
    }

    #[inline]
    #[must_use]
    pub fn post_construct_hook(&self) -> Option<&str> {
        self.post_construct.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn pre_destroy_hook(&self) -> Option<&str> {
        self.pre_destroy.as_deref()
    }

    /// Own type or one of the implemented interfaces
    #[inline]
    #[must_use]
    pub fn satisfies(&self, type_name: &str) -> bool {
        self.identity.type_name == type_name || self.implemented_interfaces.contains(type_name)
    }
}

/// `Logger` -> `logger`, acronyms like `URLResolver` stay as they are
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => name.to_owned(),
        (Some(first), _) => first.to_lowercase().chain(name[first.len_utf8()..].chars()).collect(),
        (None, _) => String::new(),
    }
}
