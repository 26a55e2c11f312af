use core::fmt::{self, Display, Formatter};

use crate::identity::Identity;

/// Where a dependency enters its dependent.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InjectionSite {
    Constructor { position: usize },
    Field { name: String },
    Setter { method: String, position: usize },
}

impl Display for InjectionSite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            InjectionSite::Constructor { position } => write!(f, "constructor parameter #{position}"),
            InjectionSite::Field { name } => write!(f, "field `{name}`"),
            InjectionSite::Setter { method, position } => write!(f, "parameter #{position} of `{method}`"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Visibility {
    #[default]
    Public,
    /// Not reachable from generated code without a synthetic accessor.
    Private,
}

/// A single dependency requirement of a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionPoint {
    pub(crate) site: InjectionSite,
    pub(crate) requested: Identity,
    pub(crate) optional: bool,
    pub(crate) deferred: bool,
    pub(crate) visibility: Visibility,
}

impl InjectionPoint {
    #[inline]
    #[must_use]
    pub fn new(site: InjectionSite, requested: Identity) -> Self {
        Self {
            site,
            requested,
            optional: false,
            deferred: false,
            visibility: Visibility::Public,
        }
    }

    #[inline]
    #[must_use]
    pub fn constructor(position: usize, requested: Identity) -> Self {
        Self::new(InjectionSite::Constructor { position }, requested)
    }

    #[inline]
    #[must_use]
    pub fn field(name: impl Into<String>, requested: Identity) -> Self {
        Self::new(InjectionSite::Field { name: name.into() }, requested)
    }

    #[inline]
    #[must_use]
    pub fn setter(method: impl Into<String>, position: usize, requested: Identity) -> Self {
        Self::new(
            InjectionSite::Setter {
                method: method.into(),
                position,
            },
            requested,
        )
    }

    /// Resolves to nothing instead of failing when no component matches
    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Injects a provider resolved on demand instead of the instance itself.
    /// Deferred edges don't take part in cycle detection or construction ordering.
    #[inline]
    #[must_use]
    pub fn deferred(mut self) -> Self {
        self.deferred = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    #[inline]
    #[must_use]
    pub fn site(&self) -> &InjectionSite {
        &self.site
    }

    #[inline]
    #[must_use]
    pub fn requested(&self) -> &Identity {
        &self.requested
    }

    #[inline]
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    #[inline]
    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    #[inline]
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Private fields and setters need an accessor synthesized by the weaving step.
    /// Constructor parameters are always reachable.
    #[inline]
    #[must_use]
    pub fn requires_synthetic_accessor(&self) -> bool {
        self.visibility == Visibility::Private && !matches!(self.site, InjectionSite::Constructor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::{InjectionPoint, InjectionSite};
    use crate::identity::Identity;

    #[test]
    fn test_synthetic_accessor() {
        let logger = Identity::new("Logger");

        assert!(!InjectionPoint::field("logger", logger.clone()).requires_synthetic_accessor());
        assert!(InjectionPoint::field("logger", logger.clone())
            .private()
            .requires_synthetic_accessor());
        assert!(InjectionPoint::setter("set_logger", 0, logger.clone())
            .private()
            .requires_synthetic_accessor());
        assert!(!InjectionPoint::constructor(0, logger).private().requires_synthetic_accessor());
    }

    #[test]
    fn test_site_display() {
        assert_eq!(InjectionSite::Constructor { position: 1 }.to_string(), "constructor parameter #1");
        assert_eq!(
            InjectionSite::Setter {
                method: "set_repo".into(),
                position: 0
            }
            .to_string(),
            "parameter #0 of `set_repo`"
        );
    }
}
