use core::fmt;

/// Sharing policy of a component's instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum Scope {
    /// One instance per container, built eagerly at its position in the construction order.
    #[default]
    Singleton,
    /// A fresh instance per request, never cached.
    Prototype,
    /// One instance per container, built on first access.
    LazySingleton,
}

impl Scope {
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Prototype => "prototype",
            Scope::LazySingleton => "lazy-singleton",
        }
    }

    /// Built during container startup
    #[inline]
    #[must_use]
    pub const fn is_eager(self) -> bool {
        matches!(self, Scope::Singleton)
    }

    /// Holds at most one instance and takes a position in the construction order
    #[inline]
    #[must_use]
    pub const fn is_cached(self) -> bool {
        matches!(self, Scope::Singleton | Scope::LazySingleton)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::Scope::{self, *};

    #[test]
    fn test_scope_flags() {
        assert!(Singleton.is_eager());
        assert!(!LazySingleton.is_eager());
        assert!(!Prototype.is_eager());

        assert!(Singleton.is_cached());
        assert!(LazySingleton.is_cached());
        assert!(!Prototype.is_cached());

        assert_eq!(Scope::default(), Singleton);
        assert_eq!(LazySingleton.to_string(), "lazy-singleton");
    }
}
