use core::{any::type_name, fmt};

/// Binding target of a component: its type name plus an optional qualifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity {
    pub type_name: String,
    pub qualifier: Option<String>,
}

impl Identity {
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualifier: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn qualified(type_name: impl Into<String>, qualifier: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            qualifier: Some(qualifier.into()),
        }
    }

    /// Identity of a Rust type, named after [`core::any::type_name`].
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(type_name::<T>())
    }

    #[inline]
    #[must_use]
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &str {
        short_type_name(&self.type_name)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} (qualifier \"{qualifier}\")", self.type_name),
            None => f.write_str(&self.type_name),
        }
    }
}

/// Last path segment of a type name, ignoring generic arguments.
#[must_use]
pub(crate) fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split_once('<').map_or(type_name, |(base, _)| base);
    let start = base.rfind("::").map_or(0, |idx| idx + 2);
    let start = base[start..].rfind('.').map_or(start, |idx| start + idx + 1);
    let start = base[start..].rfind('$').map_or(start, |idx| start + idx + 1);
    &type_name[start..]
}
