use std::collections::BTreeMap;

/// Config for the analysis run
/// ## Fields
/// - `profiles_property`:
///   Key looked up in the system store to find the active profiles (comma-separated).
/// - `profiles_env`:
///   Key looked up in the environment store when the system store has no profiles.
/// - `default_profile`:
///   Profile considered active when neither source names one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub profiles_property: String,
    pub profiles_env: String,
    pub default_profile: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles_property: "froodi.profiles.active".to_owned(),
            profiles_env: "FROODI_PROFILES_ACTIVE".to_owned(),
            default_profile: "default".to_owned(),
        }
    }
}

/// Lookup capability over the two stores conditions read from.
pub trait PropertySource {
    #[must_use]
    fn system_property(&self, name: &str) -> Option<String>;

    #[must_use]
    fn env_var(&self, name: &str) -> Option<String>;

    /// System store first, then the environment store, then the environment store
    /// with the name transformed to `UPPER_UNDERSCORE` form.
    #[must_use]
    fn property(&self, name: &str) -> Option<String> {
        if let Some(value) = self.system_property(name) {
            return Some(value);
        }
        if let Some(value) = self.env_var(name) {
            return Some(value);
        }
        self.env_var(&env_name(name))
    }
}

#[must_use]
pub(crate) fn env_name(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '.' | '-' => '_',
            ch => ch.to_ascii_uppercase(),
        })
        .collect()
}

/// In-memory property stores.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    system: BTreeMap<String, String>,
    env: BTreeMap<String, String>,
}

impl Properties {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty system store, environment store filled from the current process.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            system: BTreeMap::new(),
            env: std::env::vars().collect(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_system(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.system.insert(name.into(), value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn set_system(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.system.insert(name.into(), value.into())
    }
}

impl PropertySource for Properties {
    #[inline]
    fn system_property(&self, name: &str) -> Option<String> {
        self.system.get(name).cloned()
    }

    #[inline]
    fn env_var(&self, name: &str) -> Option<String> {
        self.env.get(name).cloned()
    }
}
