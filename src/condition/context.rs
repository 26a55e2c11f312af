use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{Config, Properties, PropertySource};

/// Capability to test whether a type is available to the analysed program.
pub trait ClassProbe {
    #[must_use]
    fn is_present(&self, type_name: &str) -> bool;
}

impl<F> ClassProbe for F
where
    F: Fn(&str) -> bool,
{
    #[inline]
    fn is_present(&self, type_name: &str) -> bool {
        self(type_name)
    }
}

/// Fixed set of available type names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownTypes(BTreeSet<String>);

impl KnownTypes {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, type_name: impl Into<String>) -> Self {
        self.0.insert(type_name.into());
        self
    }
}

impl<S: Into<String>> FromIterator<S> for KnownTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl ClassProbe for KnownTypes {
    #[inline]
    fn is_present(&self, type_name: &str) -> bool {
        self.0.contains(type_name)
    }
}

/// State conditions are evaluated against.
///
/// The registered names and types grow while the graph is built, in discovery order,
/// so a condition only sees the components accepted before its own component.
pub struct ConditionContext {
    active_profiles: BTreeSet<String>,
    default_profile: String,
    registered_bean_names: BTreeSet<String>,
    registered_bean_types: BTreeSet<String>,
    properties: Box<dyn PropertySource + Send + Sync>,
    class_probe: Box<dyn ClassProbe + Send + Sync>,
}

impl Default for ConditionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionContext {
    /// Context without properties or known types, profiles default to [`Config::default_profile`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[inline]
    #[must_use]
    pub fn builder() -> ConditionContextBuilder {
        ConditionContextBuilder::default()
    }

    #[inline]
    pub fn register_bean_name(&mut self, name: impl Into<String>) {
        self.registered_bean_names.insert(name.into());
    }

    #[inline]
    pub fn register_bean_type(&mut self, type_name: impl Into<String>) {
        self.registered_bean_types.insert(type_name.into());
    }

    pub fn register_bean_interfaces<I, S>(&mut self, interfaces: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registered_bean_types.extend(interfaces.into_iter().map(Into::into));
    }

    #[inline]
    #[must_use]
    pub fn contains_bean_name(&self, name: &str) -> bool {
        self.registered_bean_names.contains(name)
    }

    #[inline]
    #[must_use]
    pub fn contains_bean_type(&self, type_name: &str) -> bool {
        self.registered_bean_types.contains(type_name)
    }

    #[inline]
    #[must_use]
    pub fn registered_bean_names(&self) -> &BTreeSet<String> {
        &self.registered_bean_names
    }

    #[inline]
    #[must_use]
    pub fn registered_bean_types(&self) -> &BTreeSet<String> {
        &self.registered_bean_types
    }

    /// See [`PropertySource::property`] for the lookup order
    #[inline]
    #[must_use]
    pub fn property(&self, name: &str) -> Option<String> {
        self.properties.property(name)
    }

    #[inline]
    #[must_use]
    pub fn is_class_present(&self, type_name: &str) -> bool {
        self.class_probe.is_present(type_name)
    }

    #[inline]
    #[must_use]
    pub fn active_profiles(&self) -> &BTreeSet<String> {
        &self.active_profiles
    }

    #[inline]
    #[must_use]
    pub fn is_profile_active(&self, profile: &str) -> bool {
        self.active_profiles.contains(profile)
    }

    #[inline]
    #[must_use]
    pub fn is_default_profile_active(&self) -> bool {
        self.active_profiles.contains(&self.default_profile)
    }
}

#[derive(Default)]
pub struct ConditionContextBuilder {
    config: Config,
    profiles: Option<BTreeSet<String>>,
    properties: Option<Box<dyn PropertySource + Send + Sync>>,
    class_probe: Option<Box<dyn ClassProbe + Send + Sync>>,
}

impl ConditionContextBuilder {
    #[inline]
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the active profiles explicitly instead of reading them from the properties
    #[must_use]
    pub fn profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = Some(profiles.into_iter().map(Into::into).collect());
        self
    }

    #[inline]
    #[must_use]
    pub fn properties(mut self, properties: impl PropertySource + Send + Sync + 'static) -> Self {
        self.properties = Some(Box::new(properties));
        self
    }

    #[inline]
    #[must_use]
    pub fn class_probe(mut self, class_probe: impl ClassProbe + Send + Sync + 'static) -> Self {
        self.class_probe = Some(Box::new(class_probe));
        self
    }

    #[must_use]
    pub fn build(self) -> ConditionContext {
        let properties = self.properties.unwrap_or_else(|| Box::new(Properties::new()));
        let class_probe = self.class_probe.unwrap_or_else(|| Box::new(KnownTypes::new()));

        let mut active_profiles = match self.profiles {
            Some(profiles) => profiles
                .into_iter()
                .map(|profile| profile.trim().to_owned())
                .filter(|profile| !profile.is_empty())
                .collect(),
            None => resolve_active_profiles(&self.config, properties.as_ref()),
        };
        if active_profiles.is_empty() {
            active_profiles.insert(self.config.default_profile.clone());
        }
        debug!(?active_profiles, "Active profiles resolved");

        ConditionContext {
            active_profiles,
            default_profile: self.config.default_profile,
            registered_bean_names: BTreeSet::new(),
            registered_bean_types: BTreeSet::new(),
            properties,
            class_probe,
        }
    }
}

fn resolve_active_profiles(config: &Config, properties: &(dyn PropertySource + Send + Sync)) -> BTreeSet<String> {
    let value = properties
        .system_property(&config.profiles_property)
        .filter(|value| !value.is_empty())
        .or_else(|| properties.env_var(&config.profiles_env));

    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|profile| !profile.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ConditionContext, KnownTypes};
    use crate::config::{Config, Properties};

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_default_profile() {
        let context = ConditionContext::new();
        assert!(context.is_default_profile_active());
        assert_eq!(context.active_profiles().len(), 1);
    }

    #[test]
    #[traced_test]
    fn test_profiles_from_system_property() {
        let context = ConditionContext::builder()
            .properties(
                Properties::new()
                    .with_system("froodi.profiles.active", " dev, test ,,")
                    .with_env("FROODI_PROFILES_ACTIVE", "prod"),
            )
            .build();

        assert!(context.is_profile_active("dev"));
        assert!(context.is_profile_active("test"));
        assert!(!context.is_profile_active("prod"));
        assert!(!context.is_default_profile_active());
    }

    #[test]
    #[traced_test]
    fn test_profiles_from_env() {
        let context = ConditionContext::builder()
            .properties(Properties::new().with_env("FROODI_PROFILES_ACTIVE", "prod"))
            .build();

        assert!(context.is_profile_active("prod"));
    }

    #[test]
    #[traced_test]
    fn test_profiles_are_case_sensitive() {
        let context = ConditionContext::builder().profiles(["Prod"]).build();

        assert!(context.is_profile_active("Prod"));
        assert!(!context.is_profile_active("prod"));
    }

    #[test]
    #[traced_test]
    fn test_custom_config_keys() {
        let config = Config {
            profiles_property: "app.profiles".into(),
            profiles_env: "APP_PROFILES".into(),
            default_profile: "local".into(),
        };
        let context = ConditionContext::builder().config(config.clone()).build();
        assert!(context.is_profile_active("local"));

        let context = ConditionContext::builder()
            .config(config)
            .properties(Properties::new().with_env("APP_PROFILES", "ci"))
            .build();
        assert!(context.is_profile_active("ci"));
        assert!(!context.is_default_profile_active());
    }

    #[test]
    fn test_registration() {
        let mut context = ConditionContext::builder()
            .class_probe(KnownTypes::new().with("serde::Serialize"))
            .build();

        context.register_bean_name("logger");
        context.register_bean_type("app::Logger");
        context.register_bean_interfaces(["app::Log", "app::Sink"]);

        assert!(context.contains_bean_name("logger"));
        assert!(context.contains_bean_type("app::Logger"));
        assert!(context.contains_bean_type("app::Sink"));
        assert!(!context.contains_bean_type("app::Repo"));
        assert!(context.is_class_present("serde::Serialize"));
        assert!(!context.is_class_present("tokio::Runtime"));
    }
}
