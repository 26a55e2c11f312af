use super::{Condition, ConditionContext, MatchStrategy};
use crate::errors::ConditionErrorKind;

/// Matches when none of the referenced components has been registered yet.
///
/// Only components accepted earlier in discovery order are visible.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MissingBeanCondition {
    types: Vec<String>,
    names: Vec<String>,
}

impl MissingBeanCondition {
    #[must_use]
    pub fn new(types: Vec<String>, names: Vec<String>) -> Self {
        Self { types, names }
    }

    #[must_use]
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(types.into_iter().map(Into::into).collect(), Vec::new())
    }

    #[must_use]
    pub fn for_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::new(), names.into_iter().map(Into::into).collect())
    }
}

impl Condition for MissingBeanCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        Ok(!self.types.iter().any(|ty| context.contains_bean_type(ty))
            && !self.names.iter().any(|name| context.contains_bean_name(name)))
    }

    fn describe(&self) -> String {
        format!("@ConditionalOnMissingBean({})", describe_refs(&self.types, &self.names))
    }

    fn failure_reason(&self, context: &ConditionContext) -> Option<String> {
        let found_types: Vec<&String> = self.types.iter().filter(|ty| context.contains_bean_type(ty)).collect();
        let found_names: Vec<&String> = self
            .names
            .iter()
            .filter(|name| context.contains_bean_name(name))
            .collect();
        if found_types.is_empty() && found_names.is_empty() {
            return None;
        }

        let mut out = String::from("Found beans that should be absent:\n");
        list_refs(&mut out, "Found bean types", &found_types, &found_names, "Found bean names");
        Some(out)
    }
}

/// Matches when the referenced components have already been registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PresentBeanCondition {
    types: Vec<String>,
    names: Vec<String>,
    strategy: MatchStrategy,
}

impl PresentBeanCondition {
    #[must_use]
    pub fn new(types: Vec<String>, names: Vec<String>, strategy: MatchStrategy) -> Self {
        Self { types, names, strategy }
    }

    #[must_use]
    pub fn for_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(types.into_iter().map(Into::into).collect(), Vec::new(), MatchStrategy::All)
    }

    #[must_use]
    pub fn for_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Vec::new(), names.into_iter().map(Into::into).collect(), MatchStrategy::All)
    }

    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

impl Condition for PresentBeanCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        if self.types.is_empty() && self.names.is_empty() {
            return Ok(true);
        }
        let types_present = self.types.iter().all(|ty| context.contains_bean_type(ty));
        let names_present = self.names.iter().all(|name| context.contains_bean_name(name));

        Ok(match self.strategy {
            MatchStrategy::All => types_present && names_present,
            MatchStrategy::Any => {
                (!self.types.is_empty() && types_present) || (!self.names.is_empty() && names_present)
            }
        })
    }

    fn describe(&self) -> String {
        let mut out = format!("@ConditionalOnBean({}", describe_refs(&self.types, &self.names));
        if self.strategy == MatchStrategy::Any {
            out.push_str(", strategy=ANY");
        }
        out.push(')');
        out
    }

    fn failure_reason(&self, context: &ConditionContext) -> Option<String> {
        let missing_types: Vec<&String> = self.types.iter().filter(|ty| !context.contains_bean_type(ty)).collect();
        let missing_names: Vec<&String> = self
            .names
            .iter()
            .filter(|name| !context.contains_bean_name(name))
            .collect();
        if missing_types.is_empty() && missing_names.is_empty() {
            return None;
        }

        let mut out = match self.strategy {
            MatchStrategy::All => String::from("Required beans not found in container:\n"),
            MatchStrategy::Any => String::from("No matching beans found in container (strategy=ANY):\n"),
        };
        list_refs(&mut out, "Missing bean types", &missing_types, &missing_names, "Missing bean names");
        Some(out)
    }
}

fn describe_refs(types: &[String], names: &[String]) -> String {
    let mut parts = Vec::with_capacity(2);
    if !types.is_empty() {
        parts.push(format!("value={{{}}}", types.join(", ")));
    }
    if !names.is_empty() {
        let quoted: Vec<String> = names.iter().map(|name| format!("\"{name}\"")).collect();
        parts.push(format!("name={{{}}}", quoted.join(", ")));
    }
    parts.join(", ")
}

fn list_refs(out: &mut String, types_title: &str, types: &[&String], names: &[&String], names_title: &str) {
    if !types.is_empty() {
        out.push_str(&format!("  {types_title}:\n"));
        for ty in types {
            out.push_str(&format!("    - {ty}\n"));
        }
    }
    if !names.is_empty() {
        out.push_str(&format!("  {names_title}:\n"));
        for name in names {
            out.push_str(&format!("    - \"{name}\"\n"));
        }
    }
}
