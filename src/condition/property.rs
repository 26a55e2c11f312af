use super::{Condition, ConditionContext};
use crate::errors::ConditionErrorKind;

/// Matches on the presence and optionally the value of a property.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyCondition {
    name: String,
    expected_value: Option<String>,
    match_if_missing: bool,
}

impl PropertyCondition {
    /// An empty `expected_value` behaves like `None`: any value matches.
    #[must_use]
    pub fn new(name: impl Into<String>, expected_value: Option<String>, match_if_missing: bool) -> Self {
        Self {
            name: name.into(),
            expected_value: expected_value.filter(|value| !value.is_empty()),
            match_if_missing,
        }
    }

    #[inline]
    #[must_use]
    pub fn present(name: impl Into<String>) -> Self {
        Self::new(name, None, false)
    }

    #[inline]
    #[must_use]
    pub fn having_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Some(value.into()), false)
    }

    #[inline]
    #[must_use]
    pub fn match_if_missing(mut self) -> Self {
        self.match_if_missing = true;
        self
    }
}

impl Condition for PropertyCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        let Some(value) = context.property(&self.name) else {
            return Ok(self.match_if_missing);
        };
        Ok(match &self.expected_value {
            Some(expected) => *expected == value,
            None => true,
        })
    }

    fn describe(&self) -> String {
        let mut out = format!("@ConditionalOnProperty(name=\"{}\"", self.name);
        if let Some(expected) = &self.expected_value {
            out.push_str(&format!(", havingValue=\"{expected}\""));
        }
        if self.match_if_missing {
            out.push_str(", matchIfMissing=true");
        }
        out.push(')');
        out
    }

    fn failure_reason(&self, context: &ConditionContext) -> Option<String> {
        match (context.property(&self.name), &self.expected_value) {
            (None, _) if self.match_if_missing => None,
            (None, _) => Some(format!("Property '{}' is not set (matchIfMissing=false)", self.name)),
            (Some(actual), Some(expected)) if actual != *expected => Some(format!(
                "Property '{}' has value '{actual}' but expected '{expected}'",
                self.name
            )),
            (Some(_), _) => None,
        }
    }
}
