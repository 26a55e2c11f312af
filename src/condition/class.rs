use super::{Condition, ConditionContext};
use crate::errors::ConditionErrorKind;

/// Matches when every named type is available to the analysed program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassCondition {
    type_names: Vec<String>,
}

impl ClassCondition {
    #[must_use]
    pub fn new<I, S>(type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_names: type_names.into_iter().map(Into::into).collect(),
        }
    }
}

impl Condition for ClassCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        Ok(self.type_names.iter().all(|name| context.is_class_present(name)))
    }

    fn describe(&self) -> String {
        format!("@ConditionalOnClass({})", self.type_names.join(", "))
    }

    fn failure_reason(&self, context: &ConditionContext) -> Option<String> {
        let missing: Vec<&str> = self
            .type_names
            .iter()
            .filter(|name| !context.is_class_present(name))
            .map(String::as_str)
            .collect();
        if missing.is_empty() {
            return None;
        }
        Some(format!("Required types not present: {}", missing.join(", ")))
    }
}
