mod bean;
mod class;
mod context;
mod evaluator;
mod expression;
mod profile;
mod property;

pub use bean::{MissingBeanCondition, PresentBeanCondition};
pub use class::ClassCondition;
pub use context::{ClassProbe, ConditionContext, ConditionContextBuilder, KnownTypes};
pub use evaluator::{ConditionEvaluator, Verdict};
pub use expression::ExpressionCondition;
pub use profile::ProfileCondition;
pub use property::PropertyCondition;

use core::fmt;
use std::sync::Arc;

use crate::errors::ConditionErrorKind;

/// Predicate deciding whether a component takes part in the graph.
pub trait Condition: fmt::Debug + Send + Sync {
    /// # Errors
    /// Returns an error when the condition itself is malformed.
    /// Callers treat it as a failed match.
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind>;

    /// Human-readable form of the condition, used in diagnostics
    #[must_use]
    fn describe(&self) -> String;

    /// Why the condition doesn't match.
    /// `None` lets callers fall back to [`Condition::describe`].
    #[must_use]
    fn failure_reason(&self, _context: &ConditionContext) -> Option<String> {
        None
    }
}

pub type SharedCondition = Arc<dyn Condition>;

/// How multi-part conditions combine their parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MatchStrategy {
    /// Every part has to match
    #[default]
    All,
    /// One matching part is enough
    Any,
}
