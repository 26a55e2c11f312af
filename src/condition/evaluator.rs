use tracing::{debug, warn};

use super::{ConditionContext, SharedCondition};
use crate::{errors::ConditionErrorKind, identity::Identity};

/// Outcome of evaluating every condition of a component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    /// One reason per failed condition, in declaration order
    Rejected { reasons: Vec<String> },
    /// A condition couldn't be evaluated. The component is excluded.
    Error {
        condition: String,
        error: ConditionErrorKind,
        reasons: Vec<String>,
    },
}

impl Verdict {
    #[inline]
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Single-line summary of the rejection, `None` when accepted
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected { reasons } => Some(reasons.join("; ")),
            Verdict::Error { condition, error, .. } => Some(format!("{condition}: {error}")),
        }
    }
}

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// `true` when every condition matches. Stops at the first failure,
    /// a condition that can't be evaluated counts as a failure.
    #[must_use]
    pub fn evaluate(conditions: &[SharedCondition], context: &ConditionContext) -> bool {
        conditions
            .iter()
            .all(|condition| condition.matches(context).unwrap_or(false))
    }

    /// Evaluates every condition and collects the failures.
    /// Failure messages come from [`super::Condition::failure_reason`], falling back to the description.
    #[must_use]
    pub fn explain(component: &Identity, conditions: &[SharedCondition], context: &ConditionContext) -> Verdict {
        let mut reasons = Vec::new();
        let mut first_error = None;

        for condition in conditions {
            match condition.matches(context) {
                Ok(true) => {}
                Ok(false) => {
                    let reason = condition
                        .failure_reason(context)
                        .unwrap_or_else(|| condition.describe());
                    debug!(%component, %reason, "Condition not matched");
                    reasons.push(reason);
                }
                Err(err) => {
                    let description = condition.describe();
                    warn!(%component, condition = %description, "{}", err);
                    reasons.push(format!("{description}: {err}"));
                    if first_error.is_none() {
                        first_error = Some((description, err));
                    }
                }
            }
        }

        match (first_error, reasons.is_empty()) {
            (Some((condition, error)), _) => Verdict::Error {
                condition,
                error,
                reasons,
            },
            (None, true) => Verdict::Accepted,
            (None, false) => Verdict::Rejected { reasons },
        }
    }
}
