use super::{expression::Expression, Condition, ConditionContext, MatchStrategy};
use crate::errors::ConditionErrorKind;

/// Matches against the active profiles.
///
/// Entries are OR-ed: the condition holds when any entry matches. An entry prefixed with `!`
/// matches when that profile is *not* active. An empty list always matches.
///
/// An additional expression may be attached, combined with the profile list through
/// [`MatchStrategy`]: with `All` both have to hold, with `Any` one of them is enough.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProfileCondition {
    profiles: Vec<String>,
    expression: Option<String>,
    strategy: MatchStrategy,
}

impl ProfileCondition {
    #[must_use]
    pub fn new<I, S>(profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            profiles: profiles.into_iter().map(Into::into).collect(),
            expression: None,
            strategy: MatchStrategy::All,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = Some(expression.into()).filter(|expression| !expression.trim().is_empty());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    fn matches_profiles(&self, context: &ConditionContext) -> bool {
        self.profiles.is_empty() || self.profiles.iter().any(|profile| matches_profile(profile, context))
    }

    fn matches_expression(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        match &self.expression {
            Some(expression) => Expression::parse(expression)?.evaluate(context),
            None => Ok(true),
        }
    }
}

fn matches_profile(profile: &str, context: &ConditionContext) -> bool {
    let profile = profile.trim();
    if profile.is_empty() {
        return true;
    }
    match profile.strip_prefix('!') {
        Some(negated) => !context.is_profile_active(negated.trim()),
        None => context.is_profile_active(profile),
    }
}

impl Condition for ProfileCondition {
    fn matches(&self, context: &ConditionContext) -> Result<bool, ConditionErrorKind> {
        match (self.profiles.is_empty(), &self.expression, self.strategy) {
            (true, None, _) => Ok(true),
            (false, None, _) => Ok(self.matches_profiles(context)),
            (true, Some(_), _) => self.matches_expression(context),
            (false, Some(_), MatchStrategy::All) => {
                Ok(self.matches_profiles(context) && self.matches_expression(context)?)
            }
            (false, Some(_), MatchStrategy::Any) => {
                Ok(self.matches_profiles(context) || self.matches_expression(context)?)
            }
        }
    }

    fn describe(&self) -> String {
        let quoted: Vec<String> = self.profiles.iter().map(|profile| format!("\"{profile}\"")).collect();
        let mut out = format!("@Profile({{{}}})", quoted.join(", "));
        if let Some(expression) = &self.expression {
            out.push_str(&format!(" with expression: {expression}"));
        }
        if self.strategy == MatchStrategy::Any {
            out.push_str(" strategy: ANY");
        }
        out
    }

    fn failure_reason(&self, context: &ConditionContext) -> Option<String> {
        let active: Vec<&str> = context.active_profiles().iter().map(String::as_str).collect();
        Some(format!(
            "{} doesn't match active profiles [{}]",
            self.describe(),
            active.join(", ")
        ))
    }
}
