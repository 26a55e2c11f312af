use core::fmt::{self, Display, Formatter};

use super::join_identities;
use crate::{dependency::InjectionSite, identity::Identity, scope::Scope};

/// A component that could satisfy a requested identity, with the values used to rank it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub identity: Identity,
    pub order: i32,
    pub primary: bool,
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} (order {}", self.identity, self.order)?;
        if self.primary {
            f.write_str(", primary")?;
        }
        f.write_str(")")
    }
}

/// A component that looked like a match for a requested identity but was not usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NearMiss {
    pub identity: Identity,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    MissingDependency {
        requester: Identity,
        site: InjectionSite,
        requested: Identity,
        near_misses: Vec<NearMiss>,
    },
    AmbiguousDependency {
        requester: Identity,
        site: InjectionSite,
        requested: Identity,
        candidates: Vec<Candidate>,
    },
    CyclicDependency {
        path: Vec<Identity>,
    },
    ConditionEvaluation {
        component: Identity,
        condition: String,
        message: String,
    },
    ScopeWidening {
        dependent: Identity,
        dependent_scope: Scope,
        dependency: Identity,
    },
    LazyForcedEager {
        dependent: Identity,
        dependency: Identity,
    },
    DuplicateComponent {
        identity: Identity,
        count: usize,
    },
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::MissingDependency {
                requester,
                site,
                requested,
                near_misses,
            } => {
                write!(f, "No component satisfies {requested}, required by {requester} ({site})")?;
                if near_misses.is_empty() {
                    write!(f, "\n  Declare a component providing {requested} or mark the injection point optional")?;
                } else {
                    f.write_str("\n  Considered:")?;
                    for NearMiss { identity, reason } in near_misses {
                        write!(f, "\n    - {identity}: {}", reason.trim_end())?;
                    }
                }
            }
            DiagnosticKind::AmbiguousDependency {
                requester,
                site,
                requested,
                candidates,
            } => {
                write!(
                    f,
                    "{} components satisfy {requested}, required by {requester} ({site})",
                    candidates.len()
                )?;
                for candidate in candidates {
                    write!(f, "\n    - {candidate}")?;
                }
                f.write_str("\n  Add a qualifier, mark one candidate primary or give them distinct orders")?;
            }
            DiagnosticKind::CyclicDependency { path } => {
                f.write_str("Cyclic dependency detected: ")?;
                for (idx, identity) in path.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(" -> ")?;
                    }
                    write!(f, "{identity}")?;
                }
                f.write_str("\n  Break the cycle with a provider (deferred) injection point")?;
            }
            DiagnosticKind::ConditionEvaluation {
                component,
                condition,
                message,
            } => {
                write!(f, "Condition {condition} of {component} couldn't be evaluated, component excluded: {message}")?;
            }
            DiagnosticKind::ScopeWidening {
                dependent,
                dependent_scope,
                dependency,
            } => {
                write!(
                    f,
                    "{dependent_scope} {dependent} holds prototype {dependency} for its whole lifetime, inject a provider to get fresh instances"
                )?;
            }
            DiagnosticKind::LazyForcedEager { dependent, dependency } => {
                write!(
                    f,
                    "Singleton {dependent} forces lazy singleton {dependency} to be built at startup"
                )?;
            }
            DiagnosticKind::DuplicateComponent { identity, count } => {
                write!(f, "{identity} is declared {count} times")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    #[inline]
    #[must_use]
    pub const fn error(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Error,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub const fn warning(kind: DiagnosticKind) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "error: {}", self.kind),
            Severity::Warning => write!(f, "warning: {}", self.kind),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderErrorKind {
    #[error("Construction order undefined, cyclic dependency among: {}", join_identities(.remaining))]
    Cycle { remaining: Vec<Identity> },
}
