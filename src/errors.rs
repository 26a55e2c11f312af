mod condition;
mod container;
mod diagnostic;
mod instantiate;
mod resolve;

pub use condition::ConditionErrorKind;
pub use container::{CloseErrorKind, ConstructionErrorKind, DestructionFailure, RegistryErrorKind};
pub use diagnostic::{Candidate, Diagnostic, DiagnosticKind, NearMiss, OrderErrorKind, Severity};
pub use instantiate::InstantiateErrorKind;
pub use resolve::ResolveErrorKind;

use crate::identity::Identity;

pub(crate) fn join_identities(identities: &[Identity]) -> String {
    let mut out = String::new();
    for (idx, identity) in identities.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        out.push_str(&identity.to_string());
    }
    out
}
