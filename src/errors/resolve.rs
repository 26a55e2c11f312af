use super::{instantiate::InstantiateErrorKind, join_identities};
use crate::{identity::Identity, lifecycle::LifecycleState};

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Component {identity} not found in container")]
    NoComponent { identity: Identity },
    #[error("Component {identity} is ambiguous. Candidates: {}", join_identities(.candidates))]
    Ambiguous { identity: Identity, candidates: Vec<Identity> },
    #[error("Component {identity} isn't ready. Actual state: {state}")]
    NotReady { identity: Identity, state: LifecycleState },
    #[error("Container is closed")]
    Closed,
    #[error("Incorrect component type for {identity}. Expected: {expected}")]
    IncorrectType { identity: Identity, expected: &'static str },
    #[error("Component {identity} requested again while it is being constructed on the same thread")]
    Reentrant { identity: Identity },
    #[error("Argument #{index} not found, instantiator received {len} arguments")]
    NoArgument { index: usize, len: usize },
    #[error("Argument #{index} is {actual}, expected {expected}")]
    IncorrectArgument {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Failed to construct {identity}: {source}")]
    Construction {
        identity: Identity,
        #[source]
        source: Box<InstantiateErrorKind>,
    },
}
