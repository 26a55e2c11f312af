use core::fmt::{self, Display, Formatter};

use super::instantiate::InstantiateErrorKind;
use crate::identity::Identity;

#[derive(thiserror::Error, Debug)]
pub enum RegistryErrorKind {
    #[error("Instantiator not found in registry for {identity}")]
    NoInstantiator { identity: Identity },
    #[error("Component {identity} isn't part of the plan")]
    UnknownComponent { identity: Identity },
    #[error("Component {identity} is declared more than once, bind it with a qualifier")]
    DuplicateComponent { identity: Identity },
}

#[derive(thiserror::Error, Debug)]
pub enum ConstructionErrorKind {
    #[error(transparent)]
    Registry(#[from] RegistryErrorKind),
    #[error("Failed to construct {identity} during startup: {source}")]
    Component {
        identity: Identity,
        #[source]
        source: InstantiateErrorKind,
    },
}

#[derive(Debug)]
pub struct DestructionFailure {
    pub identity: Identity,
    pub source: anyhow::Error,
}

impl Display for DestructionFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.identity, self.source)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CloseErrorKind {
    Destruction { failures: Vec<DestructionFailure> },
}

impl Display for CloseErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CloseErrorKind::Destruction { failures } => {
                write!(f, "{} pre-destroy hook(s) failed", failures.len())?;
                for failure in failures {
                    write!(f, "\n  - {failure}")?;
                }
            }
        }
        Ok(())
    }
}
