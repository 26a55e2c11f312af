mod cell;
mod state;

pub(crate) use cell::{InitError, ScopeCell};
pub use state::LifecycleState;

use std::sync::Arc;

use core::any::Any;

/// A constructed component, type-erased.
pub type Instance = Arc<dyn Any + Send + Sync>;
