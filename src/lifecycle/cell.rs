use std::{
    sync::{
        atomic::{AtomicU64, AtomicU8, Ordering},
        Arc,
    },
    thread::{self, ThreadId},
};

use arc_swap::ArcSwapOption;
use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::{Instance, LifecycleState};
use crate::errors::InstantiateErrorKind;

const UNINITIALIZED: u8 = LifecycleState::Uninitialized as u8;
const CONSTRUCTING: u8 = LifecycleState::Constructing as u8;
const READY: u8 = LifecycleState::Ready as u8;
const DESTROYED: u8 = LifecycleState::Destroyed as u8;

struct Slot(Instance);

#[derive(Debug)]
pub(crate) enum InitError {
    Closed,
    Reentrant,
    Failed(InstantiateErrorKind),
}

/// Holds the single instance of a cached component.
///
/// The state only leaves `Uninitialized` through a compare-and-set, so exactly one thread constructs.
/// Others block on the condvar until the winner publishes or gives up.
/// Published instances are read without locking.
pub(crate) struct ScopeCell {
    state: AtomicU8,
    value: ArcSwapOption<Slot>,
    /// Bumped on every change of `value`
    generation: AtomicU64,
    owner: Mutex<Option<ThreadId>>,
    gate: Mutex<()>,
    settled: Condvar,
}

/// Resets the gate if construction unwinds
struct ConstructionGuard<'a> {
    cell: &'a ScopeCell,
    armed: bool,
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        *self.cell.owner.lock() = None;
        if self.armed {
            let _gate = self.cell.gate.lock();
            let _ = self
                .cell
                .state
                .compare_exchange(CONSTRUCTING, UNINITIALIZED, Ordering::AcqRel, Ordering::Acquire);
            self.cell.settled.notify_all();
        }
    }
}

impl ScopeCell {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(UNINITIALIZED),
            value: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            owner: Mutex::new(None),
            gate: Mutex::new(()),
            settled: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Published instance, if any
    #[inline]
    pub(crate) fn load(&self) -> Option<Instance> {
        self.value.load_full().map(|slot| slot.0.clone())
    }

    /// Swaps the published value when it's still `current`
    fn compare_and_set(&self, current: &Option<Arc<Slot>>, new: Option<Instance>) -> bool {
        let previous = self
            .value
            .compare_and_swap(current, new.map(|instance| Arc::new(Slot(instance))));
        let swapped = match (&*previous, current) {
            (Some(previous), Some(current)) => Arc::ptr_eq(previous, current),
            (None, None) => true,
            _ => false,
        };
        if swapped {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        swapped
    }

    /// Returns the instance, constructing it with `init` if nobody has yet.
    ///
    /// A thread arriving while another one constructs waits for it and gets the same instance.
    /// The constructing thread asking again gets [`InitError::Reentrant`].
    /// A failed `init` resets the cell, so the next call tries again.
    pub(crate) fn get_or_init(
        &self,
        init: impl FnOnce() -> Result<Instance, InstantiateErrorKind>,
    ) -> Result<Instance, InitError> {
        let mut init = Some(init);
        loop {
            match self.state.load(Ordering::Acquire) {
                READY => {
                    if let Some(instance) = self.load() {
                        return Ok(instance);
                    }
                }
                DESTROYED => return Err(InitError::Closed),
                UNINITIALIZED => {
                    if self
                        .state
                        .compare_exchange(UNINITIALIZED, CONSTRUCTING, Ordering::AcqRel, Ordering::Acquire)
                        .is_err()
                    {
                        continue;
                    }
                    let Some(init) = init.take() else {
                        return Err(InitError::Closed);
                    };
                    return self.construct(init);
                }
                _ => {
                    if *self.owner.lock() == Some(thread::current().id()) {
                        return Err(InitError::Reentrant);
                    }
                    let mut gate = self.gate.lock();
                    while self.state.load(Ordering::Acquire) == CONSTRUCTING {
                        self.settled.wait(&mut gate);
                    }
                }
            }
        }
    }

    fn construct(
        &self,
        init: impl FnOnce() -> Result<Instance, InstantiateErrorKind>,
    ) -> Result<Instance, InitError> {
        *self.owner.lock() = Some(thread::current().id());
        let mut guard = ConstructionGuard { cell: self, armed: true };

        let instance = init().map_err(InitError::Failed)?;

        let _gate = self.gate.lock();
        if self.state.load(Ordering::Acquire) == DESTROYED {
            guard.armed = false;
            self.settled.notify_all();
            debug!("Closed while constructing, dropping instance");
            return Err(InitError::Closed);
        }
        if !self.compare_and_set(&None, Some(instance.clone())) {
            return Err(InitError::Closed);
        }
        self.state.store(READY, Ordering::Release);
        guard.armed = false;
        self.settled.notify_all();

        Ok(instance)
    }

    /// Moves the cell to `Destroyed` and hands back the instance it held
    pub(crate) fn destroy(&self) -> Option<Instance> {
        let _gate = self.gate.lock();
        self.state.store(DESTROYED, Ordering::Release);
        self.settled.notify_all();

        loop {
            let current = self.value.load_full();
            if self.compare_and_set(&current, None) {
                return current.map(|slot| slot.0.clone());
            }
        }
    }
}
