//! Per-thread mirror of published instances.
//!
//! Entries hold weak references stamped with the cell generation, so a mirror never outlives
//! the canonical instance and never serves a replaced one. Each thread's map is emptied the
//! first time it sees a new global epoch, and entries whose instance is gone are swept once the
//! map doubles in size.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use core::any::Any;

use crate::lifecycle::Instance;

static EPOCH: AtomicU64 = AtomicU64::new(0);
static CONTAINER_IDS: AtomicU64 = AtomicU64::new(0);

const MIN_SWEEP_LEN: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct CacheKey {
    pub(crate) container: u64,
    pub(crate) node: usize,
}

struct Mirrored {
    generation: u64,
    instance: Weak<dyn Any + Send + Sync>,
}

struct Mirrors {
    entries: BTreeMap<CacheKey, Mirrored>,
    /// Epoch every entry was stored in
    epoch: u64,
    sweep_len: usize,
}

impl Mirrors {
    const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            epoch: 0,
            sweep_len: MIN_SWEEP_LEN,
        }
    }

    fn sync(&mut self, epoch: u64) {
        if self.epoch != epoch {
            self.entries.clear();
            self.epoch = epoch;
        }
    }

    fn get(&mut self, key: CacheKey, generation: u64, epoch: u64) -> Option<Instance> {
        self.sync(epoch);
        let mirrored = self.entries.get(&key)?;
        if mirrored.generation == generation {
            if let Some(instance) = mirrored.instance.upgrade() {
                return Some(instance);
            }
        }
        self.entries.remove(&key);
        None
    }

    fn insert(&mut self, key: CacheKey, generation: u64, epoch: u64, instance: &Instance) {
        self.sync(epoch);
        if self.entries.len() >= self.sweep_len {
            self.sweep();
        }
        self.entries.insert(
            key,
            Mirrored {
                generation,
                instance: Arc::downgrade(instance),
            },
        );
    }

    fn sweep(&mut self) {
        self.entries.retain(|_, mirrored| mirrored.instance.strong_count() > 0);
        self.sweep_len = (self.entries.len() * 2).max(MIN_SWEEP_LEN);
    }
}

thread_local! {
    static MIRRORS: RefCell<Mirrors> = const { RefCell::new(Mirrors::new()) };
}

#[inline]
pub(crate) fn next_container_id() -> u64 {
    CONTAINER_IDS.fetch_add(1, Ordering::Relaxed)
}

/// Mirrored instance of `key`, if it was stored under `generation` in the current epoch
pub(crate) fn lookup(key: CacheKey, generation: u64) -> Option<Instance> {
    let epoch = EPOCH.load(Ordering::Acquire);
    MIRRORS
        .try_with(|mirrors| mirrors.borrow_mut().get(key, generation, epoch))
        .ok()
        .flatten()
}

pub(crate) fn mirror(key: CacheKey, generation: u64, instance: &Instance) {
    let epoch = EPOCH.load(Ordering::Acquire);
    let _ = MIRRORS.try_with(|mirrors| mirrors.borrow_mut().insert(key, generation, epoch, instance));
}

/// Drops this thread's entries of one container
pub(crate) fn forget_container(container: u64) {
    let _ = MIRRORS.try_with(|mirrors| {
        mirrors.borrow_mut().entries.retain(|key, _| key.container != container);
    });
}

/// Invalidates the mirrors of every thread and empties the current thread's.
///
/// Other threads empty their maps on their next lookup or store.
pub fn clear_thread_caches() {
    let epoch = EPOCH.fetch_add(1, Ordering::AcqRel) + 1;
    let _ = MIRRORS.try_with(|mirrors| mirrors.borrow_mut().sync(epoch));
}
