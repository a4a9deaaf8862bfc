//! Process-wide method arena
//!
//! Each registered method is stored under a [`MethodId`] that is written
//! into its table entry's argument block. The host echoes that block back on
//! every call, so resolving the method is a single lookup here. Identities
//! are never reused: a released identity stays dead, and its entry is removed.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::method::ErasedMethod;

/// Stable identity of a registered method.
///
/// Identities count up from one, so zero never names a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u64);

impl MethodId {
    /// Rebuild from the raw value carried in an argument block
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value written into the argument block
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// Live methods, keyed by identity
struct MethodArena {
    methods: HashMap<u64, Arc<dyn ErasedMethod>>,
    next_id: u64,
}

impl MethodArena {
    fn new() -> Self {
        Self {
            methods: HashMap::new(),
            next_id: 1,
        }
    }

    fn register(&mut self, method: Arc<dyn ErasedMethod>) -> MethodId {
        let id = self.next_id;
        self.next_id += 1;
        self.methods.insert(id, method);
        MethodId(id)
    }

    fn release(&mut self, id: MethodId) {
        self.methods.remove(&id.0);
    }

    fn get(&self, id: MethodId) -> Option<Arc<dyn ErasedMethod>> {
        self.methods.get(&id.0).cloned()
    }
}

static ARENA: LazyLock<RwLock<MethodArena>> = LazyLock::new(|| RwLock::new(MethodArena::new()));

fn register(method: Arc<dyn ErasedMethod>) -> MethodId {
    ARENA.write().register(method)
}

fn release(id: MethodId) {
    ARENA.write().release(id);
}

#[cfg(test)]
fn live_count() -> usize {
    ARENA.read().methods.len()
}

/// Look up a live method.
///
/// The returned handle keeps the method alive for the duration of the call
/// even if its class is torn down meanwhile.
pub(crate) fn resolve(id: MethodId) -> Option<Arc<dyn ErasedMethod>> {
    ARENA.read().get(id)
}

/// Whether `id` names a live method
pub fn is_live(id: MethodId) -> bool {
    resolve(id).is_some()
}

/// Scoped ownership of a group of arena entries.
///
/// Every method registered through a lease is released when the lease drops,
/// on success paths and failure paths alike.
#[derive(Debug, Default)]
pub(crate) struct Lease {
    ids: Vec<MethodId>,
}

impl Lease {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, method: Arc<dyn ErasedMethod>) -> MethodId {
        let id = register(method);
        self.ids.push(id);
        id
    }

    pub(crate) fn ids(&self) -> &[MethodId] {
        &self.ids
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            release(id);
        }
    }
}
