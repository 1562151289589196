use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use brigade_core::BranchId;

/// Branch-isolated key/value storage for disposable read models.
///
/// Read models are throwaway: they can always be rebuilt from the event
/// stream, so the interface is a bare upsert/get/list plus a per-branch wipe
/// for rebuilds.
pub trait BranchStore<K, V>: Send + Sync {
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V>;
    fn upsert(&self, branch_id: BranchId, key: K, value: V);
    fn list(&self, branch_id: BranchId) -> Vec<V>;
    /// Drop every record for a branch (rebuild support).
    fn clear_branch(&self, branch_id: BranchId);
}

impl<K, V, S> BranchStore<K, V> for Arc<S>
where
    S: BranchStore<K, V> + ?Sized,
{
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V> {
        (**self).get(branch_id, key)
    }

    fn upsert(&self, branch_id: BranchId, key: K, value: V) {
        (**self).upsert(branch_id, key, value)
    }

    fn list(&self, branch_id: BranchId) -> Vec<V> {
        (**self).list(branch_id)
    }

    fn clear_branch(&self, branch_id: BranchId) {
        (**self).clear_branch(branch_id)
    }
}

/// In-memory branch-isolated store.
///
/// One inner map per branch; a branch that has never been written to simply
/// has no map, so cross-branch reads cannot observe anything.
#[derive(Debug)]
pub struct InMemoryBranchStore<K, V> {
    branches: RwLock<HashMap<BranchId, HashMap<K, V>>>,
}

impl<K, V> InMemoryBranchStore<K, V> {
    pub fn new() -> Self {
        Self {
            branches: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryBranchStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> BranchStore<K, V> for InMemoryBranchStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, branch_id: BranchId, key: &K) -> Option<V> {
        let branches = self.branches.read().ok()?;
        branches.get(&branch_id)?.get(key).cloned()
    }

    fn upsert(&self, branch_id: BranchId, key: K, value: V) {
        if let Ok(mut branches) = self.branches.write() {
            branches.entry(branch_id).or_default().insert(key, value);
        }
    }

    fn list(&self, branch_id: BranchId) -> Vec<V> {
        match self.branches.read() {
            Ok(branches) => branches
                .get(&branch_id)
                .map(|records| records.values().cloned().collect())
                .unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    fn clear_branch(&self, branch_id: BranchId) {
        if let Ok(mut branches) = self.branches.write() {
            branches.remove(&branch_id);
        }
    }
}
