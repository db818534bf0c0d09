//! Journaled in-memory key-value store.
//!
//! ## Transactions
//!
//! Between [`MemStore::begin`] and [`MemStore::commit`] every write records
//! the value it replaced. [`MemStore::rollback`] replays that journal in
//! reverse, restoring the store byte for byte. Outside a transaction writes
//! apply directly. Nested transactions are not supported: `begin` inside an
//! open transaction keeps the outer journal.
//!
//! ## State Hash
//!
//! Entries live in a `BTreeMap`, so iteration order is the key order on
//! every replica and the [`StateDigest`] hash is deterministic.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::store::{KvStore, StateDigest, Transactional};

/// Ordered in-memory store with an undo journal.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    journal: Option<Vec<(Vec<u8>, Option<Vec<u8>>)>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a transaction is open
    #[inline]
    pub fn in_transaction(&self) -> bool {
        self.journal.is_some()
    }

    fn record(&mut self, key: &[u8], previous: Option<Vec<u8>>) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push((key.to_vec(), previous));
        }
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.get(key).cloned()
    }

    fn has(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let previous = self.data.insert(key.clone(), value);
        self.record(&key, previous);
    }

    fn delete(&mut self, key: &[u8]) {
        if let Some(previous) = self.data.remove(key) {
            self.record(key, Some(previous));
        }
    }

    fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a> {
        let prefix = prefix.to_vec();
        Box::new(
            self.data
                .range(prefix.clone()..)
                .take_while(move |(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.as_slice(), v.as_slice())),
        )
    }
}

impl StateDigest for MemStore {
    /// SHA-256 over all entries in key order, each length-prefixed.
    fn state_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (key, value) in &self.data {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u64).to_be_bytes());
            hasher.update(value);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&hasher.finalize());
        out
    }
}

impl Transactional for MemStore {
    fn begin(&mut self) {
        if self.journal.is_none() {
            self.journal = Some(Vec::new());
        }
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for (key, previous) in journal.into_iter().rev() {
            match previous {
                Some(value) => {
                    self.data.insert(key, value);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
