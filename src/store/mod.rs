//! Key-value storage abstraction.
//!
//! ## Components
//!
//! - [`KvStore`]: ordered byte-key store the order index and pool keeper
//!   persist through
//! - [`Transactional`]: begin/commit/rollback used by the block driver to
//!   make each command atomic
//! - [`StateDigest`]: content hash feeding the block state root
//! - [`MemStore`]: journaled `BTreeMap` implementation
//! - [`keys`]: the persisted key layout
//! - [`codec`]: SSZ records stored under those keys

pub mod codec;
pub mod keys;
mod memory;

pub use memory::MemStore;

/// Ordered byte-key store.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    /// Entries whose key starts with `prefix`, in ascending key order.
    fn scan_prefix<'a>(
        &'a self,
        prefix: &[u8],
    ) -> Box<dyn Iterator<Item = (&'a [u8], &'a [u8])> + 'a>;
}

/// Atomic command execution.
pub trait Transactional {
    fn begin(&mut self);
    fn commit(&mut self);
    /// Undo every write since `begin`. A no-op outside a transaction.
    fn rollback(&mut self);
}

/// Content hash of a state component.
///
/// Equal state must give equal digests on every replica.
pub trait StateDigest {
    fn state_hash(&self) -> [u8; 32];
}
