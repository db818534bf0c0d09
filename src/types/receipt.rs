//! Block receipt summarizing one block of processed commands.
//!
//! The receipt carries the state root computed at end of block, which
//! replicas compare to detect divergence.

use ssz_rs::prelude::*;
use sha2::{Digest, Sha256};

/// Execution receipt for one block.
///
/// ## State Root
///
/// The 32-byte state root is a SHA-256 hash over every persisted key and
/// value in key order, so two replicas agree on it exactly when their
/// stores are identical.
///
/// ## Example
///
/// ```
/// use hybrid_exchange::types::BlockReceipt;
///
/// let receipt = BlockReceipt::new(
///     7,          // height
///     12,         // commands_processed
///     2,          // commands_failed
///     30,         // fills_executed
///     [0u8; 32],  // state_root
/// );
/// assert_eq!(receipt.state_root_hex().len(), 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, SimpleSerialize)]
pub struct BlockReceipt {
    /// Block height
    pub height: u64,

    /// Commands delivered in this block (including failed ones)
    pub commands_processed: u64,

    /// Commands rolled back because they returned an error
    pub commands_failed: u64,

    /// Book fills executed in this block
    pub fills_executed: u64,

    /// State root after execution (SHA-256 hash, 32 bytes)
    pub state_root: [u8; 32],
}

impl BlockReceipt {
    pub fn new(
        height: u64,
        commands_processed: u64,
        commands_failed: u64,
        fills_executed: u64,
        state_root: [u8; 32],
    ) -> Self {
        Self {
            height,
            commands_processed,
            commands_failed,
            fills_executed,
            state_root,
        }
    }

    /// Compute SHA-256 hash of the given data
    pub fn compute_hash(data: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let result = hasher.finalize();

        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }

    /// Get the state root as a hex string
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }

    /// Check if this receipt represents an empty block
    pub fn is_empty(&self) -> bool {
        self.commands_processed == 0
    }

    /// Deterministic SSZ encoding of the receipt.
    pub fn encode(&self) -> Vec<u8> {
        match ssz_rs::serialize(self) {
            Ok(bytes) => bytes,
            Err(err) => crate::error::corrupted("receipt", format!("encode failed: {err:?}")),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_new() {
        let root = [1u8; 32];
        let receipt = BlockReceipt::new(3, 10, 1, 4, root);

        assert_eq!(receipt.height, 3);
        assert_eq!(receipt.commands_processed, 10);
        assert_eq!(receipt.commands_failed, 1);
        assert_eq!(receipt.fills_executed, 4);
        assert_eq!(receipt.state_root, root);
    }

    #[test]
    fn test_receipt_hash_determinism() {
        let hash1 = BlockReceipt::compute_hash(b"test data");
        let hash2 = BlockReceipt::compute_hash(b"test data");
        assert_eq!(hash1, hash2);

        let hash3 = BlockReceipt::compute_hash(b"different data");
        assert_ne!(hash1, hash3);
    }

    #[test]
    fn test_receipt_state_root_hex() {
        let receipt = BlockReceipt::new(1, 0, 0, 0, [0xAB; 32]);
        let hex = receipt.state_root_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("abab"));
    }

    #[test]
    fn test_receipt_is_empty() {
        assert!(BlockReceipt::new(1, 0, 0, 0, [0u8; 32]).is_empty());
        assert!(!BlockReceipt::new(1, 1, 0, 0, [0u8; 32]).is_empty());
    }

    #[test]
    fn test_receipt_ssz_roundtrip() {
        let receipt = BlockReceipt::new(9, 100, 3, 50, [0xAB; 32]);
        let bytes = receipt.encode();
        let decoded: BlockReceipt = ssz_rs::deserialize(&bytes).expect("Failed to deserialize");
        assert_eq!(receipt, decoded);
        // 4 * 8 + 32
        assert_eq!(bytes.len(), 64);
    }
}
