//! Account addresses, order identifiers and coins.
//!
//! An order id is the sender address plus a per-sender sequence number,
//! written `"<hex address>-<sequence>"`. Parsing rejects anything else with
//! [`DexError::InvalidOrderId`].

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::DexError;

/// Byte length of an account address.
pub const ADDRESS_LEN: usize = 32;

/// A 32-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Convenience constructor for fixtures: every byte set to `byte`.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; ADDRESS_LEN])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| DexError::InvalidOrderId(s.to_string()))?;
        let array: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| DexError::InvalidOrderId(s.to_string()))?;
        Ok(Self(array))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Unique order identifier: sender + sender-local sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OrderId {
    pub sender: Address,
    pub sequence: u64,
}

impl OrderId {
    pub const fn new(sender: Address, sequence: u64) -> Self {
        Self { sender, sequence }
    }

    /// Fixed-width big-endian key bytes: address followed by sequence.
    pub fn key_bytes(&self) -> [u8; ADDRESS_LEN + 8] {
        let mut out = [0u8; ADDRESS_LEN + 8];
        out[..ADDRESS_LEN].copy_from_slice(&self.sender.0);
        out[ADDRESS_LEN..].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.sender, self.sequence)
    }
}

impl FromStr for OrderId {
    type Err = DexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DexError::InvalidOrderId(s.to_string());
        let (addr, seq) = s.rsplit_once('-').ok_or_else(malformed)?;
        let sender = addr.parse::<Address>().map_err(|_| malformed())?;
        if seq.is_empty() || !seq.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence = seq.parse::<u64>().map_err(|_| malformed())?;
        Ok(Self { sender, sequence })
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// An amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
