//! Per-stimulus seed derivation.
//!
//! Every randomized visual choice for a stimulus is driven by a seed derived
//! from the stimulus name alone, so the same tower gets the same colors in
//! every dataset and every ratio variant.
//!
//! The derivation is: MD5 of the UTF-8 name, read as a big-endian 128-bit
//! integer, written in decimal, truncated to its first 9 digits.

use crate::rng::StimulusRng;
use md5::{Digest, Md5};
use std::fmt;

/// Number of leading decimal digits kept from the hash.
const SEED_DIGITS: usize = 9;

/// Deterministic seed for one stimulus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seed(u32);

impl Seed {
    /// Derive the seed for a stimulus name.
    ///
    /// # Example
    ///
    /// ```
    /// use towerstim::Seed;
    ///
    /// assert_eq!(Seed::from_name("tower_00").value(), 214_068_433);
    /// ```
    pub fn from_name(name: &str) -> Self {
        let digest = Md5::digest(name.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&digest);

        let decimal = u128::from_be_bytes(bytes).to_string();
        let head = &decimal[..decimal.len().min(SEED_DIGITS)];
        // At most 9 ASCII digits, always fits in a u32.
        Self(head.parse().unwrap_or_default())
    }

    /// Wrap a raw seed value.
    pub const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// The numeric seed.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// A fresh generator seeded with this value.
    pub fn rng(self) -> StimulusRng {
        StimulusRng::seeded(self)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
