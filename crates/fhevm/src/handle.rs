// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::{B256, U256};
use purechance_utils::preview;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Encrypted types the lottery contract works with.
///
/// The discriminant is the tag stored in byte 30 of every handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum FheType {
    #[serde(rename = "ebool")]
    Bool = 0,
    #[serde(rename = "euint8")]
    Uint8 = 2,
    #[serde(rename = "euint16")]
    Uint16 = 3,
    #[serde(rename = "euint32")]
    Uint32 = 4,
    #[serde(rename = "euint64")]
    Uint64 = 5,
}

impl FheType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        use FheType::*;
        match tag {
            0 => Some(Bool),
            2 => Some(Uint8),
            3 => Some(Uint16),
            4 => Some(Uint32),
            5 => Some(Uint64),
            _ => None,
        }
    }

    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Width of the plaintext in bits
    pub fn bits(&self) -> usize {
        use FheType::*;
        match self {
            Bool => 2,
            Uint8 => 8,
            Uint16 => 16,
            Uint32 => 32,
            Uint64 => 64,
        }
    }

    /// Largest plaintext representable by this type
    pub fn max_value(&self) -> U256 {
        match self {
            FheType::Bool => U256::from(1),
            other => (U256::from(1) << other.bits()) - U256::from(1),
        }
    }

    pub fn as_str(&self) -> &'static str {
        use FheType::*;
        match self {
            Bool => "ebool",
            Uint8 => "euint8",
            Uint16 => "euint16",
            Uint32 => "euint32",
            Uint64 => "euint64",
        }
    }
}

impl fmt::Display for FheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque 32 byte reference to a ciphertext held by the protocol.
///
/// Layout: `[0..21]` digest, `[21]` index within the producing input,
/// `[22..30]` host chain id (big endian), `[30]` [`FheType`] tag, `[31]` version.
/// The all-zero handle is the sentinel contracts return for "not yet set".
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(B256);

impl Handle {
    pub const ZERO: Handle = Handle(B256::ZERO);
    pub const VERSION: u8 = 0;

    pub fn new(value: B256) -> Self {
        Self(value)
    }

    /// Build a handle from a digest and its metadata
    pub fn compose(digest: B256, index: u8, chain_id: u64, fhe_type: FheType) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..21].copy_from_slice(&digest[..21]);
        bytes[21] = index;
        bytes[22..30].copy_from_slice(&chain_id.to_be_bytes());
        bytes[30] = fhe_type.tag();
        bytes[31] = Self::VERSION;
        Self(B256::from(bytes))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }

    pub fn as_b256(&self) -> &B256 {
        &self.0
    }

    pub fn index(&self) -> u8 {
        self.0[21]
    }

    pub fn chain_id(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.0[22..30]);
        u64::from_be_bytes(bytes)
    }

    pub fn fhe_type(&self) -> Option<FheType> {
        FheType::from_tag(self.0[30])
    }

    /// Short form for status lines eg. `0x3fa9c1d2...`
    pub fn preview(&self) -> String {
        preview(&self.to_string(), 10)
    }
}

impl From<B256> for Handle {
    fn from(value: B256) -> Self {
        Self(value)
    }
}

impl From<Handle> for B256 {
    fn from(value: Handle) -> Self {
        value.0
    }
}

impl FromStr for Handle {
    type Err = alloy::hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(B256::from_str(s)?))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_zero_sentinel() {
        let zero: Handle = "0x0000000000000000000000000000000000000000000000000000000000000000"
            .parse()
            .unwrap();
        assert!(zero.is_zero());
        assert_eq!(zero, Handle::ZERO);
        assert_eq!(zero.fhe_type(), Some(FheType::Bool));
    }

    #[test]
    fn test_compose_layout() {
        let handle = Handle::compose(keccak256(b"ticket"), 1, 11155111, FheType::Uint8);
        assert!(!handle.is_zero());
        assert_eq!(handle.index(), 1);
        assert_eq!(handle.chain_id(), 11155111);
        assert_eq!(handle.fhe_type(), Some(FheType::Uint8));
        assert_eq!(handle.as_b256()[31], Handle::VERSION);
    }

    #[test]
    fn test_display_and_serde() {
        let handle = Handle::compose(keccak256(b"score"), 0, 31337, FheType::Uint32);
        let text = handle.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(text.len(), 66);
        assert_eq!(handle.preview(), format!("{}...", &text[..10]));

        let json = serde_json::to_string(&handle).unwrap();
        assert_eq!(json, format!("\"{}\"", text));
        let back: Handle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, handle);
    }

    #[test]
    fn test_max_values() {
        assert_eq!(FheType::Uint8.max_value(), U256::from(255));
        assert_eq!(FheType::Uint32.max_value(), U256::from(u32::MAX));
        assert_eq!(FheType::Bool.max_value(), U256::from(1));
    }
}
