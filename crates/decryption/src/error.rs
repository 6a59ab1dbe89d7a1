// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use purechance_fhevm::{Handle, RelayerError};
use thiserror::Error;

/// Why a user decryption did not produce plaintexts.
///
/// Wallet failures, oracle failures and local precondition failures are kept
/// apart so callers can tell "the user said no" from "try again later".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("Handle {0} is not set")]
    InvalidHandle(Handle),

    #[error("No wallet signer available: {0}")]
    SignerUnavailable(String),

    #[error("User declined the signature request")]
    UserDeclined,

    #[error("Wallet did not return a signature within {0}s")]
    SignatureTimeout(u64),

    #[error("Decryption oracle unavailable: {0}")]
    OracleUnavailable(String),

    #[error("Decryption oracle rejected the request: {0}")]
    OracleRejected(String),

    #[error("Decryption oracle did not answer within {0}s")]
    OracleTimeout(u64),

    #[error("Decryption oracle returned no value for {0}")]
    OracleIncomplete(Handle),

    #[error("Decryption request was cancelled")]
    Cancelled,

    #[error("Could not build the decryption request: {0}")]
    Internal(String),
}

impl From<RelayerError> for DecryptError {
    fn from(value: RelayerError) -> Self {
        if value.is_transient() {
            DecryptError::OracleUnavailable(value.to_string())
        } else {
            DecryptError::OracleRejected(value.to_string())
        }
    }
}
