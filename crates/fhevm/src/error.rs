// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{Handle, SealError};
use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayerError {
    #[error("Relayer unavailable: {0}")]
    Unavailable(String),

    #[error("Relayer rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Signature over the decryption request is invalid: {0}")]
    InvalidSignature(String),

    #[error("Decryption authorization is not valid at {now} (window {start}..{end})")]
    AuthorizationExpired { now: u64, start: u64, end: u64 },

    #[error("Account {account} is not allowed to decrypt {handle}")]
    NotAllowed { handle: Handle, account: Address },

    #[error("Unknown ciphertext handle {0}")]
    UnknownHandle(Handle),

    #[error("Invalid input proof: {0}")]
    InvalidInputProof(String),

    #[error("Encrypted input exceeds {max} bits ({bits} requested)")]
    InputTooLarge { bits: usize, max: usize },

    #[error("Malformed relayer response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Seal(#[from] SealError),
}

impl RelayerError {
    /// Failures worth trying again with the same request
    pub fn is_transient(&self) -> bool {
        matches!(self, RelayerError::Unavailable(_))
    }

    /// HTTP status the local relayer server answers with for this error
    pub fn status_code(&self) -> u16 {
        use RelayerError::*;
        match self {
            Unavailable(_) => 503,
            Rejected { status, .. } => *status,
            InvalidSignature(_) | AuthorizationExpired { .. } | NotAllowed { .. } => 403,
            UnknownHandle(_) => 404,
            InvalidInputProof(_) | InputTooLarge { .. } | Seal(_) => 400,
            MalformedResponse(_) => 502,
        }
    }
}

impl From<reqwest::Error> for RelayerError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            return RelayerError::MalformedResponse(value.to_string());
        }
        match value.status() {
            Some(status) if status.is_client_error() => RelayerError::Rejected {
                status: status.as_u16(),
                message: value.to_string(),
            },
            _ => RelayerError::Unavailable(value.to_string()),
        }
    }
}
