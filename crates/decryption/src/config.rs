// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use purechance_utils::{BACKOFF_DELAY, BACKOFF_MAX_RETRIES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds on every suspension point of a user decryption
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecryptionConfig {
    /// Seconds to wait for the wallet to hand out a signer
    pub signer_timeout: u64,
    /// Seconds the user has to approve the signature prompt
    pub signature_timeout: u64,
    /// Seconds a single oracle round trip may take
    pub oracle_timeout: u64,
    /// Oracle attempts, including the first one
    pub oracle_attempts: u32,
    /// First backoff delay in milliseconds, doubled after each attempt
    pub retry_delay_ms: u64,
}

impl Default for DecryptionConfig {
    fn default() -> Self {
        Self {
            signer_timeout: 30,
            signature_timeout: 300,
            oracle_timeout: 60,
            oracle_attempts: BACKOFF_MAX_RETRIES,
            retry_delay_ms: BACKOFF_DELAY,
        }
    }
}

impl DecryptionConfig {
    pub fn signer_timeout(&self) -> Duration {
        Duration::from_secs(self.signer_timeout)
    }

    pub fn signature_timeout(&self) -> Duration {
        Duration::from_secs(self.signature_timeout)
    }

    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout)
    }
}
