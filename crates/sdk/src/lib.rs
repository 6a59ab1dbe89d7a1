// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub use purechance_fhevm as fhevm;

#[cfg(feature = "contracts")]
pub use purechance_contracts as contracts;

#[cfg(feature = "decryption")]
pub use purechance_decryption as decryption;

#[cfg(feature = "game")]
pub use purechance_game as game;

#[cfg(feature = "server")]
pub use purechance_relayer_server as relayer_server;
