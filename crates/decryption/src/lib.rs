// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod config;
mod coordinator;
mod decryptor;
mod error;
mod wallet;

pub use config::*;
pub use coordinator::*;
pub use decryptor::*;
pub use error::*;
pub use wallet::*;

#[cfg(test)]
mod test_utils;
