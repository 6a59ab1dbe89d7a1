// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod client;
mod eip712;
mod error;
mod handle;
mod input;
mod keypair;
pub mod local;
pub mod relayer;
pub mod wire;

pub use client::*;
pub use eip712::*;
pub use error::*;
pub use handle::*;
pub use input::*;
pub use keypair::*;
