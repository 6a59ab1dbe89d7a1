// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod fixtures;
mod mock_contract;
mod wallets;

pub use fixtures::*;
pub use mock_contract::*;
pub use wallets::*;
