// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod contracts;
mod retry;
mod rules;
mod types;

pub use contracts::*;
pub use retry::*;
pub use rules::*;
pub use types::*;
