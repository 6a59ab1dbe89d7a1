// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

// Custom formatter function for hex display
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(
        f,
        "{}",
        truncate(data.iter().map(|b| format!("{:02x}", b)).collect::<String>())
    )
}

/// truncate a string
fn truncate(s: String) -> String {
    let threshold = 100; // will leave it
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", s.len(), start, end)
    }
}

/// Shorten a long hex string for display eg. `0x3fa9c1d2...`
///
/// `keep` counts characters including the `0x` prefix.
pub fn preview(value: &str, keep: usize) -> String {
    if value.len() <= keep {
        return value.to_string();
    }
    format!("{}...", &value[..keep])
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn test_preview() {
        assert_eq!(preview("0x0123456789abcdef", 10), "0x01234567...");
        assert_eq!(preview("0x01", 10), "0x01");
    }
}
