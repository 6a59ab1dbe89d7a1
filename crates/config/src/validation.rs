// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use std::str::FromStr;
use url::Url;

/// A URL the client can actually talk to
#[derive(Clone, Debug)]
pub struct ValidUrl(Url);

impl ValidUrl {
    /// Parse and require one of the given schemes
    pub fn with_schemes(s: &str, schemes: &[&str]) -> Result<Self> {
        let url = s.parse::<ValidUrl>()?;
        if !schemes.contains(&url.0.scheme()) {
            bail!(
                "Invalid protocol in {}. Expected one of: {}",
                s,
                schemes
                    .iter()
                    .map(|s| format!("{}://", s))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for ValidUrl {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;
        if url.host_str().is_none() {
            bail!("URL must contain a host: {}", s);
        }
        Ok(ValidUrl(url))
    }
}

impl From<ValidUrl> for String {
    fn from(value: ValidUrl) -> Self {
        value.0.to_string()
    }
}
