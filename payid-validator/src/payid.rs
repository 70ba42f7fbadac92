//! PayID identifier parsing.
//!
//! A PayID is a human-readable payment identifier of the form
//! `local-part$domain`, where the domain is either a hostname or an IPv4
//! address. The identifier resolves to a discovery URL of the form
//! `{scheme}://{domain}/{local-part}`.

use crate::{Result, ValidatorError};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    static ref PAYID_RE: Regex = Regex::new(
        r"^[a-z0-9!#@%&*+=?^_`{|}~-]+(?:\.[a-z0-9!#@%&*+=?^_`{|}~-]+)*\$(?:(?:[a-z0-9](?:[a-z0-9-]*[a-z0-9])?\.)+[a-z0-9](?:[a-z-]*[a-z0-9])?|(?:[0-9]{1,3}\.){3}[0-9]{1,3})$"
    )
    .expect("PayID grammar must compile");
}

/// A syntactically valid PayID, split into its local part and domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayId {
    raw: String,
    local_part: String,
    domain: String,
}

impl PayId {
    /// Parse and validate a PayID string against the grammar.
    pub fn parse(raw: &str) -> Result<Self> {
        if !PAYID_RE.is_match(raw) {
            return Err(ValidatorError::invalid_data(
                "payId",
                format!("{raw} is not a valid format for a PayID"),
            ));
        }

        // The grammar guarantees exactly one separator between the parts.
        let (local_part, domain) = raw
            .split_once('$')
            .ok_or_else(|| ValidatorError::invalid_data("payId", "missing separator"))?;

        Ok(Self {
            raw: raw.to_string(),
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        })
    }

    /// The full identifier as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The part before the `$` separator.
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The domain or IPv4 address after the `$` separator.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Derive the discovery request URL for this PayID.
    pub fn request_url(&self, scheme: &str, port: Option<u16>) -> String {
        match port {
            Some(port) => format!("{scheme}://{}:{port}/{}", self.domain, self.local_part),
            None => format!("{scheme}://{}/{}", self.domain, self.local_part),
        }
    }
}

impl FromStr for PayId {
    type Err = ValidatorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}
