use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque key for one connection within the current session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionIdentity(String);

impl ConnectionIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConnectionIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The count shown by the page next to the count actually enumerated.
///
/// Only used for reporting; the harvest itself walks the enumerated identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionCount {
    pub displayed_count: u32,
    pub verified_count: usize,
}

impl ConnectionCount {
    pub fn new(displayed_count: u32, verified_count: usize) -> Self {
        Self {
            displayed_count,
            verified_count,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.displayed_count as usize == self.verified_count
    }
}
