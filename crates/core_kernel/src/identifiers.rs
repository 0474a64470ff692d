//! Strongly-typed identifiers for domain entities
//!
//! Users are keyed by the numeric id assigned by the `users` table. Wrapping
//! it keeps user ids from being mixed up with other integers such as limits
//! or counts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Identifier of a registered user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates from the raw database id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database id
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Returns the identifier prefix for display
    pub fn prefix() -> &'static str {
        "USR"
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", Self::prefix(), self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Strip prefix if present
        let raw = s.strip_prefix("USR-").unwrap_or(s);
        Ok(Self(raw.parse()?))
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> i64 {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId::new(42).to_string(), "USR-42");
    }

    #[test]
    fn test_id_parsing() {
        let original = UserId::new(7);
        let parsed: UserId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
        assert_eq!("7".parse::<UserId>().unwrap(), original);
    }

    #[test]
    fn test_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId::new(3)).unwrap();
        assert_eq!(json, "3");
    }
}
