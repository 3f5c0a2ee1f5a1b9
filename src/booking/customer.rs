//! Customer identifiers

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DbResult};

/// A customer that can own a booking.
///
/// Valid ids are `1..=99_999_999`, eight digits at most so the id always fits
/// the owner column. Zero means "not booked" in the owner column and is never
/// a valid customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CustomerId(u64);

impl CustomerId {
    pub const MIN: u64 = 1;
    pub const MAX: u64 = 99_999_999;

    pub fn new(value: u64) -> DbResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DbError::InvalidCustomerId(value.to_string()))
        }
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for CustomerId {
    type Error = DbError;

    fn try_from(value: u64) -> DbResult<Self> {
        Self::new(value)
    }
}

impl From<CustomerId> for u64 {
    fn from(id: CustomerId) -> u64 {
        id.0
    }
}

impl FromStr for CustomerId {
    type Err = DbError;

    fn from_str(s: &str) -> DbResult<Self> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<u64>()
            .map_err(|_| DbError::InvalidCustomerId(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds() {
        assert!(CustomerId::new(0).is_err());
        assert_eq!(CustomerId::new(1).unwrap().value(), 1);
        assert_eq!(CustomerId::new(99_999_999).unwrap().value(), 99_999_999);
        assert!(matches!(
            CustomerId::new(100_000_000),
            Err(DbError::InvalidCustomerId(v)) if v == "100000000"
        ));
    }

    #[test]
    fn test_parse() {
        assert_eq!(" 42 ".parse::<CustomerId>().unwrap().value(), 42);
        assert!("abc".parse::<CustomerId>().is_err());
        assert!("-3".parse::<CustomerId>().is_err());
        assert!("".parse::<CustomerId>().is_err());
    }

    #[test]
    fn test_serde_validates() {
        let id: CustomerId = serde_json::from_str("12345678").unwrap();
        assert_eq!(id.to_string(), "12345678");
        assert_eq!(serde_json::to_string(&id).unwrap(), "12345678");
        assert!(serde_json::from_str::<CustomerId>("0").is_err());
    }
}
