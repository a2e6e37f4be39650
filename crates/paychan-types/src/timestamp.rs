//! Unix timestamp utilities for channel expiration.
//!
//! The host hands every call a [`UnixTimestamp`]; channels never read a clock
//! themselves. Expiry is `creation time + duration` and a channel may be cancelled
//! once the host timestamp reaches it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch (1970-01-01T00:00:00Z).
///
/// # Serialization
///
/// Serialized as a stringified integer to avoid loss of precision in JSON, since
/// JavaScript's `Number` type cannot safely represent all 64-bit integers.
///
/// ```json
/// "1699999999"
/// ```
///
/// # Example
///
/// ```
/// use paychan_types::timestamp::UnixTimestamp;
///
/// let created = UnixTimestamp::from_secs(1_699_999_900);
/// let expires = created.checked_add(100).unwrap();
/// assert_eq!(expires.as_secs(), 1_700_000_000);
/// assert!(created < expires);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Ord, Eq, Hash, Default)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let ts = s
            .parse::<u64>()
            .map_err(|_| serde::de::Error::custom("timestamp must be a non-negative integer"))?;
        Ok(UnixTimestamp(ts))
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// A system clock set before the Unix epoch reads as `0`.
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Adds `secs` seconds, returning `None` on overflow.
    pub fn checked_add(self, secs: u64) -> Option<Self> {
        self.0.checked_add(secs).map(Self)
    }

    /// Returns `true` once `self` has reached `deadline`.
    pub fn has_reached(&self, deadline: UnixTimestamp) -> bool {
        *self >= deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_string() {
        let ts = UnixTimestamp::from_secs(1_700_000_000);
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"1700000000\"");
        let back: UnixTimestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_rejects_negative() {
        let result = serde_json::from_str::<UnixTimestamp>("\"-1\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_checked_add_overflow() {
        let ts = UnixTimestamp::from_secs(u64::MAX - 1);
        assert_eq!(ts.checked_add(1), Some(UnixTimestamp::from_secs(u64::MAX)));
        assert_eq!(ts.checked_add(2), None);
    }

    #[test]
    fn test_has_reached_is_inclusive() {
        let deadline = UnixTimestamp::from_secs(100);
        assert!(!UnixTimestamp::from_secs(99).has_reached(deadline));
        assert!(UnixTimestamp::from_secs(100).has_reached(deadline));
        assert!(UnixTimestamp::from_secs(101).has_reached(deadline));
    }
}
