//! Configuration helpers.
//!
//! The [`LiteralOrEnv`] wrapper type allows configuration values to be specified
//! either as literal values or as references to environment variables:
//!
//! ```json
//! {
//!   "factory": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
//!   "chain": "$CHAIN_ID",
//!   "secret": "${DEPLOYER_KEY}"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"0x5FbDB2315678afecb367f032d93F642f64180aa3"`
/// - Simple env var: `"$FACTORY_ADDRESS"`
/// - Braced env var: `"${FACTORY_ADDRESS}"`
///
/// The wrapper implements `Deref` to provide transparent access to the inner type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn from_literal(value: T) -> Self {
        Self(value)
    }

    /// Get a reference to the inner value
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|rest| rest.strip_suffix('}')) {
            Some(braced)
        } else if let Some(var_name) = s.strip_prefix('$') {
            let is_name = !var_name.is_empty()
                && var_name.chars().all(|c| c.is_alphanumeric() || c == '_');
            is_name.then_some(var_name)
        } else {
            None
        }
    }
}

impl<T> Deref for LiteralOrEnv<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

impl<T> Serialize for LiteralOrEnv<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_value() {
        let value: LiteralOrEnv<u64> = serde_json::from_str("\"31337\"").unwrap();
        assert_eq!(*value, 31337);
    }

    #[test]
    fn test_env_var_syntax() {
        assert_eq!(LiteralOrEnv::<u64>::parse_env_var_syntax("$FOO_1"), Some("FOO_1"));
        assert_eq!(LiteralOrEnv::<u64>::parse_env_var_syntax("${FOO}"), Some("FOO"));
        assert_eq!(LiteralOrEnv::<u64>::parse_env_var_syntax("$"), None);
        assert_eq!(LiteralOrEnv::<u64>::parse_env_var_syntax("$FOO-BAR"), None);
        assert_eq!(LiteralOrEnv::<u64>::parse_env_var_syntax("FOO"), None);
    }

    #[test]
    fn test_resolves_env_var() {
        // SAFETY: the variable name is unique to this test.
        unsafe { std::env::set_var("PAYCHAN_TYPES_TEST_DURATION", "600") };
        let value: LiteralOrEnv<u64> =
            serde_json::from_str("\"${PAYCHAN_TYPES_TEST_DURATION}\"").unwrap();
        assert_eq!(value.into_inner(), 600);
    }

    #[test]
    fn test_missing_env_var() {
        let result =
            serde_json::from_str::<LiteralOrEnv<u64>>("\"$PAYCHAN_TYPES_TEST_DOES_NOT_EXIST\"");
        assert!(result.is_err());
    }
}
