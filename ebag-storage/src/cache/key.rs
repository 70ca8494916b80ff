//! Cache keys.
//!
//! A `CacheKey` can only hold a non-empty key that fits every store backend,
//! so the accessor never has to handle an unusable key at call time.
//! Namespacing is the caller's job; [`CacheKey::entity`] builds the
//! `<entity>_<id>` form used for single rows.

use std::fmt;
use std::str::FromStr;

use ebag_core::CacheError;

/// Longest key accepted, in bytes. Matches LMDB's default key size limit.
pub const MAX_KEY_LEN: usize = 511;

/// A validated cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validate and wrap a raw key.
    pub fn new(key: impl Into<String>) -> Result<Self, CacheError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(CacheError::InvalidKey {
                key,
                reason: "must not be empty".to_string(),
            });
        }
        if key.len() > MAX_KEY_LEN {
            return Err(CacheError::InvalidKey {
                reason: format!("longer than {} bytes", MAX_KEY_LEN),
                key,
            });
        }
        Ok(Self(key))
    }

    /// Key for a single row: `demo_1`, `user_42`.
    pub fn entity(entity: &str, id: impl fmt::Display) -> Result<Self, CacheError> {
        Self::new(format!("{}_{}", entity, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for CacheKey {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for CacheKey {
    type Error = CacheError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_entity_key_format() -> Result<(), CacheError> {
        assert_eq!(CacheKey::entity("demo", 1)?.as_str(), "demo_1");
        assert_eq!(CacheKey::entity("school_users", 7)?.to_string(), "school_users_7");
        Ok(())
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert!(matches!(
            CacheKey::new(""),
            Err(CacheError::InvalidKey { .. })
        ));
        assert!(CacheKey::new("   ").is_err());
        assert!("\t".parse::<CacheKey>().is_err());
    }

    #[test]
    fn test_rejects_overlong() {
        assert!(CacheKey::new("k".repeat(MAX_KEY_LEN)).is_ok());
        assert!(CacheKey::new("k".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    proptest! {
        /// Entity keys never collide across different ids of the same entity.
        #[test]
        fn prop_entity_keys_are_distinct(a in any::<i64>(), b in any::<i64>()) {
            prop_assume!(a != b);
            let ka = CacheKey::entity("demo", a).expect("entity key is valid");
            let kb = CacheKey::entity("demo", b).expect("entity key is valid");
            prop_assert_ne!(ka, kb);
        }
    }
}
