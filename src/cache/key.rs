// Cache keys for query results.
// A key is an ordered list of scalar segments; a bare string is a one-segment key.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One scalar component of a cache key.
///
/// Integers are kept in one canonical form so that equal numbers are equal
/// segments whatever their Rust type: `Int` for anything that fits in `i64`,
/// `UInt` only above `i64::MAX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySegment {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl KeySegment {
    fn canonical(self) -> Self {
        match self {
            KeySegment::UInt(value) => KeySegment::from(value),
            other => other,
        }
    }
}

impl From<&str> for KeySegment {
    fn from(value: &str) -> Self {
        KeySegment::Str(value.to_string())
    }
}

impl From<String> for KeySegment {
    fn from(value: String) -> Self {
        KeySegment::Str(value)
    }
}

impl From<&String> for KeySegment {
    fn from(value: &String) -> Self {
        KeySegment::Str(value.clone())
    }
}

impl From<i32> for KeySegment {
    fn from(value: i32) -> Self {
        KeySegment::Int(value.into())
    }
}

impl From<i64> for KeySegment {
    fn from(value: i64) -> Self {
        KeySegment::Int(value)
    }
}

impl From<u32> for KeySegment {
    fn from(value: u32) -> Self {
        KeySegment::Int(value.into())
    }
}

impl From<u64> for KeySegment {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => KeySegment::Int(value),
            Err(_) => KeySegment::UInt(value),
        }
    }
}

impl From<bool> for KeySegment {
    fn from(value: bool) -> Self {
        KeySegment::Bool(value)
    }
}

/// Identifies a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<KeySegment>);

impl CacheKey {
    pub fn new(segments: Vec<KeySegment>) -> Self {
        Self(segments.into_iter().map(KeySegment::canonical).collect())
    }

    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Append a segment, e.g. a page number, to a base key.
    pub fn with(mut self, segment: impl Into<KeySegment>) -> Self {
        self.0.push(segment.into().canonical());
        self
    }

    /// Whether `prefix` matches the leading segments of this key.
    pub fn starts_with(&self, prefix: &CacheKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self(vec![value.into()])
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self(vec![value.into()])
    }
}

impl From<&CacheKey> for CacheKey {
    fn from(value: &CacheKey) -> Self {
        value.clone()
    }
}

impl<S: Into<KeySegment>> From<Vec<S>> for CacheKey {
    fn from(value: Vec<S>) -> Self {
        Self::new(value.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<KeySegment>, const N: usize> From<[S; N]> for CacheKey {
    fn from(value: [S; N]) -> Self {
        Self::new(value.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_string_is_single_segment() {
        let key = CacheKey::from("foo");
        assert_eq!(key.segments(), &[KeySegment::Str("foo".to_string())]);
        assert_eq!(key, CacheKey::from(["foo"]));
    }

    #[test]
    fn test_sequence_used_unchanged() {
        let key = CacheKey::from(vec!["foo", "bar"]);
        assert_eq!(
            key.segments(),
            &[
                KeySegment::Str("foo".to_string()),
                KeySegment::Str("bar".to_string())
            ]
        );
        assert_ne!(key, CacheKey::from(vec!["bar", "foo"]));
    }

    #[test]
    fn test_mixed_segments() {
        let key = CacheKey::from("items").with(42u64).with(true);
        assert_eq!(key.to_string(), r#"["items",42,true]"#);
    }

    #[test]
    fn test_integer_type_does_not_change_identity() {
        let small = CacheKey::from("items").with(1);
        assert_eq!(small, CacheKey::from("items").with(1u64));
        assert_eq!(small, CacheKey::from("items").with(1u32));
        assert_eq!(small, CacheKey::from("items").with(1i64));
        assert_eq!(small, CacheKey::new(vec!["items".into(), KeySegment::UInt(1)]));

        let huge = CacheKey::from("items").with(u64::MAX);
        assert_eq!(huge.segments()[1], KeySegment::UInt(u64::MAX));
    }

    #[test]
    fn test_serde_keeps_identity() {
        for key in [
            CacheKey::from("items").with(7u64),
            CacheKey::from("items").with(-3),
            CacheKey::from("items").with(u64::MAX).with(false),
        ] {
            let json = serde_json::to_string(&key).unwrap();
            let back: CacheKey = serde_json::from_str(&json).unwrap();
            assert_eq!(back, key);
        }
    }

    #[test]
    fn test_prefix_matching() {
        let key = CacheKey::from("items").with(1);
        assert!(key.starts_with(&CacheKey::from("items")));
        assert!(key.starts_with(&key));
        assert!(!key.starts_with(&CacheKey::from("users")));
        assert!(!CacheKey::from("items").starts_with(&key));
    }
}
