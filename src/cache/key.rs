//! Cache Key Module
//!
//! Keys are either strings or integers.

use std::fmt;

use serde::Serialize;

// == Key ==
/// A pool key: a string or an integer.
///
/// `Key::Str("1")` and `Key::Int(1)` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Str(String),
    Int(i64),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => f.write_str(s),
            Key::Int(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<&String> for Key {
    fn from(value: &String) -> Self {
        Key::Str(value.clone())
    }
}

impl From<&Key> for Key {
    fn from(value: &Key) -> Self {
        value.clone()
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(value.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_conversions() {
        assert_eq!(Key::from("a"), Key::Str("a".to_string()));
        assert_eq!(Key::from(String::from("a")), Key::Str("a".to_string()));
        assert_eq!(Key::from(7i32), Key::Int(7));
        assert_eq!(Key::from(7u32), Key::Int(7));
        assert_eq!(Key::from(-7i64), Key::Int(-7));
    }

    #[test]
    fn test_string_and_int_keys_differ() {
        assert_ne!(Key::from("1"), Key::from(1));
        assert_eq!(Key::from("1").to_string(), Key::from(1).to_string());
    }

    #[test]
    fn test_key_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Key::from("a")).unwrap(), r#""a""#);
        assert_eq!(serde_json::to_string(&Key::from(3)).unwrap(), "3");
    }
}
