//! Runtime Value Object
//!
//! Whole minutes. Serialized as `"<n> mins"`; accepted as either a bare
//! integer or that same string.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Runtime(pub i32);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

impl Runtime {
    pub const fn minutes(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, unit) = s.trim().split_once(' ').ok_or(InvalidRuntimeFormat)?;
        if unit != "mins" {
            return Err(InvalidRuntimeFormat);
        }
        number
            .parse::<i32>()
            .map(Runtime)
            .map_err(|_| InvalidRuntimeFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct RuntimeVisitor;

impl Visitor<'_> for RuntimeVisitor {
    type Value = Runtime;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer number of minutes or a \"<n> mins\" string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Runtime, E> {
        i32::try_from(v)
            .map(Runtime)
            .map_err(|_| E::custom(InvalidRuntimeFormat))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Runtime, E> {
        i32::try_from(v)
            .map(Runtime)
            .map_err(|_| E::custom(InvalidRuntimeFormat))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Runtime, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RuntimeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_mins() {
        assert_eq!(serde_json::to_string(&Runtime(102)).unwrap(), r#""102 mins""#);
    }

    #[test]
    fn test_accepts_integer_or_string() {
        assert_eq!(serde_json::from_str::<Runtime>("95").unwrap(), Runtime(95));
        assert_eq!(serde_json::from_str::<Runtime>(r#""95 mins""#).unwrap(), Runtime(95));
        assert!(serde_json::from_str::<Runtime>(r#""95 minutes""#).is_err());
        assert!(serde_json::from_str::<Runtime>(r#""ninety mins""#).is_err());
        assert!(serde_json::from_str::<Runtime>("1.5").is_err());
    }
}
