//! Routing key values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A routing key: either a string or an integer.
///
/// Route values key the ENUM strategy's handler table, carry the output of
/// key-to-enum and command-table converters, and identify actions in
/// path+action allow/deny sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteValue {
    Str(String),
    Int(i64),
}

impl fmt::Display for RouteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteValue::Str(s) => write!(f, "{}", s),
            RouteValue::Int(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for RouteValue {
    fn from(value: &str) -> Self {
        RouteValue::Str(value.to_string())
    }
}

impl From<String> for RouteValue {
    fn from(value: String) -> Self {
        RouteValue::Str(value)
    }
}

impl From<i64> for RouteValue {
    fn from(value: i64) -> Self {
        RouteValue::Int(value)
    }
}

impl From<i32> for RouteValue {
    fn from(value: i32) -> Self {
        RouteValue::Int(i64::from(value))
    }
}

impl From<u32> for RouteValue {
    fn from(value: u32) -> Self {
        RouteValue::Int(i64::from(value))
    }
}
