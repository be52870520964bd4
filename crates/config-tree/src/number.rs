//! Lenient numeric conversions used by the typed accessors.
//!
//! Numbers narrow with two's-complement wrapping, floats saturate into integral
//! types, numeric strings are parsed, and anything else reads as zero.

use crate::value::Value;

/// Read a value as an `i32`.
pub fn to_int(value: Option<&Value>) -> i32 {
    match value {
        Some(Value::Int(i)) => *i as i32,
        Some(Value::Float(f)) => *f as i32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Read a value as an `i64`.
pub fn to_long(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Int(i)) => *i,
        Some(Value::Float(f)) => *f as i64,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Read a value as an `f64`.
pub fn to_double(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Int(i)) => *i as f64,
        Some(Value::Float(f)) => *f,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
