//! Column values - the closed set of kinds that cross the executor boundary
//!
//! Every parameter bound into a statement and every column scanned out of a
//! row is a [`Value`]. Record fields convert into values with [`ToValue`] and
//! back with [`FromValue`].

use serde::{Serialize, Serializer};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Timestamp(SystemTime),
}

/// Discriminant of a [`Value`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Integer,
    Real,
    Text,
    Bool,
    Timestamp,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Text => "text",
            ValueKind::Bool => "bool",
            ValueKind::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Value {
    /// Get the kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Integer(_) => ValueKind::Integer,
            Value::Real(_) => ValueKind::Real,
            Value::Text(_) => ValueKind::Text,
            Value::Bool(_) => ValueKind::Bool,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Nanoseconds since the Unix epoch, negative for instants before it.
    ///
    /// This is the representation timestamps take inside the database. It
    /// covers roughly the years 1678 to 2262; instants outside that span are
    /// out of range.
    pub fn timestamp_nanos(time: SystemTime) -> Result<i64, ConversionError> {
        let nanos = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_nanos()).ok(),
            Err(before) => i64::try_from(before.duration().as_nanos())
                .ok()
                .and_then(i64::checked_neg),
        };
        nanos.ok_or_else(|| ConversionError::OutOfRange {
            target: "i64 nanoseconds",
            value: format!("{:?}", time),
        })
    }

    /// Inverse of [`Value::timestamp_nanos`]
    pub fn timestamp_from_nanos(nanos: i64) -> SystemTime {
        let magnitude = Duration::from_nanos(nanos.unsigned_abs());
        if nanos >= 0 {
            UNIX_EPOCH + magnitude
        } else {
            UNIX_EPOCH - magnitude
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Timestamp(t) => match Value::timestamp_nanos(*t) {
                Ok(nanos) => write!(f, "{}ns", nanos),
                Err(_) => write!(f, "{:?}", t),
            },
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(r) => serializer.serialize_f64(*r),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Timestamp(t) => {
                let nanos = Value::timestamp_nanos(*t).map_err(serde::ser::Error::custom)?;
                serializer.serialize_i64(nanos)
            }
        }
    }
}

/// A value could not be converted between a Rust type and a column value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("expected {expected}, found {found}")]
    Mismatch {
        expected: &'static str,
        found: ValueKind,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: String },
}

impl ConversionError {
    pub fn mismatch(expected: &'static str, found: &Value) -> Self {
        ConversionError::Mismatch {
            expected,
            found: found.kind(),
        }
    }

    fn out_of_range(target: &'static str, value: impl fmt::Display) -> Self {
        ConversionError::OutOfRange {
            target,
            value: value.to_string(),
        }
    }
}

/// Read a record field as a column value.
///
/// Fails only for Rust values with no lossless column form, such as a `u64`
/// above `i64::MAX`.
pub trait ToValue {
    fn to_value(&self) -> Result<Value, ConversionError>;
}

/// Write a column value back into a record field.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

macro_rules! integer_value {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, ConversionError> {
                    Ok(Value::Integer(i64::from(*self)))
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Integer(i64::from(v))
                }
            }
        )+
    };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! wide_integer_value {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Result<Value, ConversionError> {
                    i64::try_from(*self)
                        .map(Value::Integer)
                        .map_err(|_| ConversionError::out_of_range("i64", self))
                }
            }
        )+
    };
}

wide_integer_value!(u64, usize);

macro_rules! scan_integer {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Integer(i) => <$ty>::try_from(i)
                            .map_err(|_| ConversionError::out_of_range(stringify!($ty), i)),
                        other => Err(ConversionError::mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )+
    };
}

scan_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl ToValue for f64 {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Real(*self))
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Real(r) => Ok(r),
            Value::Integer(i) => Ok(i as f64),
            other => Err(ConversionError::mismatch("f64", &other)),
        }
    }
}

impl ToValue for f32 {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Real(f64::from(*self)))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Real(r) => Ok(r as f32),
            Value::Integer(i) => Ok(i as f32),
            other => Err(ConversionError::mismatch("f32", &other)),
        }
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Bool(*self))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            // SQLite has no boolean storage class
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            other => Err(ConversionError::mismatch("bool", &other)),
        }
    }
}

impl ToValue for String {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Text(self.clone()))
    }
}

impl ToValue for &str {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Ok(Value::Text((*self).to_string()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ConversionError::mismatch("string", &other)),
        }
    }
}

impl ToValue for SystemTime {
    fn to_value(&self) -> Result<Value, ConversionError> {
        Value::timestamp_nanos(*self)?;
        Ok(Value::Timestamp(*self))
    }
}

impl FromValue for SystemTime {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::Integer(nanos) => Ok(Value::timestamp_from_nanos(nanos)),
            other => Err(ConversionError::mismatch("timestamp", &other)),
        }
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Result<Value, ConversionError> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Real(f64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<SystemTime> for Value {
    fn from(v: SystemTime) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range_checked() {
        assert_eq!(i32::from_value(Value::Integer(42)).unwrap(), 42);
        let err = u8::from_value(Value::Integer(300)).unwrap_err();
        assert_eq!(
            err,
            ConversionError::OutOfRange {
                target: "u8",
                value: "300".to_string()
            }
        );
    }

    #[test]
    fn test_wide_unsigned() {
        assert_eq!(42u64.to_value().unwrap(), Value::Integer(42));
        assert_eq!(7usize.to_value().unwrap(), Value::Integer(7));
        assert_eq!(u64::from_value(Value::Integer(i64::MAX)).unwrap(), i64::MAX as u64);

        let err = u64::MAX.to_value().unwrap_err();
        assert_eq!(err.to_string(), "18446744073709551615 is out of range for i64");
        assert!(u64::from_value(Value::Integer(-1)).is_err());
        assert!(usize::from_value(Value::Text("1".into())).is_err());
    }

    #[test]
    fn test_bool_accepts_sqlite_integers() {
        assert!(bool::from_value(Value::Integer(1)).unwrap());
        assert!(!bool::from_value(Value::Integer(0)).unwrap());
        assert!(bool::from_value(Value::Integer(2)).is_err());
    }

    #[test]
    fn test_option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::Text("x".into())).unwrap(),
            Some("x".to_string())
        );
        assert_eq!(None::<i64>.to_value().unwrap(), Value::Null);
    }

    #[test]
    fn test_timestamp_keeps_nanoseconds() {
        let t = UNIX_EPOCH + Duration::from_nanos(1_700_000_000_123_456_789);
        assert_eq!(Value::timestamp_nanos(t).unwrap(), 1_700_000_000_123_456_789);
        assert_eq!(Value::timestamp_from_nanos(1_700_000_000_123_456_789), t);
        assert_eq!(
            SystemTime::from_value(Value::Integer(1_700_000_000_123_456_789)).unwrap(),
            t
        );

        let before = Value::timestamp_from_nanos(-5_000_000_001);
        assert_eq!(Value::timestamp_nanos(before).unwrap(), -5_000_000_001);
    }

    #[test]
    fn test_timestamp_out_of_range() {
        let far = UNIX_EPOCH + Duration::from_secs(400 * 365 * 24 * 3600);
        assert!(Value::timestamp_nanos(far).is_err());
        assert!(far.to_value().is_err());
    }

    #[test]
    fn test_mismatch_reports_kind() {
        let err = String::from_value(Value::Integer(3)).unwrap_err();
        assert_eq!(err.to_string(), "expected string, found integer");
    }
}
