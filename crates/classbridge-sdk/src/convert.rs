//! Conversions between host values and Rust types.

use crate::error::{CallResult, NativeError};
use crate::value::Value;

/// Convert from a host [`Value`] to a Rust type.
///
/// Implement this trait to allow your type to be received as a method argument.
pub trait FromValue: Sized {
    /// Convert, returning an error if the value has the wrong type.
    fn from_value(value: Value) -> CallResult<Self>;
}

/// Convert from a Rust type to a host [`Value`].
///
/// Implement this trait to allow your type to be returned from a method.
pub trait IntoValue {
    /// Convert to a host value.
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, value: Value) -> NativeError {
    NativeError::TypeMismatch {
        expected: expected.to_string(),
        got: value.type_name().to_string(),
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> CallResult<Self> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> CallResult<Self> {
        value.as_int().ok_or_else(|| mismatch("int", value))
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::int(self)
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> CallResult<Self> {
        let wide = i64::from_value(value)?;
        i32::try_from(wide)
            .map_err(|_| NativeError::ArgumentError(format!("{} does not fit in i32", wide)))
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::int(self as i64)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> CallResult<Self> {
        value.as_float().ok_or_else(|| mismatch("float", value))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::float(self)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> CallResult<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::bool(self)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::null()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> CallResult<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(inner) => inner.into_value(),
            None => Value::null(),
        }
    }
}
