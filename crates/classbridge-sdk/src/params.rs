//! Parameters: the call-context handed to native methods
//!
//! A borrowed view over the argument values the host marshalled for one
//! call. It never outlives the call frame it was built from.

use crate::convert::FromValue;
use crate::error::{CallResult, NativeError};
use crate::value::Value;

/// Arguments of a single method call.
#[derive(Debug, Clone, Copy)]
pub struct Parameters<'a> {
    args: &'a [Value],
}

impl<'a> Parameters<'a> {
    /// Wrap an argument slice
    pub fn new(args: &'a [Value]) -> Self {
        Self { args }
    }

    /// Build from the raw pointer/length pair of a host call frame.
    ///
    /// A null pointer yields an empty parameter list regardless of `len`.
    ///
    /// # Safety
    /// If non-null, `ptr` must be valid for `len` reads for the lifetime `'a`.
    pub unsafe fn from_raw(ptr: *const Value, len: usize) -> Self {
        if ptr.is_null() || len == 0 {
            return Self { args: &[] };
        }
        Self {
            args: std::slice::from_raw_parts(ptr, len),
        }
    }

    /// Number of arguments passed
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if no arguments were passed
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Get argument at index, failing if the caller passed fewer
    pub fn get(&self, index: usize) -> CallResult<Value> {
        self.args.get(index).copied().ok_or_else(|| {
            NativeError::ArgumentError(format!(
                "missing argument {} (got {})",
                index,
                self.args.len()
            ))
        })
    }

    /// Get argument at index, or `None` if it was not passed
    pub fn optional(&self, index: usize) -> Option<Value> {
        self.args.get(index).copied()
    }

    /// Get argument at index converted to a Rust type
    pub fn get_as<T: FromValue>(&self, index: usize) -> CallResult<T> {
        T::from_value(self.get(index)?)
    }

    /// All arguments
    pub fn as_slice(&self) -> &'a [Value] {
        self.args
    }

    /// Iterate over the arguments in call order
    pub fn iter(&self) -> impl Iterator<Item = &'a Value> {
        self.args.iter()
    }
}
