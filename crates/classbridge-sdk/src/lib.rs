//! classbridge SDK - value and call-context types
//!
//! This crate holds the types a native method sees when the host runtime
//! calls it: the tagged [`Value`], the [`Parameters`] call-context and the
//! [`NativeError`] a method raises to make the call fail. Extension authors
//! depend on it through `classbridge`; hosts depend on it directly for the
//! value layout.
//!
//! # Example
//!
//! ```ignore
//! use classbridge_sdk::{CallResult, Parameters, Value};
//!
//! fn add(params: &Parameters) -> CallResult<Value> {
//!     let a: i64 = params.get_as(0)?;
//!     let b: i64 = params.get_as(1)?;
//!     Ok(Value::int(a + b))
//! }
//! ```

#![warn(missing_docs)]

pub mod convert;
pub mod error;
pub mod params;
pub mod value;

pub use convert::{FromValue, IntoValue};
pub use error::{CallResult, NativeError};
pub use params::Parameters;
pub use value::Value;
