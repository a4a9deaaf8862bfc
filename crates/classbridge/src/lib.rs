//! classbridge - expose native Rust classes to a dynamic host runtime
//!
//! The host runtime knows classes only through a flat, sentinel-terminated
//! table of `{name, handler, arg_info, flags}` entries and calls every method
//! through one native calling convention. This crate turns ordinary Rust
//! methods, in any of four call shapes, into such a table and dispatches the
//! host's calls back to them.
//!
//! # Example
//!
//! ```ignore
//! use classbridge::{extension, Base, Callback, ClassDescriptor, Extension, MethodFlags};
//! use classbridge::sdk::{CallResult, Parameters, Value};
//!
//! #[derive(Default)]
//! struct Counter { n: i64 }
//!
//! impl Base for Counter {}
//!
//! impl Counter {
//!     fn bump(&mut self, params: &Parameters) -> CallResult<()> {
//!         self.n += params.get_as::<i64>(0)?;
//!         Ok(())
//!     }
//!     fn value(&mut self) -> CallResult<Value> {
//!         Ok(Value::int(self.n))
//!     }
//! }
//!
//! #[extension]
//! fn get_module() -> Extension {
//!     let mut counter = ClassDescriptor::<Counter>::new("Counter");
//!     counter.method("bump", Callback::Params(Counter::bump)).unwrap();
//!     counter.method("value", Callback::NoArgsReturn(Counter::value)).unwrap();
//!
//!     let mut ext = Extension::new("counter", "1.0.0");
//!     ext.add_class(counter).unwrap();
//!     ext
//! }
//! ```

#![warn(missing_docs)]

pub mod arena;
pub mod arguments;
pub mod class;
pub mod error;
pub mod extension;
pub mod flags;
pub mod host;
pub mod logging;
pub mod method;
pub mod object;
pub mod table;
pub mod trampoline;

pub use classbridge_macros::extension;
pub use classbridge_sdk as sdk;

pub use arena::MethodId;
pub use arguments::{Argument, Arguments, TypeHint};
pub use class::ClassDescriptor;
pub use error::{BridgeError, BridgeResult, UsageError};
pub use extension::{ClassRegistration, Extension};
pub use flags::{ClassFlags, MethodFlags};
pub use host::{ClassDeclaration, ClassEntry, HostError, HostRuntime};
pub use method::{CallShape, Callback, MethodDescriptor};
pub use object::{Base, HostObject};
pub use table::{CallFrame, FunctionEntry, Handler, HostException};
