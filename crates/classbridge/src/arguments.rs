//! Declared method arguments
//!
//! The bridge does not validate calls against these declarations; the host
//! does, using the argument block materialized into each table entry.

use std::ffi::CString;
use std::ptr;

use crate::arena::MethodId;
use crate::error::{validate_name, BridgeError, BridgeResult, UsageError};
use crate::table::{ArgInfo, ArgInfoBlock};

/// Type hint carried in the argument descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TypeHint {
    /// No hint
    #[default]
    Any = 0,
    /// Boolean
    Bool = 1,
    /// Integer
    Int = 2,
    /// Float
    Float = 3,
    /// String
    String = 4,
    /// Array
    Array = 5,
    /// Object
    Object = 6,
    /// Callable
    Callable = 7,
}

/// One declared argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    name: String,
    required: bool,
    by_reference: bool,
    allow_null: bool,
    type_hint: TypeHint,
}

impl Argument {
    /// Argument the caller must pass
    pub fn required(name: impl Into<String>) -> Self {
        Self::new(name.into(), true)
    }

    /// Argument the caller may omit
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name.into(), false)
    }

    fn new(name: String, required: bool) -> Self {
        Self {
            name,
            required,
            by_reference: false,
            allow_null: false,
            type_hint: TypeHint::Any,
        }
    }

    /// Pass by reference
    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    /// Accept null
    pub fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Attach a type hint
    pub fn typed(mut self, hint: TypeHint) -> Self {
        self.type_hint = hint;
        self
    }

    /// Argument name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the caller must pass it
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether it is passed by reference
    pub fn is_by_reference(&self) -> bool {
        self.by_reference
    }

    /// Whether null is accepted
    pub fn allows_null(&self) -> bool {
        self.allow_null
    }

    /// Type hint
    pub fn type_hint(&self) -> TypeHint {
        self.type_hint
    }
}

/// Ordered argument declarations of one method. Empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    args: Vec<Argument>,
}

impl Arguments {
    /// No declared arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an argument (builder style)
    pub fn with(mut self, arg: Argument) -> Self {
        self.args.push(arg);
        self
    }

    /// Number of declared arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if no arguments are declared
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Number of required arguments
    pub fn required_count(&self) -> usize {
        self.args.iter().filter(|a| a.required).count()
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.args.iter()
    }

    pub(crate) fn validate(&self, method: &str) -> BridgeResult<()> {
        let mut seen_optional = false;
        for arg in &self.args {
            validate_name(&arg.name)?;
            if arg.required && seen_optional {
                return Err(UsageError::RequiredAfterOptional {
                    method: method.to_string(),
                    argument: arg.name.clone(),
                }
                .into());
            }
            seen_optional |= !arg.required;
        }
        Ok(())
    }

    /// Build the owned descriptor block for one table entry.
    pub(crate) fn materialize(&self, method: MethodId) -> BridgeResult<ArgInfoBlock> {
        let mut names = Vec::with_capacity(self.args.len());
        let mut infos = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            let name = CString::new(arg.name.as_str())
                .map_err(|_| BridgeError::InvalidName(arg.name.clone()))?;
            names.push(name);
            infos.push(ArgInfo {
                name: ptr::null(),
                by_reference: arg.by_reference as u8,
                allow_null: arg.allow_null as u8,
                type_hint: arg.type_hint as u8,
            });
        }
        Ok(ArgInfoBlock::new(
            method.to_raw(),
            self.required_count() as u32,
            names,
            infos,
        ))
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(args: Vec<Argument>) -> Self {
        Self { args }
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self {
            args: iter.into_iter().collect(),
        }
    }
}
