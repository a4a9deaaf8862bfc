//! Host runtime interface
//!
//! The host is the authority on class declarations: it validates names,
//! detects duplicate classes and duplicate method symbols, and hands back an
//! opaque class handle. The bridge stores that handle and never looks inside.

use std::ffi::{c_void, CStr};
use std::ptr::NonNull;

use crate::table::{walk_table, FunctionEntry};

/// Opaque class-identity handle returned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassEntry(NonNull<c_void>);

impl ClassEntry {
    /// Wrap a handle; `None` for null
    pub fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Raw handle
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Reason the host gave for rejecting a declaration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HostError(pub String);

impl HostError {
    /// Build from any message
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Everything the host needs to declare a class.
///
/// Borrowed from the class descriptor for the duration of the call; the
/// `functions` table outlives the declaration and stays valid until the class
/// is released.
#[derive(Debug)]
pub struct ClassDeclaration<'a> {
    name: &'a CStr,
    flags: u32,
    functions: *const FunctionEntry,
}

impl<'a> ClassDeclaration<'a> {
    pub(crate) fn new(name: &'a CStr, flags: u32, functions: *const FunctionEntry) -> Self {
        Self {
            name,
            flags,
            functions,
        }
    }

    /// Class name
    pub fn name(&self) -> &'a CStr {
        self.name
    }

    /// Class flags, host encoding
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Sentinel-terminated method table; keep this pointer, not a copy
    pub fn functions(&self) -> *const FunctionEntry {
        self.functions
    }

    /// Method entries, sentinel excluded
    pub fn entries(&self) -> Vec<&'a FunctionEntry> {
        // SAFETY: declarations are only built over live, terminated tables
        unsafe { walk_table(self.functions) }
    }
}

/// The class-declaration side of the host runtime.
pub trait HostRuntime {
    /// Declare a class. The host may keep `declaration.functions()` until
    /// [`HostRuntime::release_class`] is called for the returned handle.
    fn declare_class(&mut self, declaration: &ClassDeclaration<'_>) -> Result<ClassEntry, HostError>;

    /// The bridge is about to free the class table; drop every reference to
    /// it. Called exactly once per successful declaration.
    fn release_class(&mut self, entry: ClassEntry);
}
