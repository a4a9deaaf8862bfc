//! Host binary contract: the flat method table and the call frame
//!
//! Every type in this module is `#[repr(C)]` and is read directly by the host
//! runtime. The host does not copy the table; it keeps raw pointers into it
//! for as long as the class exists, so [`MethodTable`] owns every byte the
//! entries point at and never reallocates after it is built.
//!
//! ```text
//! MethodTable
//!   entries: [FunctionEntry; N + 1]        <- handed to the host
//!     [i].name     -> names[i]            (NUL-terminated)
//!     [i].handler  -> trampoline::dispatch
//!     [i].arg_info -> args[i].header       (carries the method identity)
//!     [i].flags    =  host access flags
//!     [N]          =  all-zero sentinel
//! ```

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use classbridge_sdk::Value;

use crate::object::HostObject;

/// Uniform native entry point the host invokes for every method.
pub type Handler = unsafe extern "C" fn(frame: *mut CallFrame, return_value: *mut Value);

/// One row of the flat method table.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FunctionEntry {
    /// NUL-terminated method name
    pub name: *const c_char,
    /// Native handler; always the dispatch trampoline for bridge tables
    pub handler: Option<Handler>,
    /// Argument descriptor block, also the per-call identity
    pub arg_info: *const ArgInfoHeader,
    /// Access flags in host encoding
    pub flags: u32,
}

impl FunctionEntry {
    /// Terminating entry: every field null or zero
    pub const SENTINEL: FunctionEntry = FunctionEntry {
        name: ptr::null(),
        handler: None,
        arg_info: ptr::null(),
        flags: 0,
    };

    /// Check whether this is the terminating entry
    pub fn is_sentinel(&self) -> bool {
        self.name.is_null() && self.handler.is_none() && self.arg_info.is_null() && self.flags == 0
    }

    /// Method name
    ///
    /// # Safety
    /// The entry must come from a live table.
    pub unsafe fn name(&self) -> Option<&CStr> {
        if self.name.is_null() {
            None
        } else {
            Some(CStr::from_ptr(self.name))
        }
    }
}

/// Head of an argument descriptor block.
///
/// The host echoes this pointer back in [`CallFrame::arg_info`], which is how
/// the trampoline learns which method is being called.
#[repr(C)]
#[derive(Debug)]
pub struct ArgInfoHeader {
    /// Method identity in the arena, never zero for a live method
    pub method: u64,
    /// Number of leading arguments the caller must pass
    pub required_num_args: u32,
    /// Number of declared arguments
    pub num_args: u32,
    /// `num_args` argument descriptors
    pub args: *const ArgInfo,
}

/// Descriptor of one declared argument.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ArgInfo {
    /// NUL-terminated argument name
    pub name: *const c_char,
    /// Non-zero when passed by reference
    pub by_reference: u8,
    /// Non-zero when null is accepted
    pub allow_null: u8,
    /// `TypeHint` discriminant
    pub type_hint: u8,
}

/// Exception raised by a native method, handed to the host.
///
/// Allocated by the trampoline; the host frees it with
/// `classbridge_exception_free` (or [`HostException::into_message`]).
#[repr(C)]
#[derive(Debug)]
pub struct HostException {
    /// NUL-terminated message
    pub message: *mut c_char,
}

impl HostException {
    pub(crate) fn into_raw(message: &str) -> *mut HostException {
        let sanitized = message.replace('\0', "\\0");
        let message = CString::new(sanitized)
            .map(CString::into_raw)
            .unwrap_or(ptr::null_mut());
        Box::into_raw(Box::new(HostException { message }))
    }

    /// Take ownership of an exception, returning its message and freeing it.
    ///
    /// # Safety
    /// `exception` must have been produced by the trampoline and not freed.
    pub unsafe fn into_message(exception: *mut HostException) -> Option<String> {
        if exception.is_null() {
            return None;
        }
        let exception = Box::from_raw(exception);
        if exception.message.is_null() {
            return Some(String::new());
        }
        let message = CString::from_raw(exception.message);
        Some(message.to_string_lossy().into_owned())
    }
}

/// Per-call structure the host passes to the handler.
#[repr(C)]
#[derive(Debug)]
pub struct CallFrame {
    /// Object the method is called on
    pub this: *mut HostObject,
    /// `arg_info` of the table entry being dispatched
    pub arg_info: *const ArgInfoHeader,
    /// Marshalled argument values
    pub args: *const Value,
    /// Number of values at `args`
    pub arg_count: usize,
    /// Out-slot receiving an exception when the call fails (may be null)
    pub exception: *mut *mut HostException,
}

/// Owned storage behind one entry's `arg_info` pointer.
#[derive(Debug)]
pub(crate) struct ArgInfoBlock {
    header: Box<ArgInfoHeader>,
    _infos: Box<[ArgInfo]>,
    _names: Vec<CString>,
}

impl ArgInfoBlock {
    pub(crate) fn new(method: u64, required: u32, names: Vec<CString>, mut infos: Vec<ArgInfo>) -> Self {
        for (info, name) in infos.iter_mut().zip(&names) {
            info.name = name.as_ptr();
        }
        let infos = infos.into_boxed_slice();
        let header = Box::new(ArgInfoHeader {
            method,
            required_num_args: required,
            num_args: infos.len() as u32,
            args: if infos.is_empty() {
                ptr::null()
            } else {
                infos.as_ptr()
            },
        });
        Self {
            header,
            _infos: infos,
            _names: names,
        }
    }

    pub(crate) fn header_ptr(&self) -> *const ArgInfoHeader {
        &*self.header
    }
}

/// One method's contribution to the table, in insertion order.
pub(crate) struct TableRow {
    pub(crate) name: CString,
    pub(crate) flags: u32,
    pub(crate) args: ArgInfoBlock,
}

/// The materialized, sentinel-terminated method table and everything its
/// entries point at.
#[derive(Debug)]
pub struct MethodTable {
    entries: Box<[FunctionEntry]>,
    _names: Vec<CString>,
    _args: Vec<ArgInfoBlock>,
}

impl MethodTable {
    pub(crate) fn build(rows: Vec<TableRow>, handler: Handler) -> Self {
        let mut entries = Vec::with_capacity(rows.len() + 1);
        let mut names = Vec::with_capacity(rows.len());
        let mut args = Vec::with_capacity(rows.len());

        for row in rows {
            entries.push(FunctionEntry {
                name: row.name.as_ptr(),
                handler: Some(handler),
                arg_info: row.args.header_ptr(),
                flags: row.flags,
            });
            names.push(row.name);
            args.push(row.args);
        }
        entries.push(FunctionEntry::SENTINEL);

        Self {
            entries: entries.into_boxed_slice(),
            _names: names,
            _args: args,
        }
    }

    /// Pointer handed to the host
    pub fn as_ptr(&self) -> *const FunctionEntry {
        self.entries.as_ptr()
    }

    /// All entries including the sentinel
    pub fn entries(&self) -> &[FunctionEntry] {
        &self.entries
    }

    /// Number of entries including the sentinel
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a built table holds at least the sentinel
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of method entries, excluding the sentinel
    pub fn method_count(&self) -> usize {
        self.entries.len() - 1
    }
}

/// Walk a sentinel-terminated table the way the host does.
///
/// # Safety
/// `table` must point at a live, sentinel-terminated table.
pub unsafe fn walk_table<'a>(table: *const FunctionEntry) -> Vec<&'a FunctionEntry> {
    let mut entries = Vec::new();
    if table.is_null() {
        return entries;
    }
    let mut cursor = table;
    loop {
        let entry = &*cursor;
        if entry.is_sentinel() {
            break;
        }
        entries.push(entry);
        cursor = cursor.add(1);
    }
    entries
}
