//! In-process host runtime used by the integration tests.
//!
//! Behaves like a table-driven host: it walks the method table it is given,
//! rejects duplicate class names and duplicate method names, keeps the raw
//! table pointer (not a copy) and calls methods through the entry handlers.

#![allow(dead_code)]

use std::collections::HashSet;
use std::ffi::c_void;
use std::ptr;

use classbridge::sdk::Value;
use classbridge::{
    CallFrame, ClassDeclaration, ClassEntry, FunctionEntry, HostError, HostException, HostObject,
    HostRuntime,
};

/// What the host remembers about one declared class
pub struct DeclaredClass {
    pub name: String,
    pub flags: u32,
    pub functions: *const FunctionEntry,
    handle: Box<u8>,
}

impl DeclaredClass {
    /// Entries up to (excluding) the sentinel
    pub fn entries(&self) -> Vec<FunctionEntry> {
        unsafe { classbridge::table::walk_table(self.functions) }
            .into_iter()
            .copied()
            .collect()
    }

    /// Entry names in table order
    pub fn method_names(&self) -> Vec<String> {
        self.entries()
            .iter()
            .map(|e| unsafe { e.name() }.unwrap().to_str().unwrap().to_string())
            .collect()
    }

    pub fn entry(&self, method: &str) -> FunctionEntry {
        self.entries()
            .into_iter()
            .find(|e| unsafe { e.name() }.unwrap().to_bytes() == method.as_bytes())
            .unwrap_or_else(|| panic!("no method {method} on {}", self.name))
    }

    /// Entry `index` of the raw table, sentinel included
    pub fn raw_entry(&self, index: usize) -> FunctionEntry {
        unsafe { *self.functions.add(index) }
    }
}

#[derive(Default)]
pub struct RecordingHost {
    pub classes: Vec<DeclaredClass>,
    pub released: Vec<String>,
    pub declare_calls: usize,
    pub reject: Option<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(&self, name: &str) -> &DeclaredClass {
        self.classes
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("class {name} not declared"))
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.classes.iter().any(|c| c.name == name)
    }

    /// Call `method` on `obj` the way the host would.
    ///
    /// Returns the value left in the return slot and the exception message,
    /// if one was raised.
    pub fn call(&self, class: &str, method: &str, obj: &mut HostObject, args: &[Value]) -> (Value, Option<String>) {
        let entry = self.class(class).entry(method);
        call_entry(&entry, obj, args)
    }
}

/// Invoke a table entry directly.
pub fn call_entry(entry: &FunctionEntry, obj: *mut HostObject, args: &[Value]) -> (Value, Option<String>) {
    let mut exception: *mut HostException = ptr::null_mut();
    let mut frame = CallFrame {
        this: obj,
        arg_info: entry.arg_info,
        args: if args.is_empty() { ptr::null() } else { args.as_ptr() },
        arg_count: args.len(),
        exception: &mut exception,
    };
    // Pre-filled so void calls are seen to overwrite the slot
    let mut ret = Value::float(-0.5);
    let handler = entry.handler.expect("entry has a handler");
    unsafe { handler(&mut frame, &mut ret) };
    let message = unsafe { HostException::into_message(exception) };
    (ret, message)
}

impl HostRuntime for RecordingHost {
    fn declare_class(&mut self, declaration: &ClassDeclaration<'_>) -> Result<ClassEntry, HostError> {
        self.declare_calls += 1;
        let name = declaration
            .name()
            .to_str()
            .map_err(|_| HostError::new("class name is not UTF-8"))?
            .to_string();

        if self.reject.as_deref() == Some(name.as_str()) {
            return Err(HostError::new(format!("class {name} refused")));
        }
        if self.is_declared(&name) {
            return Err(HostError::new(format!("cannot redeclare class {name}")));
        }

        let mut seen = HashSet::new();
        for entry in declaration.entries() {
            let method = unsafe { entry.name() }
                .ok_or_else(|| HostError::new("entry without a name"))?
                .to_string_lossy()
                .to_lowercase();
            if entry.handler.is_none() {
                return Err(HostError::new(format!("{name}::{method} has no handler")));
            }
            if !seen.insert(method.clone()) {
                return Err(HostError::new(format!("cannot redeclare {name}::{method}()")));
            }
        }

        let mut class = DeclaredClass {
            name,
            flags: declaration.flags(),
            functions: declaration.functions(),
            handle: Box::new(0),
        };
        let entry = ClassEntry::from_raw(&mut *class.handle as *mut u8 as *mut c_void)
            .ok_or_else(|| HostError::new("null handle"))?;
        self.classes.push(class);
        Ok(entry)
    }

    fn release_class(&mut self, entry: ClassEntry) {
        let index = self
            .classes
            .iter()
            .position(|c| &*c.handle as *const u8 as *mut c_void == entry.as_ptr())
            .expect("released class was declared");
        let class = self.classes.remove(index);
        self.released.push(class.name);
    }
}
