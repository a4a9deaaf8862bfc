//! Class descriptors
//!
//! A [`ClassDescriptor`] collects methods while the extension is being
//! defined, then [`initialize`](ClassDescriptor::initialize) materializes the
//! flat method table, declares the class to the host and keeps both the table
//! and the returned handle until [`shutdown`](ClassDescriptor::shutdown).
//!
//! ```text
//!   Defined ──initialize──▶ Registered ──shutdown──▶ Released
//!      │  ▲                     │
//!   add│  │ host rejected       └── add / initialize / try_clone: UsageError
//!      ▼  │
//! ```

use std::ffi::CString;
use std::fmt;
use std::sync::Arc;

use crate::arena::{Lease, MethodId};
use crate::arguments::Arguments;
use crate::error::{validate_name, BridgeError, BridgeResult, UsageError};
use crate::flags::{ClassFlags, MethodFlags};
use crate::host::{ClassDeclaration, ClassEntry, HostRuntime};
use crate::method::{Callback, ErasedMethod, MethodDescriptor};
use crate::object::Base;
use crate::table::{FunctionEntry, MethodTable, TableRow};
use crate::trampoline;

/// Everything a registered class must keep alive for the host.
///
/// Released exactly once through [`Registration::release`]. Dropped without
/// being released, it leaks the table and the arena entries rather than
/// freeing memory the host may still point into.
struct Registration {
    entry: ClassEntry,
    name: Option<CString>,
    table: Option<MethodTable>,
    lease: Option<Lease>,
    released: bool,
}

impl Registration {
    fn release(mut self, host: &mut dyn HostRuntime) {
        host.release_class(self.entry);
        self.released = true;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!(
            class = ?self.name,
            "class dropped while still registered; leaking its method table"
        );
        std::mem::forget(self.table.take());
        std::mem::forget(self.lease.take());
        std::mem::forget(self.name.take());
    }
}

enum State {
    Defined,
    Registered(Registration),
    Released,
}

/// Description of one native class `T` exposed to the host.
pub struct ClassDescriptor<T: Base> {
    name: String,
    flags: ClassFlags,
    methods: Vec<Arc<MethodDescriptor<T>>>,
    constructor: fn() -> Box<dyn Base>,
    state: State,
}

impl<T: Base + Default> ClassDescriptor<T> {
    /// Class with no flags
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: ClassFlags::empty(),
            methods: Vec::new(),
            constructor: || Box::new(T::default()),
            state: State::Defined,
        }
    }

    /// Class with flags; abstract and final together is a usage error
    pub fn with_flags(name: impl Into<String>, flags: ClassFlags) -> BridgeResult<Self> {
        let mut class = Self::new(name);
        flags.validate(&class.name)?;
        class.flags = flags;
        Ok(class)
    }
}

impl<T: Base> ClassDescriptor<T> {
    /// Add a method.
    ///
    /// Duplicate names are not checked here; the host reports them when the
    /// class is declared.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        callback: Callback<T>,
        flags: MethodFlags,
        arguments: Arguments,
    ) -> BridgeResult<&mut Self> {
        let name = name.into();
        if !matches!(self.state, State::Defined) {
            return Err(UsageError::AddAfterInitialize {
                class: self.name.clone(),
                method: name,
            }
            .into());
        }
        validate_name(&name)?;
        flags.validate(&name)?;
        arguments.validate(&name)?;

        tracing::trace!(class = %self.name, method = %name, shape = ?callback.shape(), "method added");
        self.methods.push(Arc::new(MethodDescriptor::new(
            name, callback, flags, arguments,
        )));
        Ok(self)
    }

    /// Add a public method with no declared arguments
    pub fn method(&mut self, name: impl Into<String>, callback: Callback<T>) -> BridgeResult<&mut Self> {
        self.add(name, callback, MethodFlags::empty(), Arguments::new())
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class flags
    pub fn flags(&self) -> ClassFlags {
        self.flags
    }

    /// Methods in insertion order
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor<T>> {
        self.methods.iter().map(|m| &**m)
    }

    /// Number of methods
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Whether the class is currently declared to the host
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, State::Registered(_))
    }

    /// Host handle, once initialized
    pub fn class_entry(&self) -> Option<ClassEntry> {
        self.registration().map(|r| r.entry)
    }

    /// Materialized table including the sentinel, once initialized
    pub fn table(&self) -> Option<&[FunctionEntry]> {
        self.registration()
            .and_then(|r| r.table.as_ref())
            .map(MethodTable::entries)
    }

    /// Arena identities of the methods, in table order, once initialized
    pub fn method_ids(&self) -> Option<&[MethodId]> {
        self.registration()
            .and_then(|r| r.lease.as_ref())
            .map(Lease::ids)
    }

    fn registration(&self) -> Option<&Registration> {
        match &self.state {
            State::Registered(registration) => Some(registration),
            _ => None,
        }
    }

    /// Fresh native instance for a new host object
    pub fn construct(&self) -> Box<dyn Base> {
        (self.constructor)()
    }

    /// Copy the method set of a class that has not been initialized.
    pub fn try_clone(&self) -> BridgeResult<Self> {
        if !matches!(self.state, State::Defined) {
            return Err(UsageError::CopyAfterInitialize(self.name.clone()).into());
        }
        Ok(Self {
            name: self.name.clone(),
            flags: self.flags,
            methods: self.methods.clone(),
            constructor: self.constructor,
            state: State::Defined,
        })
    }

    /// Build the method table and declare the class to the host.
    ///
    /// On any failure the descriptor is left exactly as it was: no methods
    /// stay registered and no table outlives the call.
    pub fn initialize(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<ClassEntry> {
        if !matches!(self.state, State::Defined) {
            return Err(UsageError::AlreadyInitialized(self.name.clone()).into());
        }
        validate_name(&self.name)?;
        let class_name =
            CString::new(self.name.as_str()).map_err(|_| BridgeError::InvalidName(self.name.clone()))?;

        let mut lease = Lease::new();
        let mut rows = Vec::with_capacity(self.methods.len());
        for method in &self.methods {
            let id = lease.register(Arc::clone(method) as Arc<dyn ErasedMethod>);
            let name = CString::new(method.name())
                .map_err(|_| BridgeError::InvalidName(method.name().to_string()))?;
            rows.push(TableRow {
                name,
                flags: method.flags().to_host(),
                args: method.arguments().materialize(id)?,
            });
        }
        let table = MethodTable::build(rows, trampoline::dispatch);

        let declaration = ClassDeclaration::new(&class_name, self.flags.to_host(), table.as_ptr());
        let entry = host.declare_class(&declaration).map_err(|source| {
            tracing::warn!(class = %self.name, reason = %source, "host rejected class");
            BridgeError::HostRejected {
                class: self.name.clone(),
                source,
            }
        })?;

        tracing::debug!(
            class = %self.name,
            methods = table.method_count(),
            "class registered"
        );
        self.state = State::Registered(Registration {
            entry,
            name: Some(class_name),
            table: Some(table),
            lease: Some(lease),
            released: false,
        });
        Ok(entry)
    }

    /// Release the host class, then the table and arena entries.
    pub fn shutdown(&mut self, host: &mut dyn HostRuntime) -> BridgeResult<()> {
        match std::mem::replace(&mut self.state, State::Released) {
            State::Registered(registration) => {
                registration.release(host);
                tracing::debug!(class = %self.name, "class released");
                Ok(())
            }
            previous => {
                self.state = previous;
                Err(UsageError::NotRegistered(self.name.clone()).into())
            }
        }
    }
}

impl<T: Base> fmt::Debug for ClassDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("methods", &self.methods)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
