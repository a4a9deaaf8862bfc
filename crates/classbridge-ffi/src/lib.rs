//! C ABI for classbridge
//!
//! A host runtime written in C loads a native module, obtains its
//! `Extension` through `classbridge_get_module()` (generated by
//! `#[extension]`), and drives it through the functions in this crate:
//! - ABI-stable (uses only C-compatible types)
//! - Error handling via out-parameters
//! - The host's class-declaration hooks are passed in as a function table
//! - Manual memory management
//!
//! Method calls do not go through this crate: the host invokes the `handler`
//! of each table entry directly.

use std::ffi::CStr;
use std::ptr;

use classbridge::object;
use classbridge::{
    BridgeError, ClassDeclaration, ClassEntry, Extension, FunctionEntry, HostError, HostException,
    HostObject, HostRuntime,
};
use libc::{c_char, c_int, c_void};

// ============================================================================
// Host Function Table
// ============================================================================

/// Declare a class to the host.
///
/// Returns the host's class handle, or null to reject the class. On
/// rejection the host may point `*reason` at a message that stays valid
/// until the callback returns.
pub type DeclareClassFn = unsafe extern "C" fn(
    context: *mut c_void,
    name: *const c_char,
    flags: u32,
    functions: *const FunctionEntry,
    reason: *mut *const c_char,
) -> *mut c_void;

/// Drop every host reference to a class and its method table.
pub type ReleaseClassFn = unsafe extern "C" fn(context: *mut c_void, entry: *mut c_void);

/// Class-declaration hooks supplied by the host
#[repr(C)]
pub struct ClassbridgeHost {
    /// Passed back unchanged to every hook
    pub context: *mut c_void,
    /// Required
    pub declare_class: Option<DeclareClassFn>,
    /// Optional; without it release is a no-op on the host side
    pub release_class: Option<ReleaseClassFn>,
}

/// Error information
#[repr(C)]
pub struct ClassbridgeError {
    message: *mut c_char,
}

#[derive(Debug, thiserror::Error)]
enum FfiError {
    #[error("Invalid arguments (null pointer)")]
    NullPointer,

    #[error("Invalid UTF-8 in {0}")]
    InvalidUtf8(&'static str),

    #[error("Host function table has no {0}")]
    MissingHook(&'static str),

    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Object already has a native instance")]
    AlreadyAttached,

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// [`HostRuntime`] over a C function table
struct CHost<'a> {
    hooks: &'a ClassbridgeHost,
}

impl HostRuntime for CHost<'_> {
    fn declare_class(&mut self, declaration: &ClassDeclaration<'_>) -> Result<ClassEntry, HostError> {
        let Some(declare) = self.hooks.declare_class else {
            return Err(HostError::new("no declare_class hook"));
        };
        let mut reason: *const c_char = ptr::null();
        // SAFETY: the hook contract is documented on `DeclareClassFn`
        let handle = unsafe {
            declare(
                self.hooks.context,
                declaration.name().as_ptr(),
                declaration.flags(),
                declaration.functions(),
                &mut reason,
            )
        };
        ClassEntry::from_raw(handle).ok_or_else(|| {
            if reason.is_null() {
                HostError::new("class declaration rejected")
            } else {
                // SAFETY: the host keeps `reason` valid until the hook returns
                HostError::new(unsafe { CStr::from_ptr(reason) }.to_string_lossy())
            }
        })
    }

    fn release_class(&mut self, entry: ClassEntry) {
        if let Some(release) = self.hooks.release_class {
            // SAFETY: `entry` came from this host's declare_class hook
            unsafe { release(self.hooks.context, entry.as_ptr()) }
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create error (caller must free with `classbridge_error_free`)
fn create_error(error: &FfiError) -> *mut ClassbridgeError {
    let message = std::ffi::CString::new(error.to_string().replace('\0', "\\0"))
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut());
    Box::into_raw(Box::new(ClassbridgeError { message }))
}

/// Set error out-parameter and return the failure code
unsafe fn fail(error_out: *mut *mut ClassbridgeError, error: FfiError) -> c_int {
    tracing::debug!(error = %error, "ffi call failed");
    if !error_out.is_null() {
        *error_out = create_error(&error);
    }
    -1
}

unsafe fn hooks<'a>(host: *const ClassbridgeHost) -> Result<&'a ClassbridgeHost, FfiError> {
    let hooks = host.as_ref().ok_or(FfiError::NullPointer)?;
    if hooks.declare_class.is_none() {
        return Err(FfiError::MissingHook("declare_class"));
    }
    Ok(hooks)
}

// ============================================================================
// Extension Lifecycle Functions
// ============================================================================

/// Declare every class of an extension to the host
///
/// # Arguments
/// * `ext` - Extension from `classbridge_get_module()`
/// * `host` - Host function table; `declare_class` is required
/// * `error` - Optional pointer to receive error information
///
/// # Returns
/// * 0 on success
/// * -1 on failure; no class of the extension stays declared
///
/// # Safety
/// - `ext` and `host` must be valid
/// - `host->context` must remain valid until shutdown
///
/// # Example (C)
/// ```c
/// ClassbridgeError* error = NULL;
/// Extension* ext = classbridge_get_module();
/// if (classbridge_extension_startup(ext, &hooks, &error) != 0) {
///     fprintf(stderr, "Startup failed: %s\n", classbridge_error_message(error));
///     classbridge_error_free(error);
///     return 1;
/// }
/// ```
#[no_mangle]
pub unsafe extern "C" fn classbridge_extension_startup(
    ext: *mut Extension,
    host: *const ClassbridgeHost,
    error: *mut *mut ClassbridgeError,
) -> c_int {
    let Some(ext) = ext.as_mut() else {
        return fail(error, FfiError::NullPointer);
    };
    let hooks = match hooks(host) {
        Ok(hooks) => hooks,
        Err(e) => return fail(error, e),
    };
    match ext.startup(&mut CHost { hooks }) {
        Ok(()) => 0,
        Err(e) => fail(error, e.into()),
    }
}

/// Release every class of a running extension, last declared first
///
/// # Returns
/// * 0 on success
/// * -1 on failure (extension not running, or invalid arguments)
///
/// # Safety
/// - `ext` and `host` must be valid
/// - No host object of the extension's classes may be called afterwards
#[no_mangle]
pub unsafe extern "C" fn classbridge_extension_shutdown(
    ext: *mut Extension,
    host: *const ClassbridgeHost,
    error: *mut *mut ClassbridgeError,
) -> c_int {
    let Some(ext) = ext.as_mut() else {
        return fail(error, FfiError::NullPointer);
    };
    let hooks = match hooks(host) {
        Ok(hooks) => hooks,
        Err(e) => return fail(error, e),
    };
    match ext.shutdown(&mut CHost { hooks }) {
        Ok(()) => 0,
        Err(e) => fail(error, e.into()),
    }
}

// ============================================================================
// Object Functions
// ============================================================================

/// Attach a fresh native instance of `class_name` to a host object
///
/// # Returns
/// * 0 on success
/// * -1 on failure (unknown class, object already attached, null pointer)
///
/// # Safety
/// - `ext` must be valid, `class_name` a NUL-terminated string
/// - `obj` must point at a live `HostObject`
/// - The instance must be released with `classbridge_object_release()`
#[no_mangle]
pub unsafe extern "C" fn classbridge_object_construct(
    ext: *const Extension,
    class_name: *const c_char,
    obj: *mut HostObject,
    error: *mut *mut ClassbridgeError,
) -> c_int {
    let Some(ext) = ext.as_ref() else {
        return fail(error, FfiError::NullPointer);
    };
    if class_name.is_null() || obj.is_null() {
        return fail(error, FfiError::NullPointer);
    }
    let name = match CStr::from_ptr(class_name).to_str() {
        Ok(s) => s,
        Err(_) => return fail(error, FfiError::InvalidUtf8("class name")),
    };
    let Some(instance) = ext.construct(name) else {
        return fail(error, FfiError::UnknownClass(name.to_string()));
    };
    match object::attach(obj, instance) {
        Ok(()) => 0,
        Err(_) => fail(error, FfiError::AlreadyAttached),
    }
}

/// Drop the native instance attached to a host object
///
/// # Safety
/// - `obj` must be null or point at a live `HostObject`
/// - No call on the object may be in progress
/// - This function is idempotent (safe to call multiple times)
#[no_mangle]
pub unsafe extern "C" fn classbridge_object_release(obj: *mut HostObject) {
    drop(object::detach(obj));
}

// ============================================================================
// Error Handling Functions
// ============================================================================

/// Get the error message
///
/// # Returns
/// * Null-terminated error message string
/// * NULL if error is NULL
///
/// # Safety
/// - Error pointer must be valid
/// - Returned string is valid until `classbridge_error_free()` is called
#[no_mangle]
pub unsafe extern "C" fn classbridge_error_message(error: *const ClassbridgeError) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }

    (*error).message
}

/// Free an error
///
/// # Safety
/// - Error pointer must be null or come from this library
/// - Error must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn classbridge_error_free(error: *mut ClassbridgeError) {
    if error.is_null() {
        return;
    }

    if !(*error).message.is_null() {
        let _ = std::ffi::CString::from_raw((*error).message);
    }

    let _ = Box::from_raw(error);
}

/// Get the message of an exception raised by a native method
///
/// # Safety
/// - Returned string is valid until `classbridge_exception_free()` is called
#[no_mangle]
pub unsafe extern "C" fn classbridge_exception_message(exception: *const HostException) -> *const c_char {
    if exception.is_null() {
        return ptr::null();
    }

    (*exception).message
}

/// Free an exception written to `CallFrame::exception`
///
/// # Safety
/// - Exception pointer must be null or come from a method call
/// - Exception must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn classbridge_exception_free(exception: *mut HostException) {
    drop(HostException::into_message(exception));
}

// ============================================================================
// Utility Functions
// ============================================================================

/// Install a stderr log subscriber when `CLASSBRIDGE_LOG` is set
///
/// # Returns
/// * 1 if a subscriber was installed, 0 otherwise
#[no_mangle]
pub extern "C" fn classbridge_log_init() -> c_int {
    c_int::from(classbridge::logging::init())
}

/// Get the classbridge version string
///
/// # Safety
/// - The returned string is a static string and must not be freed
#[no_mangle]
pub unsafe extern "C" fn classbridge_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

// ============================================================================
// Tests
// ============================================================================
