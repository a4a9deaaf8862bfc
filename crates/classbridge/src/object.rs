//! Object-allocation bridge
//!
//! Every host object backed by a native class carries one pointer-sized slot
//! ([`HostObject::native`]) owned by the bridge. [`attach`] stores the native
//! instance there when the host allocates the object, [`instance_mut`] is how
//! the trampoline finds the receiver of a call, and [`detach`] hands the
//! instance back when the host frees the object. The mapping is one-to-one.

use std::any::Any;
use std::ffi::c_void;
use std::ptr;

/// Downcasting support for [`Base`]. Implemented for every `'static` type.
pub trait AsAny: Any {
    /// As `&dyn Any`
    fn as_any(&self) -> &dyn Any;
    /// As `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Base type of every native class exposed to the host.
///
/// ```ignore
/// #[derive(Default)]
/// struct File { fd: Option<i32> }
///
/// impl Base for File {}
/// ```
pub trait Base: AsAny {
    /// Name used in diagnostics
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Host-side object header holding the native instance slot.
#[repr(C)]
#[derive(Debug)]
pub struct HostObject {
    /// Bridge-owned pointer to the native instance; null when detached
    pub native: *mut c_void,
}

impl HostObject {
    /// Object with no native instance attached
    pub const fn empty() -> Self {
        Self {
            native: ptr::null_mut(),
        }
    }

    /// Whether a native instance is attached
    pub fn is_attached(&self) -> bool {
        !self.native.is_null()
    }
}

impl Default for HostObject {
    fn default() -> Self {
        Self::empty()
    }
}

/// Attach a native instance to a host object.
///
/// Fails, handing the instance back, when `obj` is null or already has an
/// instance attached.
///
/// # Safety
/// `obj` must be null or point at a live `HostObject`.
pub unsafe fn attach(obj: *mut HostObject, instance: Box<dyn Base>) -> Result<(), Box<dyn Base>> {
    let Some(obj) = obj.as_mut() else {
        return Err(instance);
    };
    if obj.is_attached() {
        return Err(instance);
    }
    obj.native = Box::into_raw(Box::new(instance)) as *mut c_void;
    Ok(())
}

/// Native instance backing a host object.
///
/// # Safety
/// `obj` must be null or point at a live `HostObject` whose slot was filled
/// by [`attach`]. The returned borrow must end before the object is detached.
pub unsafe fn instance_mut<'a>(obj: *mut HostObject) -> Option<&'a mut dyn Base> {
    let obj = obj.as_mut()?;
    let slot = (obj.native as *mut Box<dyn Base>).as_mut()?;
    Some(&mut **slot)
}

/// Detach and return the native instance of a host object.
///
/// # Safety
/// Same as [`instance_mut`]; no borrow of the instance may be live.
pub unsafe fn detach(obj: *mut HostObject) -> Option<Box<dyn Base>> {
    let obj = obj.as_mut()?;
    if !obj.is_attached() {
        return None;
    }
    let slot = Box::from_raw(obj.native as *mut Box<dyn Base>);
    obj.native = ptr::null_mut();
    Some(*slot)
}
