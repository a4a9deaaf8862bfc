//! Value: the tagged value representation shared with the host runtime
//!
//! The host writes arguments into a `Value` array and reads the method result
//! back from a `Value` return slot, so the layout is part of the binary
//! contract.
//!
//! # Layout
//!
//! ```text
//! struct Value { tag: u8, data: u64 }
//!   tag 0  null      data = 0
//!   tag 1  bool      data = 0 | 1
//!   tag 2  int       data = i64 bits
//!   tag 3  float     data = f64 bits
//!   tag 4  pointer   data = host-owned address (strings, arrays, objects)
//! ```

/// Tagged dynamic value crossing the host boundary.
///
/// Primitives are stored inline. Heap values stay owned by the host and are
/// carried as opaque pointers that native code never frees.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    tag: u8,
    data: u64,
}

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_PTR: u8 = 4;

unsafe impl Send for Value {}
unsafe impl Sync for Value {}

impl Value {
    /// Create a null value
    #[inline]
    pub const fn null() -> Self {
        Value {
            tag: TAG_NULL,
            data: 0,
        }
    }

    /// Create a boolean value
    #[inline]
    pub const fn bool(b: bool) -> Self {
        Value {
            tag: TAG_BOOL,
            data: b as u64,
        }
    }

    /// Create an integer value
    #[inline]
    pub const fn int(i: i64) -> Self {
        Value {
            tag: TAG_INT,
            data: i as u64,
        }
    }

    /// Create a float value
    #[inline]
    pub fn float(f: f64) -> Self {
        Value {
            tag: TAG_FLOAT,
            data: f.to_bits(),
        }
    }

    /// Create from an opaque host pointer
    ///
    /// # Safety
    /// The pointer must be owned and kept alive by the host runtime.
    #[inline]
    pub unsafe fn from_ptr(ptr: *mut ()) -> Self {
        Value {
            tag: TAG_PTR,
            data: ptr as u64,
        }
    }

    /// Check if this is the null value
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.tag == TAG_NULL
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        (self.tag == TAG_BOOL).then_some(self.data != 0)
    }

    /// Get as integer if this is an int
    pub fn as_int(&self) -> Option<i64> {
        (self.tag == TAG_INT).then_some(self.data as i64)
    }

    /// Get as float if this is a float
    pub fn as_float(&self) -> Option<f64> {
        (self.tag == TAG_FLOAT).then(|| f64::from_bits(self.data))
    }

    /// Get the host pointer if this is a pointer value
    ///
    /// # Safety
    /// The pointer is only meaningful to the host that produced it.
    pub unsafe fn as_ptr(&self) -> Option<*mut ()> {
        (self.tag == TAG_PTR).then_some(self.data as *mut ())
    }

    /// Raw type tag
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Human-readable type name, used in conversion errors
    pub fn type_name(&self) -> &'static str {
        match self.tag {
            TAG_NULL => "null",
            TAG_BOOL => "bool",
            TAG_INT => "int",
            TAG_FLOAT => "float",
            TAG_PTR => "pointer",
            _ => "unknown",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag {
            TAG_NULL => write!(f, "Value::Null"),
            TAG_BOOL => write!(f, "Value::Bool({})", self.data != 0),
            TAG_INT => write!(f, "Value::Int({})", self.data as i64),
            TAG_FLOAT => write!(f, "Value::Float({})", f64::from_bits(self.data)),
            TAG_PTR => write!(f, "Value::Ptr({:#x})", self.data),
            _ => write!(f, "Value::Unknown(tag={}, data={})", self.tag, self.data),
        }
    }
}
