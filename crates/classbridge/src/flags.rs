//! Method and class flags, and their translation to the host encoding.
//!
//! Native flags are a bridge-local bitset. The host expects its own bit
//! values in the method table and the class declaration; the mapping between
//! the two is a fixed lookup table, never computed from bit positions.

use bitflags::bitflags;

use crate::error::UsageError;

/// Host-side access flag encoding written into the method table.
pub mod acc {
    /// Static method
    pub const STATIC: u32 = 0x01;
    /// Abstract method
    pub const ABSTRACT: u32 = 0x02;
    /// Final method
    pub const FINAL: u32 = 0x04;
    /// Public visibility
    pub const PUBLIC: u32 = 0x100;
    /// Protected visibility
    pub const PROTECTED: u32 = 0x200;
    /// Private visibility
    pub const PRIVATE: u32 = 0x400;

    /// Class declared abstract
    pub const EXPLICIT_ABSTRACT_CLASS: u32 = 0x20;
    /// Class declared final
    pub const FINAL_CLASS: u32 = 0x40;
}

bitflags! {
    /// Access and modifier flags of an exposed method.
    ///
    /// An empty set means "public, no modifiers".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MethodFlags: u32 {
        /// Callable from anywhere
        const PUBLIC = 1 << 0;
        /// Callable from the class and its subclasses
        const PROTECTED = 1 << 1;
        /// Callable from the class only
        const PRIVATE = 1 << 2;
        /// Called without an instance. Rejected by `ClassDescriptor::add`:
        /// every bridged call is dispatched to a native instance.
        const STATIC = 1 << 3;
        /// Must be overridden
        const ABSTRACT = 1 << 4;
        /// Cannot be overridden
        const FINAL = 1 << 5;
    }
}

bitflags! {
    /// Flags of an exposed class.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u32 {
        /// Cannot be instantiated
        const ABSTRACT = 1 << 0;
        /// Cannot be extended
        const FINAL = 1 << 1;
    }
}

const VISIBILITY: MethodFlags = MethodFlags::PUBLIC
    .union(MethodFlags::PROTECTED)
    .union(MethodFlags::PRIVATE);

const METHOD_FLAG_MAP: [(MethodFlags, u32); 6] = [
    (MethodFlags::PUBLIC, acc::PUBLIC),
    (MethodFlags::PROTECTED, acc::PROTECTED),
    (MethodFlags::PRIVATE, acc::PRIVATE),
    (MethodFlags::STATIC, acc::STATIC),
    (MethodFlags::ABSTRACT, acc::ABSTRACT),
    (MethodFlags::FINAL, acc::FINAL),
];

const CLASS_FLAG_MAP: [(ClassFlags, u32); 2] = [
    (ClassFlags::ABSTRACT, acc::EXPLICIT_ABSTRACT_CLASS),
    (ClassFlags::FINAL, acc::FINAL_CLASS),
];

impl MethodFlags {
    /// Translate to the host encoding.
    pub fn to_host(self) -> u32 {
        let flags = if self.intersects(VISIBILITY) {
            self
        } else {
            self | MethodFlags::PUBLIC
        };
        METHOD_FLAG_MAP
            .iter()
            .filter(|(native, _)| flags.contains(*native))
            .fold(0, |bits, (_, host)| bits | host)
    }

    pub(crate) fn validate(self, method: &str) -> Result<(), UsageError> {
        if self.contains(MethodFlags::STATIC) {
            return Err(UsageError::StaticMethod(method.to_string()));
        }
        if (self & VISIBILITY).bits().count_ones() > 1 {
            return Err(UsageError::ConflictingVisibility {
                method: method.to_string(),
                flags: format!("{:?}", self),
            });
        }
        Ok(())
    }
}

impl ClassFlags {
    /// Translate to the host encoding.
    pub fn to_host(self) -> u32 {
        CLASS_FLAG_MAP
            .iter()
            .filter(|(native, _)| self.contains(*native))
            .fold(0, |bits, (_, host)| bits | host)
    }

    pub(crate) fn validate(self, class: &str) -> Result<(), UsageError> {
        if self.contains(ClassFlags::ABSTRACT | ClassFlags::FINAL) {
            return Err(UsageError::AbstractFinalClass(class.to_string()));
        }
        Ok(())
    }
}
