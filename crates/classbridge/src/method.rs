//! Method descriptors and the four native call shapes
//!
//! The set of shapes is closed: a method takes either nothing or the
//! call-context, and either returns nothing or a value. [`Callback`] is a
//! plain tagged union of function pointers over those four, and the
//! trampoline reaches the right one by matching on it.

use std::fmt;

use classbridge_sdk::{CallResult, NativeError, Parameters, Value};

use crate::arguments::Arguments;
use crate::flags::MethodFlags;
use crate::object::Base;

/// Discriminant of a [`Callback`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallShape {
    /// `fn(&mut T)`
    NoArgs = 0,
    /// `fn(&mut T, &Parameters)`
    Params = 1,
    /// `fn(&mut T) -> Value`
    NoArgsReturn = 2,
    /// `fn(&mut T, &Parameters) -> Value`
    ParamsReturn = 3,
}

impl CallShape {
    /// Whether the call-context is passed
    pub fn takes_params(self) -> bool {
        matches!(self, CallShape::Params | CallShape::ParamsReturn)
    }

    /// Whether a value is returned
    pub fn returns_value(self) -> bool {
        matches!(self, CallShape::NoArgsReturn | CallShape::ParamsReturn)
    }
}

/// Native method of class `T`, in exactly one of the four call shapes.
///
/// ```ignore
/// class.method("close", Callback::NoArgs(File::close))?;
/// class.method("read", Callback::ParamsReturn(File::read))?;
/// ```
pub enum Callback<T> {
    /// No arguments, no return value
    NoArgs(fn(&mut T) -> CallResult<()>),
    /// Call-context, no return value
    Params(fn(&mut T, &Parameters<'_>) -> CallResult<()>),
    /// No arguments, returns a value
    NoArgsReturn(fn(&mut T) -> CallResult<Value>),
    /// Call-context, returns a value
    ParamsReturn(fn(&mut T, &Parameters<'_>) -> CallResult<Value>),
}

impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Callback<T> {}

impl<T> Callback<T> {
    /// Call shape of this callback
    pub fn shape(&self) -> CallShape {
        match self {
            Callback::NoArgs(_) => CallShape::NoArgs,
            Callback::Params(_) => CallShape::Params,
            Callback::NoArgsReturn(_) => CallShape::NoArgsReturn,
            Callback::ParamsReturn(_) => CallShape::ParamsReturn,
        }
    }
}

impl<T> fmt::Debug for Callback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback::{:?}", self.shape())
    }
}

/// One exposed method: name, flags, declared arguments and its callback.
///
/// Immutable once created. Shared between the class's method set and the
/// method arena, which the trampoline resolves it from.
pub struct MethodDescriptor<T> {
    name: String,
    flags: MethodFlags,
    arguments: Arguments,
    callback: Callback<T>,
}

impl<T> MethodDescriptor<T> {
    pub(crate) fn new(
        name: String,
        callback: Callback<T>,
        flags: MethodFlags,
        arguments: Arguments,
    ) -> Self {
        Self {
            name,
            flags,
            arguments,
            callback,
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native flags
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Declared arguments
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Call shape
    pub fn shape(&self) -> CallShape {
        self.callback.shape()
    }

    /// Run the callback on `instance`.
    ///
    /// Returns `None` for the shapes without a return value.
    pub fn invoke(&self, instance: &mut T, params: &Parameters<'_>) -> CallResult<Option<Value>> {
        match self.callback {
            Callback::NoArgs(f) => f(instance).map(|()| None),
            Callback::Params(f) => f(instance, params).map(|()| None),
            Callback::NoArgsReturn(f) => f(instance).map(Some),
            Callback::ParamsReturn(f) => f(instance, params).map(Some),
        }
    }
}

impl<T> fmt::Debug for MethodDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("arguments", &self.arguments)
            .field("callback", &self.callback)
            .finish()
    }
}

/// Class-independent view of a method, as stored in the arena.
pub(crate) trait ErasedMethod: Send + Sync {
    fn name(&self) -> &str;

    fn shape(&self) -> CallShape;

    /// Downcast the receiver to the method's class and invoke.
    fn call(&self, instance: &mut dyn Base, params: &Parameters<'_>) -> CallResult<Option<Value>>;
}

impl<T: Base> ErasedMethod for MethodDescriptor<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> CallShape {
        self.callback.shape()
    }

    fn call(&self, instance: &mut dyn Base, params: &Parameters<'_>) -> CallResult<Option<Value>> {
        let got = instance.type_name();
        let receiver = instance
            .as_any_mut()
            .downcast_mut::<T>()
            .ok_or_else(|| NativeError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                got: got.to_string(),
            })?;
        self.invoke(receiver, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        log: Vec<&'static str>,
    }

    impl Base for Probe {}

    impl Probe {
        fn touch(&mut self) -> CallResult<()> {
            self.log.push("touch");
            Ok(())
        }

        fn count(&mut self, params: &Parameters) -> CallResult<Value> {
            self.log.push("count");
            Ok(Value::int(params.len() as i64))
        }
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Callback::<Probe>::NoArgs(Probe::touch).shape(), CallShape::NoArgs);
        assert_eq!(
            Callback::<Probe>::ParamsReturn(Probe::count).shape(),
            CallShape::ParamsReturn
        );
        assert!(CallShape::Params.takes_params());
        assert!(!CallShape::Params.returns_value());
        assert!(CallShape::NoArgsReturn.returns_value());
        assert_eq!(CallShape::ParamsReturn as u8, 3);
    }

    #[test]
    fn test_invoke() {
        let touch = MethodDescriptor::new(
            "touch".to_string(),
            Callback::NoArgs(Probe::touch),
            MethodFlags::empty(),
            Arguments::new(),
        );
        let count = MethodDescriptor::new(
            "count".to_string(),
            Callback::ParamsReturn(Probe::count),
            MethodFlags::empty(),
            Arguments::new(),
        );

        let mut probe = Probe::default();
        let args = [Value::null(), Value::null()];
        let params = Parameters::new(&args);

        assert_eq!(touch.invoke(&mut probe, &params).unwrap(), None);
        assert_eq!(
            count.invoke(&mut probe, &params).unwrap(),
            Some(Value::int(2))
        );
        assert_eq!(probe.log, ["touch", "count"]);
    }

    #[test]
    fn test_erased_call_rejects_foreign_instance() {
        #[derive(Default)]
        struct Other;
        impl Base for Other {}

        let touch = MethodDescriptor::new(
            "touch".to_string(),
            Callback::NoArgs(Probe::touch),
            MethodFlags::empty(),
            Arguments::new(),
        );
        let mut other = Other;
        let err = ErasedMethod::call(&touch, &mut other, &Parameters::new(&[])).unwrap_err();
        assert!(matches!(err, NativeError::TypeMismatch { .. }));
    }
}
