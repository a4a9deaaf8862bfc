//! The dispatch trampoline
//!
//! Every entry of every bridge table points at [`dispatch`]. The host calls
//! it with a [`CallFrame`] and a return slot; the trampoline finds the
//! receiver through the object bridge, the method through the identity in the
//! frame's argument block, and runs the method's callback.
//!
//! Return convention:
//! - shapes without a return value leave `Value::null()` in the slot
//! - shapes with a return value write it to the slot
//! - any failure (including a panic) writes `Value::null()` and stores a
//!   [`HostException`] in `*frame.exception`

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use classbridge_sdk::{CallResult, NativeError, Parameters, Value};

use crate::arena::{self, MethodId};
use crate::object;
use crate::table::{CallFrame, HostException};

/// Uniform handler for every bridged method.
///
/// # Safety
/// `frame` must be null or point at a frame whose pointers are valid for the
/// duration of the call; `return_value` must be null or writable.
pub unsafe extern "C" fn dispatch(frame: *mut CallFrame, return_value: *mut Value) {
    let Some(frame) = frame.as_ref() else {
        tracing::warn!("dispatch called without a call frame");
        return;
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| invoke(frame)))
        .unwrap_or_else(|payload| Err(NativeError::Panic(panic_message(payload))));

    let value = match outcome {
        Ok(Some(value)) => value,
        Ok(None) => Value::null(),
        Err(err) => {
            raise(frame, &err);
            Value::null()
        }
    };

    if let Some(slot) = return_value.as_mut() {
        *slot = value;
    }
}

unsafe fn invoke(frame: &CallFrame) -> CallResult<Option<Value>> {
    let instance = object::instance_mut(frame.this)
        .ok_or_else(|| NativeError::exception("method called on an object without a native instance"))?;

    let header = frame
        .arg_info
        .as_ref()
        .ok_or_else(|| NativeError::exception("call frame carries no method identity"))?;
    let id = MethodId::from_raw(header.method);
    let method = arena::resolve(id).ok_or_else(|| {
        NativeError::exception(format!("method #{} is not registered", id.to_raw()))
    })?;

    let params = Parameters::from_raw(frame.args, frame.arg_count);
    tracing::trace!(
        method = method.name(),
        shape = ?method.shape(),
        args = params.len(),
        "dispatch"
    );
    method.call(instance, &params)
}

unsafe fn raise(frame: &CallFrame, err: &NativeError) {
    tracing::debug!(error = %err, "native method failed");
    let Some(slot) = frame.exception.as_mut() else {
        tracing::warn!(error = %err, "host supplied no exception slot; failure dropped");
        return;
    };
    if !slot.is_null() {
        drop(HostException::into_message(*slot));
    }
    *slot = HostException::into_raw(&err.to_string());
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
