// src/engine/common.rs
//
// Common utilities shared across engine modules.

use crate::error::{PosterError, Result};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run a codec call, converting a panic into `PosterError::InternalPanic`.
///
/// mozjpeg reports libjpeg errors by unwinding, so every call into a codec
/// goes through here and a bad file never takes the whole batch down.
pub fn run_with_panic_policy<T, F>(stage: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(PosterError::internal_panic(format!(
            "{stage}: {}",
            panic_message(payload.as_ref())
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
