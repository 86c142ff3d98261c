//! The `extern "C"` surface
//!
//! Every function decodes its arguments, runs one engine operation on the
//! global [`Bridge`] and encodes the result. Fallible functions take a
//! nullable `HuskError*` and return null or `0` exactly when they wrote an
//! error to it.
//!
//! Passing a handle that isn't live, a handle to the wrong kind of object, a
//! null where a value is required or an unknown variant number breaks the
//! host's side of the contract. Those are logged and fail a debug assertion;
//! release builds return a neutral value (null, `0` or `false`).
//!
//! Strings returned to the host are freed with `husk_string_free`, handles
//! with `husk_release`.

mod misc;
mod shell;
mod syntax;

pub use misc::*;
pub use shell::*;
pub use syntax::*;

use crate::error::{BridgeError, HuskError};
use crate::registry::Handle;
use crate::Bridge;
use std::fmt;

fn bridge() -> &'static Bridge {
    Bridge::global()
}

/// Log a host contract violation and return the fallback
fn violation<T>(fallback: T, what: impl fmt::Display) -> T {
    tracing::error!(%what, "host contract violation");
    debug_assert!(false, "host contract violation: {what}");
    fallback
}

/// Store `value` through `out` unless the host passed null
unsafe fn write_out<T>(out: *mut T, value: T) {
    if !out.is_null() {
        out.write(value);
    }
}

/// Unwrap a domain result, reporting the error through `err_out`
unsafe fn deliver<T>(result: Result<T, BridgeError>, err_out: *mut HuskError, empty: T) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            let reported = bridge().report(err);
            if err_out.is_null() {
                // Nobody can ever release it
                let _ = bridge().registry().release(Handle::from_raw(reported.detail));
            } else {
                err_out.write(reported);
            }
            empty
        }
    }
}
