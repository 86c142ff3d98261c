//! Expansion and field splitting

use super::{bridge, deliver, violation};
use crate::error::HuskError;
use crate::marshal::{self, c_str, c_str_array, env_map};
use husk_syntax::expand::{Environ, ExitStatus};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CString};

/// Host variable lookup.
///
/// Returns 0 with `*value_out` set when `name` is set, 1 when it is unset,
/// and any other value to fail the expansion with that exit status. The
/// value only needs to stay valid until the callback returns.
pub type HuskLookupFn =
    extern "C" fn(user_data: *mut c_void, name: *const c_char, value_out: *mut *const c_char) -> i32;

/// [`Environ`] over a host lookup callback
struct HostEnviron {
    lookup: HuskLookupFn,
    user_data: *mut c_void,
}

impl Environ for HostEnviron {
    fn lookup(&self, name: &str) -> Result<Option<String>, ExitStatus> {
        // Parameter names never contain NUL
        let Ok(name) = CString::new(name) else {
            return Ok(None);
        };
        let mut value: *const c_char = std::ptr::null();
        match (self.lookup)(self.user_data, name.as_ptr(), &mut value) {
            0 => Ok(Some(
                // SAFETY: the host guarantees value_out is a string or null
                unsafe { marshal::opt_c_str(value) }.unwrap_or_default(),
            )),
            1 => Ok(None),
            status => {
                tracing::debug!(name = ?name, status, "host lookup failed");
                Err(ExitStatus(u8::try_from(status).unwrap_or(u8::MAX)))
            }
        }
    }
}

unsafe fn array_env(env: *const *const c_char, env_len: usize) -> Option<HashMap<String, String>> {
    match c_str_array(env, env_len, "env") {
        Ok(pairs) => Some(env_map(pairs)),
        Err(e) => violation(None, e),
    }
}

fn host_env(lookup: Option<HuskLookupFn>, user_data: *mut c_void) -> Option<HostEnviron> {
    match lookup {
        Some(lookup) => Some(HostEnviron { lookup, user_data }),
        None => violation(None, "null lookup callback"),
    }
}

// === expand ===

/// Expand `text` like a here-document body against `env`, an array of
/// `env_len` `key=value` strings.
///
/// # Safety
///
/// `text` must be a NUL-terminated string, `env` must hold `env_len` of them
/// (or be null when `env_len` is 0), and `err_out` must be null or valid for
/// a write.
#[no_mangle]
pub unsafe extern "C" fn husk_shell_expand(
    text: *const c_char,
    env: *const *const c_char,
    env_len: usize,
    err_out: *mut HuskError,
) -> *mut c_char {
    let text = match c_str(text, "text") {
        Ok(text) => text,
        Err(e) => return violation(std::ptr::null_mut(), e),
    };
    let Some(env) = array_env(env, env_len) else {
        return std::ptr::null_mut();
    };
    let result = bridge().expand(&text, &env).map(marshal::into_host_string);
    deliver(result, err_out, std::ptr::null_mut())
}

/// [`husk_shell_expand`] with variables supplied by a callback
///
/// # Safety
///
/// `text` must be a NUL-terminated string, `lookup` must be safe to call
/// with `user_data`, and `err_out` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn husk_shell_expand_with(
    text: *const c_char,
    lookup: Option<HuskLookupFn>,
    user_data: *mut c_void,
    err_out: *mut HuskError,
) -> *mut c_char {
    let text = match c_str(text, "text") {
        Ok(text) => text,
        Err(e) => return violation(std::ptr::null_mut(), e),
    };
    let Some(env) = host_env(lookup, user_data) else {
        return std::ptr::null_mut();
    };
    let result = bridge().expand(&text, &env).map(marshal::into_host_string);
    deliver(result, err_out, std::ptr::null_mut())
}

// === fields ===

/// Expand `text` into fields as a shell would for command arguments.
/// Returns a string array handle.
///
/// # Safety
///
/// Same as [`husk_shell_expand`].
#[no_mangle]
pub unsafe extern "C" fn husk_shell_fields(
    text: *const c_char,
    env: *const *const c_char,
    env_len: usize,
    err_out: *mut HuskError,
) -> u64 {
    let text = match c_str(text, "text") {
        Ok(text) => text,
        Err(e) => return violation(0, e),
    };
    let Some(env) = array_env(env, env_len) else {
        return 0;
    };
    let result = bridge().fields(&text, &env).map(|h| h.raw());
    deliver(result, err_out, 0)
}

/// [`husk_shell_fields`] with variables supplied by a callback
///
/// # Safety
///
/// Same as [`husk_shell_expand_with`].
#[no_mangle]
pub unsafe extern "C" fn husk_shell_fields_with(
    text: *const c_char,
    lookup: Option<HuskLookupFn>,
    user_data: *mut c_void,
    err_out: *mut HuskError,
) -> u64 {
    let text = match c_str(text, "text") {
        Ok(text) => text,
        Err(e) => return violation(0, e),
    };
    let Some(env) = host_env(lookup, user_data) else {
        return 0;
    };
    let result = bridge().fields(&text, &env).map(|h| h.raw());
    deliver(result, err_out, 0)
}
