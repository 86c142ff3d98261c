//! Conversions between host values and engine values
//!
//! Host strings and arrays are copied into owned Rust values before the
//! call that received them returns; nothing here keeps a host pointer.

use husk_syntax::LangVariant;
use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};
use thiserror::Error;

/// A value the host should never have passed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("null pointer passed for {0}")]
    NullPointer(&'static str),

    #[error("unknown language variant {0}")]
    UnknownVariant(i32),
}

/// Copy a required NUL-terminated host string.
///
/// Invalid UTF-8 is replaced rather than rejected.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn c_str(ptr: *const c_char, what: &'static str) -> Result<String, MarshalError> {
    opt_c_str(ptr).ok_or(MarshalError::NullPointer(what))
}

/// Copy an optional host string; null is `None`
///
/// # Safety
///
/// Same as [`c_str`].
pub unsafe fn opt_c_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Copy a host array of `len` strings.
///
/// # Safety
///
/// Unless `len` is 0, `ptr` must point to `len` valid string pointers.
pub unsafe fn c_str_array(
    ptr: *const *const c_char,
    len: usize,
    what: &'static str,
) -> Result<Vec<String>, MarshalError> {
    if len == 0 {
        return Ok(Vec::new());
    }
    if ptr.is_null() {
        return Err(MarshalError::NullPointer(what));
    }
    std::slice::from_raw_parts(ptr, len)
        .iter()
        .map(|&item| c_str(item, what))
        .collect()
}

/// Build an environment from `key=value` entries.
///
/// The key ends at the first `=`; an entry without one is a variable set to
/// the empty string. Later entries win.
pub fn env_map<I, S>(pairs: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|pair| match pair.as_ref().split_once('=') {
            Some((key, value)) => (key.to_string(), value.to_string()),
            None => (pair.as_ref().to_string(), String::new()),
        })
        .collect()
}

/// Hand a string to the host; it must come back through `husk_string_free`.
///
/// The host sees everything up to the first interior NUL.
pub fn into_host_string(s: String) -> *mut c_char {
    let bytes = match s.find('\0') {
        Some(nul) => s.as_bytes()[..nul].to_vec(),
        None => s.into_bytes(),
    };
    // No interior NUL is left after truncation
    CString::new(bytes)
        .map(CString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

/// Take back a string made by [`into_host_string`].
///
/// # Safety
///
/// `ptr` must be null or come from [`into_host_string`] and not have been
/// freed already.
pub unsafe fn free_host_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

pub fn lang_variant(raw: i32) -> Result<LangVariant, MarshalError> {
    match raw {
        0 => Ok(LangVariant::Bash),
        1 => Ok(LangVariant::Posix),
        2 => Ok(LangVariant::Mksh),
        3 => Ok(LangVariant::Bats),
        4 => Ok(LangVariant::Auto),
        other => Err(MarshalError::UnknownVariant(other)),
    }
}

pub fn lang_variant_code(variant: LangVariant) -> i32 {
    match variant {
        LangVariant::Bash => 0,
        LangVariant::Posix => 1,
        LangVariant::Mksh => 2,
        LangVariant::Bats => 3,
        LangVariant::Auto => 4,
    }
}
