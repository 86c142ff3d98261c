//! Lifecycle, string arrays and error inspection

use super::{bridge, violation, write_out};
use crate::error::classify;
use crate::marshal::{self, lang_variant_code, opt_c_str};
use crate::registry::{Handle, Object};
use crate::Bridge;
use husk_syntax::Error as SyntaxError;
use std::ffi::c_char;
use std::path::PathBuf;

// === Lifecycle ===

/// Load configuration, install logging and create the bridge.
///
/// `config_path` may be null to use `$HUSK_CONFIG` or the default location.
/// Returns false if the configuration could not be loaded or the bridge was
/// already running; in both cases nothing changes.
///
/// # Safety
///
/// `config_path` must be null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn husk_init(config_path: *const c_char) -> bool {
    match Bridge::init(opt_c_str(config_path).map(PathBuf::from)) {
        Ok(created) => created,
        Err(e) => {
            tracing::error!(error = %e, "husk_init failed");
            false
        }
    }
}

/// Release every live handle. Returns how many there were.
#[no_mangle]
pub extern "C" fn husk_teardown() -> usize {
    bridge().registry().clear()
}

#[no_mangle]
pub extern "C" fn husk_live_handles() -> usize {
    bridge().registry().live()
}

/// Release a handle; it must not be used again. Releasing 0 does nothing.
#[no_mangle]
pub extern "C" fn husk_release(handle: u64) {
    if handle == 0 {
        return;
    }
    if let Err(e) = bridge().registry().release(Handle::from_raw(handle)) {
        violation((), e);
    }
}

/// Free a string returned by any husk function
///
/// # Safety
///
/// `ptr` must be null or a string returned by husk that hasn't been freed.
#[no_mangle]
pub unsafe extern "C" fn husk_string_free(ptr: *mut c_char) {
    marshal::free_host_string(ptr);
}

// === String arrays ===

#[no_mangle]
pub extern "C" fn husk_array_len(array: u64) -> usize {
    bridge()
        .registry()
        .with_strings(Handle::from_raw(array), <[String]>::len)
        .unwrap_or_else(|e| violation(0, e))
}

/// Copy element `index` of a string array; null when out of bounds
#[no_mangle]
pub extern "C" fn husk_get_string_from_array(array: u64, index: usize) -> *mut c_char {
    bridge()
        .registry()
        .with_strings(Handle::from_raw(array), |items| {
            items
                .get(index)
                .map_or(std::ptr::null_mut(), |s| marshal::into_host_string(s.clone()))
        })
        .unwrap_or_else(|e| violation(std::ptr::null_mut(), e))
}

// === Errors ===

#[no_mangle]
pub extern "C" fn husk_error_message(error: u64) -> *mut c_char {
    bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| {
            marshal::into_host_string(err.to_string())
        })
        .unwrap_or_else(|e| violation(std::ptr::null_mut(), e))
}

/// The kind an error was reported with
#[no_mangle]
pub extern "C" fn husk_error_kind(error: u64) -> i32 {
    bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| classify(err).code())
        .unwrap_or_else(|e| violation(0, e))
}

/// The value the host read callback failed with; 0 for other errors
#[no_mangle]
pub extern "C" fn husk_io_error_detail(error: u64) -> u64 {
    bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| {
            err.foreign_detail().unwrap_or(0)
        })
        .unwrap_or_else(|e| violation(0, e))
}

/// The status a lookup callback failed with; 0 for other errors
#[no_mangle]
pub extern "C" fn husk_exit_status_code(error: u64) -> u8 {
    bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| err.exit_status().unwrap_or(0))
        .unwrap_or_else(|e| violation(0, e))
}

/// Fields of a quote error. Returns false, writing nothing, for other
/// kinds of error.
///
/// # Safety
///
/// Each out-pointer must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn husk_quote_error_data(
    error: u64,
    byte_offset_out: *mut usize,
    message_out: *mut *mut c_char,
) -> bool {
    let data = bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| match err.syntax() {
            Some(SyntaxError::Quote(quote)) => Some((quote.byte_offset, quote.message.clone())),
            _ => None,
        })
        .unwrap_or_else(|e| violation(None, e));

    let Some((offset, message)) = data else {
        return false;
    };
    write_out(byte_offset_out, offset);
    if !message_out.is_null() {
        message_out.write(marshal::into_host_string(message));
    }
    true
}

/// Fields of a parse error. `pos_out` receives a new position handle.
/// Returns false, writing nothing, for other kinds of error.
///
/// # Safety
///
/// Each out-pointer must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn husk_parse_error_data(
    error: u64,
    filename_out: *mut *mut c_char,
    pos_out: *mut u64,
    text_out: *mut *mut c_char,
    incomplete_out: *mut bool,
) -> bool {
    let data = bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| match err.syntax() {
            Some(SyntaxError::Parse(parse)) => Some(parse.clone()),
            _ => None,
        })
        .unwrap_or_else(|e| violation(None, e));

    let Some(parse) = data else {
        return false;
    };
    if !filename_out.is_null() {
        filename_out.write(marshal::into_host_string(parse.filename));
    }
    if !pos_out.is_null() {
        pos_out.write(bridge().registry().register(Object::Pos(parse.pos)).raw());
    }
    if !text_out.is_null() {
        text_out.write(marshal::into_host_string(parse.text));
    }
    write_out(incomplete_out, parse.incomplete);
    true
}

/// Fields of a language error. `pos_out` receives a new position handle
/// and `variant_out` the variant in use. Returns false, writing nothing,
/// for other kinds of error.
///
/// # Safety
///
/// Each out-pointer must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn husk_lang_error_data(
    error: u64,
    filename_out: *mut *mut c_char,
    pos_out: *mut u64,
    feature_out: *mut *mut c_char,
    variant_out: *mut i32,
) -> bool {
    let data = bridge()
        .registry()
        .with_error(Handle::from_raw(error), |err| match err.syntax() {
            Some(SyntaxError::Lang(lang)) => Some(lang.clone()),
            _ => None,
        })
        .unwrap_or_else(|e| violation(None, e));

    let Some(lang) = data else {
        return false;
    };
    if !filename_out.is_null() {
        filename_out.write(marshal::into_host_string(lang.filename));
    }
    if !pos_out.is_null() {
        pos_out.write(bridge().registry().register(Object::Pos(lang.pos)).raw());
    }
    if !feature_out.is_null() {
        feature_out.write(marshal::into_host_string(lang.feature));
    }
    write_out(variant_out, lang_variant_code(lang.variant));
    true
}
