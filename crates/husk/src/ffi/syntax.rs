//! Quoting, parsing and positions

use super::{bridge, deliver, violation};
use crate::error::{BridgeError, HuskError};
use crate::marshal::{self, c_str, lang_variant, opt_c_str};
use crate::registry::{Handle, Object};
use crate::stream::{ForeignReader, HuskReadFn};
use husk_syntax::{quote, Pos};
use std::ffi::{c_char, c_void};

/// Quote `text` so the shell `variant` reads it back as one word.
///
/// # Safety
///
/// `text` must be a NUL-terminated string and `err_out` null or valid for a
/// write.
#[no_mangle]
pub unsafe extern "C" fn husk_syntax_quote(
    text: *const c_char,
    variant: i32,
    err_out: *mut HuskError,
) -> *mut c_char {
    let text = match c_str(text, "text") {
        Ok(text) => text,
        Err(e) => return violation(std::ptr::null_mut(), e),
    };
    let variant = match lang_variant(variant) {
        Ok(variant) => variant,
        Err(e) => return violation(std::ptr::null_mut(), e),
    };
    let result = bridge().quote(&text, variant).map(marshal::into_host_string);
    deliver(result, err_out, std::ptr::null_mut())
}

/// # Safety
///
/// `word` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn husk_syntax_is_keyword(word: *const c_char) -> bool {
    match c_str(word, "word") {
        Ok(word) => quote::is_keyword(&word),
        Err(e) => violation(false, e),
    }
}

/// # Safety
///
/// `name` must be a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn husk_syntax_valid_name(name: *const c_char) -> bool {
    match c_str(name, "name") {
        Ok(name) => quote::valid_name(&name),
        Err(e) => violation(false, e),
    }
}

/// Name of a language variant, such as "bash"
#[no_mangle]
pub extern "C" fn husk_syntax_lang_variant_string(variant: i32) -> *mut c_char {
    match lang_variant(variant) {
        Ok(variant) => marshal::into_host_string(variant.to_string()),
        Err(e) => violation(std::ptr::null_mut(), e),
    }
}

// === Parser ===

/// Create parser settings. Each argument may be null to take the default.
///
/// # Safety
///
/// Each argument must be null or point to a value of its type;
/// `stop_at` must be NUL-terminated.
#[no_mangle]
pub unsafe extern "C" fn husk_syntax_new_parser(
    keep_comments: *const bool,
    stop_at: *const c_char,
    variant: *const i32,
) -> u64 {
    let variant = match variant.as_ref().map(|&v| lang_variant(v)).transpose() {
        Ok(variant) => variant,
        Err(e) => return violation(0, e),
    };
    bridge()
        .new_parser(keep_comments.as_ref().copied(), opt_c_str(stop_at), variant)
        .raw()
}

/// Parse a program read through `read`. Returns a file handle.
///
/// `read` is called with `state` until it reports end of stream or an
/// error. A failed read is reported as an I/O error whose detail
/// (`husk_io_error_detail`) is the value the callback returned.
///
/// # Safety
///
/// `read` must be safe to call with `state` for the duration of the call,
/// `name` must be null or NUL-terminated, and `err_out` null or valid for a
/// write.
#[no_mangle]
pub unsafe extern "C" fn husk_syntax_parse(
    parser: u64,
    read: Option<HuskReadFn>,
    state: *mut c_void,
    name: *const c_char,
    err_out: *mut HuskError,
) -> u64 {
    let parser = match bridge().registry().parser(Handle::from_raw(parser)) {
        Ok(parser) => parser,
        Err(e) => return violation(0, e),
    };
    let Some(read) = read else {
        return violation(0, "null read callback");
    };
    let name = opt_c_str(name).unwrap_or_default();

    let reader = ForeignReader::new(read, state, bridge().config().read_chunk_size);
    let result = bridge().parse(&parser, reader, &name).map(|h| h.raw());
    deliver(result, err_out, 0)
}

// === Positions ===

#[no_mangle]
pub extern "C" fn husk_syntax_new_pos(offset: u32, line: u32, col: u32) -> u64 {
    bridge().new_pos(offset, line, col).raw()
}

fn pos(handle: u64) -> Option<Pos> {
    match bridge().registry().pos(Handle::from_raw(handle)) {
        Ok(pos) => Some(pos),
        Err(e) => violation(None, e),
    }
}

/// Whether `pos` comes after `other` in the source
#[no_mangle]
pub extern "C" fn husk_syntax_pos_after(pos_handle: u64, other: u64) -> bool {
    match (pos(pos_handle), pos(other)) {
        (Some(a), Some(b)) => a.after(b),
        _ => false,
    }
}

#[no_mangle]
pub extern "C" fn husk_syntax_pos_col(pos_handle: u64) -> u32 {
    pos(pos_handle).map_or(0, |p| p.col())
}

#[no_mangle]
pub extern "C" fn husk_syntax_pos_line(pos_handle: u64) -> u32 {
    pos(pos_handle).map_or(0, |p| p.line())
}

#[no_mangle]
pub extern "C" fn husk_syntax_pos_offset(pos_handle: u64) -> u32 {
    pos(pos_handle).map_or(0, |p| p.offset())
}

#[no_mangle]
pub extern "C" fn husk_syntax_pos_is_valid(pos_handle: u64) -> bool {
    pos(pos_handle).is_some_and(|p| p.is_valid())
}

// === Files ===

#[no_mangle]
pub extern "C" fn husk_file_name(file: u64) -> *mut c_char {
    bridge()
        .registry()
        .with_file(Handle::from_raw(file), |f| marshal::into_host_string(f.name.clone()))
        .unwrap_or_else(|e| violation(std::ptr::null_mut(), e))
}

#[no_mangle]
pub extern "C" fn husk_file_stmt_count(file: u64) -> usize {
    bridge()
        .registry()
        .with_file(Handle::from_raw(file), |f| f.stmts.len())
        .unwrap_or_else(|e| violation(0, e))
}

/// Source text of top-level statement `index`; null when out of bounds
#[no_mangle]
pub extern "C" fn husk_file_stmt_text(file: u64, index: usize) -> *mut c_char {
    bridge()
        .registry()
        .with_file(Handle::from_raw(file), |f| {
            f.stmts
                .get(index)
                .map_or(std::ptr::null_mut(), |s| marshal::into_host_string(s.text.clone()))
        })
        .unwrap_or_else(|e| violation(std::ptr::null_mut(), e))
}

/// The syntax tree as JSON
///
/// # Safety
///
/// `err_out` must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn husk_file_to_json(file: u64, err_out: *mut HuskError) -> *mut c_char {
    let json = match bridge().registry().with_file(Handle::from_raw(file), |f| f.to_json()) {
        Ok(json) => json,
        Err(e) => return violation(std::ptr::null_mut(), e),
    };
    let result = json.map(marshal::into_host_string).map_err(BridgeError::from);
    deliver(result, err_out, std::ptr::null_mut())
}
