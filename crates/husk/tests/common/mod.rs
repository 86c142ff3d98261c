//! Shared helpers for driving the C functions the way a host would

#![allow(dead_code)]

use husk::ffi::*;
use husk::{HuskError, HuskReadOutcome};
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr, CString};

pub fn cstr(s: &str) -> CString {
    CString::new(s).unwrap()
}

/// Copy a returned string and free it
pub fn take_string(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    unsafe { husk_string_free(ptr) };
    Some(s)
}

/// Read every element of a string array handle, then release it
pub fn take_array(array: u64) -> Vec<String> {
    let len = husk_array_len(array);
    let items = (0..len)
        .map(|i| take_string(husk_get_string_from_array(array, i)).unwrap())
        .collect();
    husk_release(array);
    items
}

pub fn error_message(err: &HuskError) -> String {
    take_string(husk_error_message(err.detail)).unwrap()
}

pub fn no_error() -> HuskError {
    HuskError { kind: 0, detail: 0 }
}

// ============================================================================
// Shell
// ============================================================================

pub fn fields(text: &str, env: &[&str]) -> Result<u64, HuskError> {
    let text = cstr(text);
    let owned: Vec<CString> = env.iter().map(|s| cstr(s)).collect();
    let ptrs: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();
    let mut err = no_error();
    let array = unsafe { husk_shell_fields(text.as_ptr(), ptrs.as_ptr(), ptrs.len(), &mut err) };
    if array == 0 {
        Err(err)
    } else {
        Ok(array)
    }
}

pub fn expand(text: &str, env: &[&str]) -> Result<String, HuskError> {
    let text = cstr(text);
    let owned: Vec<CString> = env.iter().map(|s| cstr(s)).collect();
    let ptrs: Vec<*const c_char> = owned.iter().map(|s| s.as_ptr()).collect();
    let mut err = no_error();
    let out = unsafe { husk_shell_expand(text.as_ptr(), ptrs.as_ptr(), ptrs.len(), &mut err) };
    take_string(out).ok_or(err)
}

/// Variables served through the lookup callback
#[derive(Default)]
pub struct Vars {
    values: HashMap<String, CString>,
    failures: HashMap<String, i32>,
    pub lookups: Vec<String>,
}

impl Vars {
    pub fn set(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), cstr(value));
        self
    }

    pub fn failing(mut self, name: &str, status: i32) -> Self {
        self.failures.insert(name.to_string(), status);
        self
    }

    pub fn as_user_data(&mut self) -> *mut c_void {
        self as *mut Vars as *mut c_void
    }
}

pub extern "C" fn vars_lookup(
    user_data: *mut c_void,
    name: *const c_char,
    value_out: *mut *const c_char,
) -> i32 {
    let vars = unsafe { &mut *(user_data as *mut Vars) };
    let name = unsafe { CStr::from_ptr(name) }.to_str().unwrap().to_string();
    vars.lookups.push(name.clone());
    if let Some(&status) = vars.failures.get(&name) {
        return status;
    }
    match vars.values.get(&name) {
        Some(value) => {
            unsafe { value_out.write(value.as_ptr()) };
            0
        }
        None => 1,
    }
}

// ============================================================================
// Streams
// ============================================================================

/// A host byte stream that hands out a few bytes per call and can fail on
/// a chosen call
pub struct Stream {
    data: Vec<u8>,
    at: usize,
    per_call: usize,
    fail_on: Option<u64>,
    error: u64,
    pub calls: u64,
    pub largest_cap: usize,
}

impl Stream {
    pub fn new(text: &str) -> Self {
        Self {
            data: text.as_bytes().to_vec(),
            at: 0,
            per_call: usize::MAX,
            fail_on: None,
            error: 0,
            calls: 0,
            largest_cap: 0,
        }
    }

    /// Hand out at most `n` bytes per call
    pub fn per_call(mut self, n: usize) -> Self {
        self.per_call = n;
        self
    }

    /// Fail the `call`th read (1-based) with `error`
    pub fn failing_on(mut self, call: u64, error: u64) -> Self {
        self.fail_on = Some(call);
        self.error = error;
        self
    }
}

pub extern "C" fn stream_read(state: *mut c_void, buf: *mut u8, cap: usize) -> HuskReadOutcome {
    let stream = unsafe { &mut *(state as *mut Stream) };
    stream.calls += 1;
    stream.largest_cap = stream.largest_cap.max(cap);
    if stream.fail_on == Some(stream.calls) {
        return HuskReadOutcome::failed(stream.error);
    }
    let n = cap.min(stream.per_call).min(stream.data.len() - stream.at);
    unsafe { std::ptr::copy_nonoverlapping(stream.data[stream.at..].as_ptr(), buf, n) };
    stream.at += n;
    HuskReadOutcome::data(n)
}

// ============================================================================
// Parsing
// ============================================================================

pub fn new_parser(keep_comments: Option<bool>, stop_at: Option<&str>, variant: Option<i32>) -> u64 {
    let stop_at = stop_at.map(cstr);
    unsafe {
        husk_syntax_new_parser(
            keep_comments.as_ref().map_or(std::ptr::null(), |b| b as *const bool),
            stop_at.as_ref().map_or(std::ptr::null(), |s| s.as_ptr()),
            variant.as_ref().map_or(std::ptr::null(), |v| v as *const i32),
        )
    }
}

pub fn parse_stream(parser: u64, stream: &mut Stream, name: &str) -> Result<u64, HuskError> {
    let name = cstr(name);
    let mut err = no_error();
    let file = unsafe {
        husk_syntax_parse(
            parser,
            Some(stream_read),
            stream as *mut Stream as *mut c_void,
            name.as_ptr(),
            &mut err,
        )
    };
    if file == 0 {
        Err(err)
    } else {
        Ok(file)
    }
}

/// Parse `src` with a bash parser, releasing the parser afterwards
pub fn parse(src: &str) -> Result<u64, HuskError> {
    let parser = new_parser(None, None, Some(0));
    let result = parse_stream(parser, &mut Stream::new(src), "test.sh");
    husk_release(parser);
    result
}

pub struct ParseErrorData {
    pub filename: String,
    pub line: u32,
    pub col: u32,
    pub text: String,
    pub incomplete: bool,
}

pub fn parse_error_data(err: &HuskError) -> Option<ParseErrorData> {
    let mut filename = std::ptr::null_mut();
    let mut pos = 0u64;
    let mut text = std::ptr::null_mut();
    let mut incomplete = false;
    let found = unsafe {
        husk_parse_error_data(err.detail, &mut filename, &mut pos, &mut text, &mut incomplete)
    };
    if !found {
        return None;
    }
    let data = ParseErrorData {
        filename: take_string(filename).unwrap(),
        line: husk_syntax_pos_line(pos),
        col: husk_syntax_pos_col(pos),
        text: take_string(text).unwrap(),
        incomplete,
    };
    husk_release(pos);
    Some(data)
}
