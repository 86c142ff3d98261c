//! Foreign byte streams
//!
//! The host hands the parser a callback and an opaque state pointer instead
//! of a buffer. [`ForeignReader`] adapts that pair to [`std::io::Read`], so
//! the parser pulls bytes lazily and the host never copies its whole input
//! across the boundary.

use std::ffi::c_void;
use std::fmt;
use std::io;
use thiserror::Error;

/// Result of one host read
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuskReadOutcome {
    /// `false` when the read failed and `error` is set
    pub is_ok: bool,
    /// Bytes written to the buffer; 0 with `is_ok` is end of stream
    pub count: usize,
    /// Host-defined error value, passed back unchanged
    pub error: u64,
}

impl HuskReadOutcome {
    pub fn data(count: usize) -> Self {
        Self {
            is_ok: true,
            count,
            error: 0,
        }
    }

    pub fn eof() -> Self {
        Self::data(0)
    }

    pub fn failed(error: u64) -> Self {
        Self {
            is_ok: false,
            count: 0,
            error,
        }
    }
}

/// Host read callback: fill at most `cap` bytes of `buf`
pub type HuskReadFn = extern "C" fn(state: *mut c_void, buf: *mut u8, cap: usize) -> HuskReadOutcome;

/// A failure reported by the host read callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("host stream read failed (detail {detail})")]
pub struct ForeignStreamError {
    pub detail: u64,
}

/// [`io::Read`] over a host callback
pub struct ForeignReader {
    read: HuskReadFn,
    state: *mut c_void,
    chunk_size: usize,
    calls: u64,
}

impl ForeignReader {
    /// Wrap a host callback.
    ///
    /// # Safety
    ///
    /// `read` must be safe to call with `state` and any buffer, for as long
    /// as the reader is in use.
    pub unsafe fn new(read: HuskReadFn, state: *mut c_void, chunk_size: usize) -> Self {
        Self {
            read,
            state,
            chunk_size: chunk_size.max(1),
            calls: 0,
        }
    }

    /// Number of times the callback has been invoked
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl fmt::Debug for ForeignReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignReader")
            .field("chunk_size", &self.chunk_size)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl io::Read for ForeignReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let cap = buf.len().min(self.chunk_size);
        if cap == 0 {
            return Ok(0);
        }

        self.calls += 1;
        let outcome = (self.read)(self.state, buf.as_mut_ptr(), cap);
        tracing::trace!(
            call = self.calls,
            cap,
            is_ok = outcome.is_ok,
            count = outcome.count,
            "host read"
        );

        if !outcome.is_ok {
            return Err(io::Error::other(ForeignStreamError {
                detail: outcome.error,
            }));
        }
        if outcome.count > cap {
            tracing::error!(count = outcome.count, cap, "host read overran its buffer");
            debug_assert!(outcome.count <= cap, "host read overran its buffer");
            return Ok(cap);
        }
        Ok(outcome.count)
    }
}
