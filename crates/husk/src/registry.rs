//! Handle registry
//!
//! Objects handed to the host stay on this side of the boundary. The host
//! only ever holds a [`Handle`], an opaque `u64` that the registry maps back
//! to the object. The registry owns an `Arc` to every live object, so the
//! table is the root set: nothing it names can be dropped underneath a
//! handle.
//!
//! Handles encode `(generation << 32) | slot`. Releasing a slot bumps its
//! generation before the slot is reused, so a stale handle never resolves to
//! the next occupant. Generations start at 1, which keeps `0` free to mean
//! "no handle".

use crate::error::BridgeError;
use husk_syntax::{File, Parser, Pos};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Opaque identifier for an object living in a [`Registry`]
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// The "no handle" value; never issued by a registry
    pub const NULL: Handle = Handle(0);

    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    fn new(generation: u32, slot: u32) -> Self {
        Handle((u64::from(generation) << 32) | u64::from(slot))
    }

    fn slot(self) -> usize {
        (self.0 & u64::from(u32::MAX)) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.slot(), self.generation())
    }
}

/// Everything the host can hold a handle to
#[derive(Debug)]
pub enum Object {
    Strings(Vec<String>),
    Parser(Parser),
    File(File),
    Pos(Pos),
    Error(BridgeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Strings,
    Parser,
    File,
    Pos,
    Error,
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Strings(_) => ObjectKind::Strings,
            Object::Parser(_) => ObjectKind::Parser,
            Object::File(_) => ObjectKind::File,
            Object::Pos(_) => ObjectKind::Pos,
            Object::Error(_) => ObjectKind::Error,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Strings => "string array",
            ObjectKind::Parser => "parser",
            ObjectKind::File => "file",
            ObjectKind::Pos => "position",
            ObjectKind::Error => "error",
        })
    }
}

/// A handle the registry can't honour
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Never issued, already released, or from before a teardown
    #[error("invalid handle {0}")]
    InvalidHandle(Handle),

    #[error("handle {handle} names a {found}, expected a {expected}")]
    WrongKind {
        handle: Handle,
        expected: ObjectKind,
        found: ObjectKind,
    },
}

struct Slot {
    generation: u32,
    object: Option<Arc<Object>>,
}

#[derive(Default)]
struct Table {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

/// Generation-tagged slot arena of live objects
#[derive(Default)]
pub struct Registry {
    table: Mutex<Table>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `object` and issue a handle for it
    pub fn register(&self, object: Object) -> Handle {
        let kind = object.kind();
        let object = Arc::new(object);
        let mut table = self.lock();
        let handle = match table.free.pop() {
            Some(slot) => {
                let entry = &mut table.slots[slot as usize];
                entry.object = Some(object);
                Handle::new(entry.generation, slot)
            }
            None => {
                let slot = table.slots.len() as u32;
                table.slots.push(Slot {
                    generation: 1,
                    object: Some(object),
                });
                Handle::new(1, slot)
            }
        };
        table.live += 1;
        drop(table);

        tracing::debug!(%handle, %kind, "registered");
        handle
    }

    /// Look up the object behind a live handle
    pub fn resolve(&self, handle: Handle) -> Result<Arc<Object>, RegistryError> {
        let table = self.lock();
        table
            .slots
            .get(handle.slot())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.object.clone())
            .ok_or(RegistryError::InvalidHandle(handle))
    }

    /// Drop the registry's reference and invalidate `handle`.
    ///
    /// Releasing the same handle twice fails, since the slot's generation
    /// has moved on.
    pub fn release(&self, handle: Handle) -> Result<Arc<Object>, RegistryError> {
        let mut table = self.lock();
        let Table { slots, free, live } = &mut *table;
        let slot_index = handle.slot();
        let entry = slots
            .get_mut(slot_index)
            .filter(|slot| slot.generation == handle.generation())
            .ok_or(RegistryError::InvalidHandle(handle))?;
        let object = entry
            .object
            .take()
            .ok_or(RegistryError::InvalidHandle(handle))?;

        match entry.generation.checked_add(1) {
            Some(next) => {
                entry.generation = next;
                free.push(slot_index as u32);
            }
            // Retired: reusing the slot would let generation 1 handles alias it
            None => entry.generation = 0,
        }
        *live -= 1;
        drop(table);

        tracing::debug!(%handle, kind = %object.kind(), "released");
        Ok(object)
    }

    /// Number of live handles
    pub fn live(&self) -> usize {
        self.lock().live
    }

    /// Release every live handle
    pub fn clear(&self) -> usize {
        let mut table = self.lock();
        let Table { slots, free, live } = &mut *table;
        let released = *live;
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.object.take().is_some() {
                if let Some(next) = slot.generation.checked_add(1) {
                    slot.generation = next;
                    free.push(index as u32);
                } else {
                    slot.generation = 0;
                }
            }
        }
        *live = 0;
        drop(table);

        tracing::debug!(released, "registry cleared");
        released
    }

    // === Typed access ===
    //
    // The closures run after the table lock is dropped.

    fn resolve_kind(&self, handle: Handle, expected: ObjectKind) -> Result<Arc<Object>, RegistryError> {
        let object = self.resolve(handle)?;
        let found = object.kind();
        if found != expected {
            return Err(RegistryError::WrongKind {
                handle,
                expected,
                found,
            });
        }
        Ok(object)
    }

    pub fn with_strings<T>(&self, handle: Handle, f: impl FnOnce(&[String]) -> T) -> Result<T, RegistryError> {
        match &*self.resolve_kind(handle, ObjectKind::Strings)? {
            Object::Strings(items) => Ok(f(items)),
            other => Err(mismatch(handle, ObjectKind::Strings, other)),
        }
    }

    pub fn with_file<T>(&self, handle: Handle, f: impl FnOnce(&File) -> T) -> Result<T, RegistryError> {
        match &*self.resolve_kind(handle, ObjectKind::File)? {
            Object::File(file) => Ok(f(file)),
            other => Err(mismatch(handle, ObjectKind::File, other)),
        }
    }

    pub fn with_error<T>(&self, handle: Handle, f: impl FnOnce(&BridgeError) -> T) -> Result<T, RegistryError> {
        match &*self.resolve_kind(handle, ObjectKind::Error)? {
            Object::Error(err) => Ok(f(err)),
            other => Err(mismatch(handle, ObjectKind::Error, other)),
        }
    }

    pub fn parser(&self, handle: Handle) -> Result<Parser, RegistryError> {
        match &*self.resolve_kind(handle, ObjectKind::Parser)? {
            Object::Parser(parser) => Ok(parser.clone()),
            other => Err(mismatch(handle, ObjectKind::Parser, other)),
        }
    }

    pub fn pos(&self, handle: Handle) -> Result<Pos, RegistryError> {
        match &*self.resolve_kind(handle, ObjectKind::Pos)? {
            Object::Pos(pos) => Ok(*pos),
            other => Err(mismatch(handle, ObjectKind::Pos, other)),
        }
    }
}

fn mismatch(handle: Handle, expected: ObjectKind, found: &Object) -> RegistryError {
    RegistryError::WrongKind {
        handle,
        expected,
        found: found.kind(),
    }
}
