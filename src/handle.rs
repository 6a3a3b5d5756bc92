//! Per-handle emulation bookkeeping.
//!
//! # Handle Lifecycle
//!
//! ```text
//! Untracked ──(emulator claims on open)──► Claimed ──(close)──► Closed
//!     │                                        │
//!     └── no entry, passthrough                └── FileEntry in HandleRegistry
//! ```
//!
//! The registry has no lock of its own. It lives inside the server's
//! critical section and is only touched while that is held.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::emulator::Emulator;
use crate::native::RawHandle;

// =============================================================================
// FileEntry
// =============================================================================

/// Emulation state of one claimed handle.
#[derive(Clone)]
pub struct FileEntry {
    /// Canonical path of the file the handle was opened on.
    pub path: PathBuf,
    /// Logical cursor of the emulated file.
    pub offset: i64,
    /// The emulator that claimed the handle.
    pub emulator: Arc<dyn Emulator>,
}

impl FileEntry {
    /// Create a new entry.
    pub fn new(path: impl Into<PathBuf>, offset: i64, emulator: Arc<dyn Emulator>) -> Self {
        Self {
            path: path.into(),
            offset,
            emulator,
        }
    }

    /// Canonical source path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if `emulator` is the owner of this entry.
    pub fn is_owned_by(&self, emulator: &Arc<dyn Emulator>) -> bool {
        Arc::ptr_eq(&self.emulator, emulator)
    }
}

impl fmt::Debug for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path)
            .field("offset", &self.offset)
            .field("emulator", &self.emulator.name())
            .finish()
    }
}

// =============================================================================
// HandleRegistry
// =============================================================================

/// Maps open handles to their [`FileEntry`].
#[derive(Debug, Default)]
pub struct HandleRegistry {
    entries: FxHashMap<RawHandle, FileEntry>,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for `handle`.
    ///
    /// Re-registering a handle value (the OS recycles them) replaces the old
    /// bookkeeping. Returns the replaced entry, if any.
    pub fn register(
        &mut self,
        handle: RawHandle,
        path: impl Into<PathBuf>,
        offset: i64,
        emulator: Arc<dyn Emulator>,
    ) -> Option<FileEntry> {
        self.entries
            .insert(handle, FileEntry::new(path, offset, emulator))
    }

    /// Look up the entry for `handle`.
    pub fn try_get(&self, handle: RawHandle) -> Option<&FileEntry> {
        self.entries.get(&handle)
    }

    /// Remove and return the entry for `handle`.
    pub fn remove(&mut self, handle: RawHandle) -> Option<FileEntry> {
        self.entries.remove(&handle)
    }

    /// Update the cursor of a tracked handle.
    ///
    /// Returns `false` if the handle is not tracked.
    pub fn set_offset(&mut self, handle: RawHandle, offset: i64) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.offset = offset;
                true
            }
            None => false,
        }
    }

    /// Check if `handle` is tracked.
    pub fn contains(&self, handle: RawHandle) -> bool {
        self.entries.contains_key(&handle)
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no handles are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All tracked handles, in no particular order.
    pub fn handles(&self) -> impl Iterator<Item = RawHandle> + '_ {
        self.entries.keys().copied()
    }
}
