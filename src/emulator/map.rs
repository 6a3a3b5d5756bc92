//! In-memory emulator backed by a path → bytes map.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::Emulator;
use crate::buffer::{read_at, try_read};
use crate::handle::FileEntry;
use crate::native::RawHandle;

/// Serves fixed byte content for registered paths.
///
/// Useful for replacing whole files without writing a format-specific
/// emulator, and as a reference implementation of the [`Emulator`] contract.
///
/// # Example
///
/// ```ignore
/// use file_emulation::MapEmulator;
///
/// let mut emulator = MapEmulator::new();
/// emulator.insert("/game/data/title.txt", "Hello from memory");
/// server.register_emulator(emulator);
/// ```
#[derive(Default)]
pub struct MapEmulator {
    name: Option<String>,
    route: Option<String>,
    files: FxHashMap<PathBuf, Arc<[u8]>>,
    open: Mutex<FxHashMap<RawHandle, Arc<[u8]>>>,
}

impl MapEmulator {
    /// Create an emulator with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the name reported in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Only claim files reached through a route containing `fragment`.
    pub fn with_route(mut self, fragment: impl Into<String>) -> Self {
        self.route = Some(fragment.into());
        self
    }

    /// Insert a file with string content.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl AsRef<str>) {
        self.insert_bytes(path, content.as_ref().as_bytes());
    }

    /// Insert a file with binary content.
    pub fn insert_bytes(&mut self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        let content: Vec<u8> = content.into();
        self.files.insert(path.into(), content.into());
    }

    /// Insert a file with `len` bytes taken from `reader`.
    ///
    /// Returns `false` (and inserts nothing) if the reader ends early.
    pub fn insert_reader<R: Read>(&mut self, path: impl Into<PathBuf>, reader: &mut R, len: usize) -> bool {
        let mut content = vec![0u8; len];
        let (complete, _) = try_read(reader, &mut content);
        if complete {
            self.insert_bytes(path, content);
        }
        complete
    }

    /// Check if a path has content.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.contains_key(path.as_ref())
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of handles currently claimed.
    pub fn open_handles(&self) -> usize {
        self.open.lock().len()
    }

    fn content(&self, handle: RawHandle) -> Option<Arc<[u8]>> {
        self.open.lock().get(&handle).cloned()
    }
}

impl Emulator for MapEmulator {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("map")
    }

    fn try_create_file(&self, handle: RawHandle, path: &Path, route: &str) -> bool {
        if let Some(fragment) = &self.route
            && !route.contains(fragment.as_str())
        {
            return false;
        }
        let Some(content) = self.files.get(path) else {
            return false;
        };
        self.open.lock().insert(handle, content.clone());
        true
    }

    fn read_data(
        &self,
        handle: RawHandle,
        buffer: &mut [u8],
        offset: i64,
        _entry: &FileEntry,
    ) -> Option<usize> {
        let content = self.content(handle)?;
        read_at(&content, offset, buffer)
    }

    fn file_size(&self, handle: RawHandle, _entry: &FileEntry) -> Option<i64> {
        self.content(handle).and_then(|c| i64::try_from(c.len()).ok())
    }

    fn close_handle(&self, handle: RawHandle, _entry: &FileEntry) {
        self.open.lock().remove(&handle);
    }
}
