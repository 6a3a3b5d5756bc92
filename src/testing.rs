//! Test doubles: a disk-backed primitive layer and a scripted emulator.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::TempDir;

use crate::buffer::try_read;
use crate::emulator::Emulator;
use crate::handle::FileEntry;
use crate::native::{
    FILE_USE_FILE_POINTER_POSITION, FileApi, FileInformation, FileInformationClass,
    FileStandardInformation, FileType, IoStatusBlock, NtStatus, OpenRequest, PathResolver,
    RawHandle,
};
use crate::server::FileAccessServer;

// =============================================================================
// DiskApi
// =============================================================================

struct OpenFile {
    path: PathBuf,
    file: File,
    file_type: FileType,
}

/// Real files behind synthetic handle values.
pub(crate) struct DiskApi {
    next: AtomicU64,
    files: Mutex<FxHashMap<RawHandle, OpenFile>>,
}

impl DiskApi {
    pub(crate) fn new() -> Self {
        Self {
            next: AtomicU64::new(0x100),
            files: Mutex::new(FxHashMap::default()),
        }
    }

    pub(crate) fn open_count(&self) -> usize {
        self.files.lock().len()
    }

    pub(crate) fn set_file_type(&self, handle: RawHandle, file_type: FileType) {
        if let Some(open) = self.files.lock().get_mut(&handle) {
            open.file_type = file_type;
        }
    }
}

impl FileApi for DiskApi {
    fn create(
        &self,
        request: &OpenRequest,
        handle: &mut RawHandle,
        io_status: &mut IoStatusBlock,
    ) -> NtStatus {
        let opened = File::open(&request.path).and_then(|file| {
            let path = fs::canonicalize(&request.path)?;
            Ok((path, file))
        });
        let Ok((path, file)) = opened else {
            *handle = RawHandle::NULL;
            io_status.complete(NtStatus::OBJECT_NAME_NOT_FOUND, 0);
            return NtStatus::OBJECT_NAME_NOT_FOUND;
        };

        let new = RawHandle(self.next.fetch_add(4, Ordering::Relaxed));
        self.files.lock().insert(
            new,
            OpenFile {
                path,
                file,
                file_type: FileType::Disk,
            },
        );
        *handle = new;
        io_status.complete(NtStatus::SUCCESS, 1);
        NtStatus::SUCCESS
    }

    fn read(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        buffer: &mut [u8],
        byte_offset: Option<i64>,
    ) -> NtStatus {
        let mut files = self.files.lock();
        let Some(open) = files.get_mut(&handle) else {
            io_status.complete(NtStatus::INVALID_HANDLE, 0);
            return NtStatus::INVALID_HANDLE;
        };

        if let Some(offset) = byte_offset.filter(|o| *o != FILE_USE_FILE_POINTER_POSITION)
            && open.file.seek(SeekFrom::Start(offset as u64)).is_err()
        {
            io_status.complete(NtStatus::INVALID_HANDLE, 0);
            return NtStatus::INVALID_HANDLE;
        }

        let (_, count) = try_read(&mut open.file, buffer);
        let status = if count == 0 && !buffer.is_empty() {
            NtStatus::END_OF_FILE
        } else {
            NtStatus::SUCCESS
        };
        io_status.complete(status, count);
        status
    }

    fn set_information(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &FileInformation,
    ) -> NtStatus {
        let mut files = self.files.lock();
        let Some(open) = files.get_mut(&handle) else {
            io_status.complete(NtStatus::INVALID_HANDLE, 0);
            return NtStatus::INVALID_HANDLE;
        };
        let status = match info.as_position() {
            Some(offset) if offset >= 0 => match open.file.seek(SeekFrom::Start(offset as u64)) {
                Ok(_) => NtStatus::SUCCESS,
                Err(_) => NtStatus::INVALID_HANDLE,
            },
            _ => NtStatus::INVALID_INFO_CLASS,
        };
        io_status.complete(status, 0);
        status
    }

    fn query_information(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &mut FileInformation,
    ) -> NtStatus {
        let mut files = self.files.lock();
        let Some(open) = files.get_mut(&handle) else {
            io_status.complete(NtStatus::INVALID_HANDLE, 0);
            return NtStatus::INVALID_HANDLE;
        };
        let standard = match open.file.metadata() {
            Ok(meta) => FileStandardInformation {
                allocation_size: meta.len() as i64,
                end_of_file: meta.len() as i64,
                number_of_links: 1,
                delete_pending: false,
                directory: meta.is_dir(),
            },
            Err(_) => {
                io_status.complete(NtStatus::INVALID_HANDLE, 0);
                return NtStatus::INVALID_HANDLE;
            }
        };
        let status = match info {
            FileInformation::Standard(slot) => {
                *slot = standard;
                NtStatus::SUCCESS
            }
            FileInformation::Other { class, data }
                if FileInformationClass::from_code(*class) == FileInformationClass::Standard =>
            {
                *data = standard.to_bytes().to_vec();
                NtStatus::SUCCESS
            }
            FileInformation::Position(offset) => match open.file.stream_position() {
                Ok(pos) => {
                    *offset = pos as i64;
                    NtStatus::SUCCESS
                }
                Err(_) => NtStatus::INVALID_HANDLE,
            },
            FileInformation::Other { .. } => NtStatus::INVALID_INFO_CLASS,
        };
        io_status.complete(status, 0);
        status
    }

    fn close(&self, handle: RawHandle) -> NtStatus {
        match self.files.lock().remove(&handle) {
            Some(_) => NtStatus::SUCCESS,
            None => NtStatus::INVALID_HANDLE,
        }
    }

    fn file_type(&self, handle: RawHandle) -> FileType {
        self.files
            .lock()
            .get(&handle)
            .map_or(FileType::Unknown, |open| open.file_type)
    }
}

impl PathResolver for DiskApi {
    fn final_path(&self, handle: RawHandle) -> Option<PathBuf> {
        self.files.lock().get(&handle).map(|open| open.path.clone())
    }
}

// =============================================================================
// Fixture
// =============================================================================

/// A temp directory plus a [`DiskApi`] over it.
pub(crate) struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    disk: Arc<DiskApi>,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        Self {
            _dir: dir,
            root,
            disk: Arc::new(DiskApi::new()),
        }
    }

    pub(crate) fn api(&self) -> Arc<dyn FileApi> {
        self.disk.clone()
    }

    pub(crate) fn resolver(&self) -> Arc<dyn PathResolver> {
        self.disk.clone()
    }

    pub(crate) fn disk(&self) -> &Arc<DiskApi> {
        &self.disk
    }

    /// Server with default config and no emulators.
    pub(crate) fn server(&self) -> Arc<FileAccessServer> {
        FileAccessServer::new(self.api(), self.resolver())
    }

    /// Canonical path of `name` inside the fixture directory.
    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Write a file and return its canonical path.
    pub(crate) fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }
}

// =============================================================================
// ScriptedEmulator
// =============================================================================

/// Deterministic emulated content: the byte at `offset`.
pub(crate) fn pattern_byte(offset: i64) -> u8 {
    ((offset % 251) as u8) ^ 0xA5
}

/// `len` bytes of emulated content starting at `offset`.
pub(crate) fn pattern(offset: i64, len: usize) -> Vec<u8> {
    (0..len as i64).map(|i| pattern_byte(offset + i)).collect()
}

type ClaimHook = Box<dyn Fn(RawHandle, &Path, &str) + Send + Sync>;
type CloseHook = Box<dyn Fn(RawHandle) + Send + Sync>;

/// Emulator with scripted behaviour and call recording.
pub(crate) struct ScriptedEmulator {
    name: String,
    extension: Option<String>,
    size: i64,
    size_override: Option<i64>,
    extra: usize,
    on_claim: Option<ClaimHook>,
    on_close: Option<CloseHook>,
    claim_attempts: AtomicUsize,
    size_queries: AtomicUsize,
    routes: Mutex<Vec<String>>,
    reads: Mutex<Vec<(RawHandle, i64, usize)>>,
    closes: Mutex<Vec<RawHandle>>,
}

impl ScriptedEmulator {
    /// Claims every file, serves 1 MiB of pattern content, no size override.
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            extension: None,
            size: 1 << 20,
            size_override: None,
            extra: 0,
            on_claim: None,
            on_close: None,
            claim_attempts: AtomicUsize::new(0),
            size_queries: AtomicUsize::new(0),
            routes: Mutex::new(Vec::new()),
            reads: Mutex::new(Vec::new()),
            closes: Mutex::new(Vec::new()),
        }
    }

    /// Only claim files with this extension.
    pub(crate) fn claiming(mut self, ext: &str) -> Self {
        self.extension = Some(ext.to_string());
        self
    }

    /// Emulated content length; reads at or past it miss.
    pub(crate) fn with_size(mut self, size: i64) -> Self {
        self.size = size;
        self
    }

    pub(crate) fn with_size_override(mut self, size: i64) -> Self {
        self.size_override = Some(size);
        self
    }

    /// Report `extra` more bytes than were produced.
    pub(crate) fn reporting_extra(mut self, extra: usize) -> Self {
        self.extra = extra;
        self
    }

    pub(crate) fn on_claim<F>(mut self, hook: F) -> Self
    where
        F: Fn(RawHandle, &Path, &str) + Send + Sync + 'static,
    {
        self.on_claim = Some(Box::new(hook));
        self
    }

    pub(crate) fn on_close<F>(mut self, hook: F) -> Self
    where
        F: Fn(RawHandle) + Send + Sync + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub(crate) fn claim_attempts(&self) -> usize {
        self.claim_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn size_queries(&self) -> usize {
        self.size_queries.load(Ordering::SeqCst)
    }

    /// Routes seen by successful claims.
    pub(crate) fn routes_seen(&self) -> Vec<String> {
        self.routes.lock().clone()
    }

    pub(crate) fn reads(&self) -> Vec<(RawHandle, i64, usize)> {
        self.reads.lock().clone()
    }

    pub(crate) fn closes(&self) -> Vec<RawHandle> {
        self.closes.lock().clone()
    }
}

impl Emulator for ScriptedEmulator {
    fn name(&self) -> &str {
        &self.name
    }

    fn try_create_file(&self, handle: RawHandle, path: &Path, route: &str) -> bool {
        self.claim_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(ext) = &self.extension
            && path.extension().and_then(|e| e.to_str()) != Some(ext.as_str())
        {
            return false;
        }
        self.routes.lock().push(route.to_string());
        if let Some(hook) = &self.on_claim {
            hook(handle, path, route);
        }
        true
    }

    fn read_data(
        &self,
        handle: RawHandle,
        buffer: &mut [u8],
        offset: i64,
        _entry: &FileEntry,
    ) -> Option<usize> {
        self.reads.lock().push((handle, offset, buffer.len()));
        if offset < 0 || offset >= self.size {
            return None;
        }
        let count = buffer.len().min((self.size - offset) as usize);
        for (i, byte) in buffer[..count].iter_mut().enumerate() {
            *byte = pattern_byte(offset + i as i64);
        }
        Some(count + self.extra)
    }

    fn file_size(&self, _handle: RawHandle, _entry: &FileEntry) -> Option<i64> {
        self.size_queries.fetch_add(1, Ordering::SeqCst);
        self.size_override
    }

    fn close_handle(&self, handle: RawHandle, _entry: &FileEntry) {
        self.closes.lock().push(handle);
        if let Some(hook) = &self.on_close {
            hook(handle);
        }
    }
}
