//! Native file primitive model.
//!
//! The interception layer sits between callers and the real OS entry points.
//! This module models those entry points as plain Rust values so the engine
//! can forward, inspect, and patch them without touching raw pointers:
//!
//! ```text
//! caller ──► FileAccessServer ──► FileApi (real primitives)
//!                   │
//!                   └──► PathResolver (handle → canonical path)
//! ```
//!
//! Every primitive keeps its native shape: an [`IoStatusBlock`] out-parameter
//! and an [`NtStatus`] return. The engine never rewrites these for untracked
//! handles.

use std::fmt;
use std::path::{Path, PathBuf};

// =============================================================================
// Handles and Status Codes
// =============================================================================

/// Opaque OS handle value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RawHandle(pub u64);

impl RawHandle {
    /// The null handle, written by `create` when an open fails.
    pub const NULL: Self = Self(0);

    /// Check if this is the null handle.
    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Native status code returned by every primitive.
///
/// Non-negative values are successes (including informational codes),
/// negative values are warnings/errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NtStatus(pub i32);

impl NtStatus {
    /// The operation completed successfully.
    pub const SUCCESS: Self = Self(0);
    /// A read started at or past the end of the file.
    pub const END_OF_FILE: Self = Self(0xC000_0011_u32 as i32);
    /// The handle is not valid.
    pub const INVALID_HANDLE: Self = Self(0xC000_0008_u32 as i32);
    /// The object name was not found.
    pub const OBJECT_NAME_NOT_FOUND: Self = Self(0xC000_0034_u32 as i32);
    /// The information class is not supported.
    pub const INVALID_INFO_CLASS: Self = Self(0xC000_0003_u32 as i32);

    /// Check if this status denotes success.
    #[inline]
    pub const fn is_success(self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for NtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

/// Out-parameter filled in by every primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoStatusBlock {
    /// Final status of the operation.
    pub status: Option<NtStatus>,
    /// Operation-specific result, the number of bytes transferred for reads.
    pub information: usize,
}

impl IoStatusBlock {
    /// Create an empty status block.
    pub const fn new() -> Self {
        Self {
            status: None,
            information: 0,
        }
    }

    /// Record a completed operation.
    #[inline]
    pub fn complete(&mut self, status: NtStatus, information: usize) {
        self.status = Some(status);
        self.information = information;
    }
}

/// Offset sentinel meaning "read from the handle's own cursor".
///
/// This is `FILE_USE_FILE_POINTER_POSITION` (`0xfffffffe`) sign-extended to
/// 64 bits, as passed in the byte offset of a read.
pub const FILE_USE_FILE_POINTER_POSITION: i64 = -2;

// =============================================================================
// File Information
// =============================================================================

/// Information class selector for set/query calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileInformationClass {
    /// `FileStandardInformation`: sizes, link count, flags.
    Standard,
    /// `FilePositionInformation`: the current byte offset.
    Position,
    /// Any other class, carried by its native number.
    Other(u32),
}

impl FileInformationClass {
    /// Native class number.
    pub const fn code(self) -> u32 {
        match self {
            Self::Standard => 5,
            Self::Position => 14,
            Self::Other(code) => code,
        }
    }

    /// Map a native class number to a class.
    pub const fn from_code(code: u32) -> Self {
        match code {
            5 => Self::Standard,
            14 => Self::Position,
            other => Self::Other(other),
        }
    }
}

/// Payload of `FileStandardInformation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileStandardInformation {
    /// Bytes allocated on disk.
    pub allocation_size: i64,
    /// Logical size of the file.
    pub end_of_file: i64,
    /// Number of hard links.
    pub number_of_links: u32,
    /// Delete pending on close.
    pub delete_pending: bool,
    /// The handle refers to a directory.
    pub directory: bool,
}

impl FileStandardInformation {
    /// Size of the native record.
    pub const RAW_LEN: usize = 24;

    const END_OF_FILE: std::ops::Range<usize> = 8..16;

    /// Encode as the native little-endian record.
    pub fn to_bytes(&self) -> [u8; Self::RAW_LEN] {
        let mut raw = [0u8; Self::RAW_LEN];
        raw[0..8].copy_from_slice(&self.allocation_size.to_le_bytes());
        raw[Self::END_OF_FILE].copy_from_slice(&self.end_of_file.to_le_bytes());
        raw[16..20].copy_from_slice(&self.number_of_links.to_le_bytes());
        raw[20] = self.delete_pending as u8;
        raw[21] = self.directory as u8;
        raw
    }

    /// Decode a native record. `None` if `raw` is too short.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        let raw = raw.get(..Self::RAW_LEN)?;
        Some(Self {
            allocation_size: read_i64(&raw[0..8])?,
            end_of_file: read_i64(&raw[Self::END_OF_FILE])?,
            number_of_links: u32::from_le_bytes(raw[16..20].try_into().ok()?),
            delete_pending: raw[20] != 0,
            directory: raw[21] != 0,
        })
    }
}

fn read_i64(raw: &[u8]) -> Option<i64> {
    Some(i64::from_le_bytes(raw.get(..8)?.try_into().ok()?))
}

/// Typed information buffer exchanged with set/query primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInformation {
    /// Standard information (sizes).
    Standard(FileStandardInformation),
    /// Current byte offset.
    Position(i64),
    /// Any other class as raw bytes.
    Other {
        /// Native class number.
        class: u32,
        /// Raw payload.
        data: Vec<u8>,
    },
}

impl FileInformation {
    /// Empty standard-information buffer, for size queries.
    pub fn standard() -> Self {
        Self::Standard(FileStandardInformation::default())
    }

    /// The class this buffer carries.
    pub fn class(&self) -> FileInformationClass {
        match self {
            Self::Standard(_) => FileInformationClass::Standard,
            Self::Position(_) => FileInformationClass::Position,
            Self::Other { class, .. } => FileInformationClass::from_code(*class),
        }
    }

    /// Standard information, if this buffer carries it.
    pub fn as_standard(&self) -> Option<&FileStandardInformation> {
        match self {
            Self::Standard(info) => Some(info),
            _ => None,
        }
    }

    /// Byte offset, if this buffer carries position information.
    ///
    /// Raw payloads tagged with the position class are decoded from their
    /// first 8 bytes (little-endian).
    pub fn as_position(&self) -> Option<i64> {
        match self {
            Self::Position(offset) => Some(*offset),
            Self::Other { data, .. } if self.class() == FileInformationClass::Position => {
                read_i64(data)
            }
            _ => None,
        }
    }

    /// Reported end of file, if this buffer carries standard information.
    pub fn end_of_file(&self) -> Option<i64> {
        match self {
            Self::Standard(info) => Some(info.end_of_file),
            Self::Other { data, .. } if self.class() == FileInformationClass::Standard => {
                read_i64(data.get(FileStandardInformation::END_OF_FILE)?)
            }
            _ => None,
        }
    }

    /// Replace the reported end of file. Returns `false` if this buffer
    /// carries no standard information.
    pub fn set_end_of_file(&mut self, size: i64) -> bool {
        let standard = self.class() == FileInformationClass::Standard;
        match self {
            Self::Standard(info) => {
                info.end_of_file = size;
                true
            }
            Self::Other { data, .. } if standard => {
                match data.get_mut(FileStandardInformation::END_OF_FILE) {
                    Some(slot) => {
                        slot.copy_from_slice(&size.to_le_bytes());
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }
}

// =============================================================================
// Open Requests
// =============================================================================

/// What to do when the target does or does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateDisposition {
    /// Open an existing file, fail if missing.
    #[default]
    Open,
    /// Create a new file, fail if present.
    Create,
    /// Open if present, otherwise create.
    OpenIf,
    /// Replace if present, otherwise create.
    OverwriteIf,
}

/// Arguments of a create/open call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Path as supplied by the caller (not yet canonical).
    pub path: PathBuf,
    /// Desired access mask.
    pub access: u32,
    /// Share mode mask.
    pub share: u32,
    /// Create disposition.
    pub disposition: CreateDisposition,
    /// Create options mask.
    pub options: u32,
}

impl OpenRequest {
    /// Generic read access.
    pub const GENERIC_READ: u32 = 0x8000_0000;
    /// Share for reading.
    pub const FILE_SHARE_READ: u32 = 0x1;

    /// A read-only open of an existing file.
    pub fn read(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            access: Self::GENERIC_READ,
            share: Self::FILE_SHARE_READ,
            disposition: CreateDisposition::Open,
            options: 0,
        }
    }
}

/// Kind of object a handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// A disk file.
    Disk,
    /// A character device or console.
    Char,
    /// A pipe or socket.
    Pipe,
    /// Unknown, or the handle is invalid.
    Unknown,
}

// =============================================================================
// Boundary Traits
// =============================================================================

/// The real file primitives the engine wraps.
///
/// Implementations call through to the original (unhooked) entry points.
/// Each method fills `io_status` and returns the native status unchanged.
pub trait FileApi: Send + Sync {
    /// Open or create a file, writing the new handle to `handle`.
    fn create(
        &self,
        request: &OpenRequest,
        handle: &mut RawHandle,
        io_status: &mut IoStatusBlock,
    ) -> NtStatus;

    /// Read into `buffer`.
    ///
    /// `byte_offset` of `None` (or [`FILE_USE_FILE_POINTER_POSITION`]) reads
    /// from the handle's cursor. The byte count goes to `io_status.information`.
    fn read(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        buffer: &mut [u8],
        byte_offset: Option<i64>,
    ) -> NtStatus;

    /// Apply `info` to the handle (e.g. move the cursor).
    fn set_information(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &FileInformation,
    ) -> NtStatus;

    /// Fill `info` with the class it already carries.
    fn query_information(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &mut FileInformation,
    ) -> NtStatus;

    /// Close the handle.
    fn close(&self, handle: RawHandle) -> NtStatus;

    /// Kind of object behind the handle.
    fn file_type(&self, handle: RawHandle) -> FileType;
}

/// Maps a live handle back to the canonical path of the file it refers to.
pub trait PathResolver: Send + Sync {
    /// Final path of the file, or `None` if it can't be determined.
    fn final_path(&self, handle: RawHandle) -> Option<PathBuf>;
}

impl<F> PathResolver for F
where
    F: Fn(RawHandle) -> Option<PathBuf> + Send + Sync,
{
    fn final_path(&self, handle: RawHandle) -> Option<PathBuf> {
        self(handle)
    }
}
