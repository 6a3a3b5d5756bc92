//! # file-emulation
//!
//! In-process file access interception with pluggable emulators.
//!
//! Selected file handles are transparently redirected to content synthesized
//! on demand. Callers see ordinary open/read/seek/size/close behaviour; the
//! [`FileAccessServer`] decides per open whether a handle is a plain file or
//! is owned by an [`Emulator`]:
//!
//! - **Passthrough**: handles no emulator claims are forwarded unmodified,
//!   with native status codes preserved
//! - **Emulation**: claimed handles get a tracked cursor; reads and size
//!   queries go to the owning emulator, falling back to the real file on a miss
//! - **Routes**: nested opens (an emulator opening another file while it
//!   builds content) carry a [`Route`] describing how they were reached
//! - **Serialized**: every intercepted operation runs in one reentrant
//!   critical section
//!
//! ## Quick Start
//!
//! ```ignore
//! use file_emulation::{FileAccessServer, MapEmulator};
//!
//! let mut emulator = MapEmulator::new();
//! emulator.insert("/game/data/B.bin", "emulated contents");
//!
//! let server = FileAccessServer::builder(real_api, resolver)
//!     .emulator(emulator)
//!     .build();
//!
//! // The installer wires the OS entry points to server.create_file() etc.
//! let session = server.activate(installer)?;
//! ```
//!
//! ## Modules
//!
//! - [`server`]: the interception engine
//! - [`emulator`]: emulator trait, ordered registry, map-backed emulator
//! - [`handle`]: per-handle bookkeeping
//! - [`route`]: nested open routes
//! - [`native`]: the real primitives and their status/information types
//! - [`hook`]: install/uninstall lifecycle
//! - [`buffer`]: byte helpers for emulator implementations
//! - [`config`]: runtime configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod emulator;
pub mod error;
pub mod handle;
pub mod hook;
pub mod native;
pub mod prelude;
pub mod route;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Engine
// =============================================================================

pub use hook::{HookInstaller, HookSession};
pub use server::{FileAccessServer, FileAccessServerBuilder};

// =============================================================================
// Emulation
// =============================================================================

pub use emulator::{Emulator, EmulatorRegistry, MapEmulator};
pub use handle::{FileEntry, HandleRegistry};
pub use route::Route;

// =============================================================================
// Native Boundary
// =============================================================================

pub use native::{
    FILE_USE_FILE_POINTER_POSITION, FileApi, FileInformation, FileInformationClass,
    FileStandardInformation, FileType, IoStatusBlock, NtStatus, OpenRequest, PathResolver,
    RawHandle,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use buffer::{FixedName, read_at, try_read};
pub use config::{Config, ConfigBuilder};
pub use error::{Error, Result};
