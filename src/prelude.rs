//! Prelude module for convenient imports.
//!
//! ```ignore
//! use file_emulation::prelude::*;
//! ```

// Server
pub use crate::server::{FileAccessServer, FileAccessServerBuilder};
pub use crate::hook::{HookInstaller, HookSession};

// Emulators
pub use crate::emulator::{Emulator, EmulatorRegistry, MapEmulator};
pub use crate::handle::{FileEntry, HandleRegistry};
pub use crate::route::Route;

// Native boundary
pub use crate::native::{
    FILE_USE_FILE_POINTER_POSITION, FileApi, FileInformation, FileInformationClass,
    FileStandardInformation, FileType, IoStatusBlock, NtStatus, OpenRequest, PathResolver,
    RawHandle,
};

// Helpers
pub use crate::buffer::{FixedName, read_at, try_read};

// Configuration & errors
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{Error, Result};
