//! The file access server: interception and emulation dispatch.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                  Intercepted Operation Flow                  │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  create_file ──► real create ──► resolve path ──► route      │
//! │                                        │                     │
//! │                                        └─► emulators (order) │
//! │                                              └─► register    │
//! │                                                              │
//! │  read_file / set_information_file / query_information_file   │
//! │       │                                                      │
//! │       ├─► untracked handle ──► real primitive, unchanged     │
//! │       └─► tracked handle   ──► owning emulator               │
//! │                                 └─► miss: real primitive     │
//! │                                                              │
//! │  close_handle ──► remove entry ──► emulator.close_handle     │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Locking
//!
//! Every operation runs inside one reentrant critical section, including the
//! call into the real primitive. Operations on different handles are
//! therefore linearized. The section is reentrant because emulators open
//! further files while building content, and those opens come back through
//! [`FileAccessServer::create_file`] on the same thread.
//!
//! Shared state sits in `RefCell`s inside the section. No borrow is held
//! across a call into an emulator or a real primitive.

mod close;
mod info;
mod open;
mod read;

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::ReentrantMutex;
use rustc_hash::FxHashSet;

use crate::config::Config;
use crate::emulator::{Emulator, EmulatorRegistry};
use crate::handle::{FileEntry, HandleRegistry};
use crate::native::{FileApi, PathResolver, RawHandle};
use crate::route::Route;

// =============================================================================
// Server State
// =============================================================================

/// Mutable state guarded by the critical section.
#[derive(Default)]
pub(crate) struct ServerState {
    pub(crate) route: RefCell<Route>,
    pub(crate) handles: RefCell<HandleRegistry>,
    /// Handles whose close is in progress. Shared, but only the thread
    /// holding the critical section can observe a non-empty set.
    pub(crate) closing: RefCell<FxHashSet<RawHandle>>,
}

impl ServerState {
    /// Clone the entry for `handle`, releasing the borrow immediately.
    pub(crate) fn entry(&self, handle: RawHandle) -> Option<FileEntry> {
        self.handles.borrow().try_get(handle).cloned()
    }
}

// =============================================================================
// FileAccessServer
// =============================================================================

/// Intercepts file primitives and routes claimed handles to emulators.
///
/// # Example
///
/// ```ignore
/// use file_emulation::{FileAccessServer, MapEmulator};
///
/// let mut emulator = MapEmulator::new();
/// emulator.insert("/game/data/B.bin", "emulated");
///
/// let server = FileAccessServer::builder(real_api, resolver)
///     .emulator(emulator)
///     .build();
///
/// let session = server.activate(installer)?;
/// // ... process runs, intercepted calls land in server.create_file() etc.
/// session.finish();
/// ```
pub struct FileAccessServer {
    pub(crate) api: Arc<dyn FileApi>,
    pub(crate) resolver: Arc<dyn PathResolver>,
    pub(crate) emulators: EmulatorRegistry,
    pub(crate) config: Config,
    pub(crate) state: ReentrantMutex<ServerState>,
    pub(crate) active: AtomicBool,
}

impl FileAccessServer {
    /// Create a builder over the real primitives and path resolver.
    pub fn builder(
        api: Arc<dyn FileApi>,
        resolver: Arc<dyn PathResolver>,
    ) -> FileAccessServerBuilder {
        FileAccessServerBuilder::new(api, resolver)
    }

    /// Create a server with default configuration and no emulators.
    pub fn new(api: Arc<dyn FileApi>, resolver: Arc<dyn PathResolver>) -> Arc<Self> {
        Self::builder(api, resolver).build()
    }

    /// Append an emulator to the dispatch order.
    ///
    /// Emulators should be registered before intercepts are installed;
    /// later registrations only affect subsequent opens.
    pub fn register_emulator<E: Emulator + 'static>(&self, emulator: E) -> Arc<dyn Emulator> {
        self.emulators.register(emulator)
    }

    /// The emulator registry.
    pub fn emulators(&self) -> &EmulatorRegistry {
        &self.emulators
    }

    /// The configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The route as currently seen by this thread's opens.
    pub fn current_route(&self) -> Route {
        self.state.lock().route.borrow().clone()
    }

    /// Check if `handle` is claimed by an emulator.
    pub fn is_emulated(&self, handle: RawHandle) -> bool {
        self.state.lock().handles.borrow().contains(handle)
    }

    /// Snapshot of the bookkeeping for `handle`.
    pub fn entry(&self, handle: RawHandle) -> Option<FileEntry> {
        self.state.lock().entry(handle)
    }

    /// The tracked cursor of a claimed handle.
    pub fn tracked_offset(&self, handle: RawHandle) -> Option<i64> {
        self.entry(handle).map(|entry| entry.offset)
    }

    /// All claimed handles, sorted.
    pub fn emulated_handles(&self) -> Vec<RawHandle> {
        let state = self.state.lock();
        let mut handles: Vec<_> = state.handles.borrow().handles().collect();
        handles.sort_unstable();
        handles
    }
}

impl fmt::Debug for FileAccessServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAccessServer")
            .field("emulators", &self.emulators)
            .field("config", &self.config)
            .field("emulated_handles", &self.emulated_handles().len())
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for configuring a [`FileAccessServer`].
///
/// Use [`FileAccessServer::builder`] to create one.
pub struct FileAccessServerBuilder {
    api: Arc<dyn FileApi>,
    resolver: Arc<dyn PathResolver>,
    emulators: EmulatorRegistry,
    config: Config,
}

impl FileAccessServerBuilder {
    fn new(api: Arc<dyn FileApi>, resolver: Arc<dyn PathResolver>) -> Self {
        Self {
            api,
            resolver,
            emulators: EmulatorRegistry::new(),
            config: Config::default(),
        }
    }

    /// Use the given configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Append an emulator to the dispatch order.
    pub fn emulator<E: Emulator + 'static>(self, emulator: E) -> Self {
        self.emulators.register(emulator);
        self
    }

    /// Append an already shared emulator to the dispatch order.
    pub fn emulator_arc(self, emulator: Arc<dyn Emulator>) -> Self {
        self.emulators.register_arc(emulator);
        self
    }

    /// Build the server.
    pub fn build(self) -> Arc<FileAccessServer> {
        Arc::new(FileAccessServer {
            api: self.api,
            resolver: self.resolver,
            emulators: self.emulators,
            config: self.config,
            state: ReentrantMutex::new(ServerState::default()),
            active: AtomicBool::new(false),
        })
    }
}
