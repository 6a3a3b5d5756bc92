//! Emulator trait and ordered dispatch.
//!
//! An emulator claims file opens it recognizes and then answers reads and
//! size queries for those handles with synthesized content.
//!
//! # Dispatch
//!
//! ```text
//! open(handle, path, route)
//!   │
//!   ├─► emulator[0].try_create_file ── false
//!   ├─► emulator[1].try_create_file ── true  ──► owner (stop here)
//!   └─► emulator[2]                    (never asked)
//! ```
//!
//! Registration order is the conflict-resolution policy: when several
//! emulators could claim the same file, the first registered wins.

mod map;

pub use map::MapEmulator;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::handle::FileEntry;
use crate::native::RawHandle;

// =============================================================================
// Emulator Trait
// =============================================================================

/// A pluggable producer of emulated file content.
///
/// All methods run inside the server's critical section, so calls are
/// never concurrent with each other. Per-handle state still needs interior
/// mutability since methods take `&self`.
///
/// An emulator may open other files while claiming; those opens go through
/// the same server and see the route extended by the current path.
///
/// # Example
///
/// ```ignore
/// use file_emulation::{Emulator, FileEntry, RawHandle};
/// use std::path::Path;
///
/// struct Zeroes;
///
/// impl Emulator for Zeroes {
///     fn try_create_file(&self, _: RawHandle, path: &Path, _route: &str) -> bool {
///         path.extension().is_some_and(|ext| ext == "zero")
///     }
///
///     fn read_data(&self, _: RawHandle, buffer: &mut [u8], _offset: i64, _: &FileEntry) -> Option<usize> {
///         buffer.fill(0);
///         Some(buffer.len())
///     }
/// }
/// ```
pub trait Emulator: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Try to claim a newly opened handle.
    ///
    /// `route` is the route of the enclosing opens (empty for a top-level
    /// open). Returning `true` makes this emulator the handle's owner; it
    /// must be ready to answer reads and size queries from then on.
    fn try_create_file(&self, handle: RawHandle, path: &Path, route: &str) -> bool;

    /// Produce up to `buffer.len()` bytes of content starting at `offset`.
    ///
    /// Returns the number of bytes written, or `None` if this region can't
    /// be emulated, in which case the real read is used instead.
    fn read_data(
        &self,
        handle: RawHandle,
        buffer: &mut [u8],
        offset: i64,
        entry: &FileEntry,
    ) -> Option<usize>;

    /// Logical size of the emulated file, or `None` to keep the real size.
    fn file_size(&self, _handle: RawHandle, _entry: &FileEntry) -> Option<i64> {
        None
    }

    /// Release state held for `handle`. Called once per claimed handle.
    fn close_handle(&self, _handle: RawHandle, _entry: &FileEntry) {}
}

// =============================================================================
// EmulatorRegistry
// =============================================================================

type EmulatorList = Arc<Vec<Arc<dyn Emulator>>>;

/// Ordered collection of emulators, first registered wins.
///
/// Dispatch works on a snapshot of the list, so an emulator may register
/// further emulators (or a nested open may dispatch) without deadlocking.
#[derive(Default)]
pub struct EmulatorRegistry {
    emulators: RwLock<EmulatorList>,
}

impl EmulatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an emulator to the dispatch order.
    pub fn register<E: Emulator + 'static>(&self, emulator: E) -> Arc<dyn Emulator> {
        let emulator: Arc<dyn Emulator> = Arc::new(emulator);
        self.register_arc(emulator.clone());
        emulator
    }

    /// Append an already shared emulator to the dispatch order.
    pub fn register_arc(&self, emulator: Arc<dyn Emulator>) {
        let mut list = self.emulators.write();
        let mut next = Vec::with_capacity(list.len() + 1);
        next.extend(list.iter().cloned());
        next.push(emulator);
        *list = Arc::new(next);
    }

    /// Remove all emulators with the given name.
    ///
    /// Handles already claimed keep their owner until closed.
    /// Returns `true` if anything was removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut list = self.emulators.write();
        let next: Vec<_> = list.iter().filter(|e| e.name() != name).cloned().collect();
        let removed = next.len() != list.len();
        *list = Arc::new(next);
        removed
    }

    /// Current dispatch order.
    pub fn snapshot(&self) -> EmulatorList {
        self.emulators.read().clone()
    }

    /// Offer a new handle to each emulator in order.
    ///
    /// Returns the first emulator that accepted, or `None` if the handle
    /// should stay an ordinary file.
    pub fn try_create(
        &self,
        handle: RawHandle,
        path: &Path,
        route: &str,
    ) -> Option<Arc<dyn Emulator>> {
        self.snapshot()
            .iter()
            .find(|emulator| emulator.try_create_file(handle, path, route))
            .cloned()
    }

    /// Names in dispatch order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot().iter().map(|e| e.name().to_string()).collect()
    }

    /// Number of registered emulators.
    pub fn len(&self) -> usize {
        self.emulators.read().len()
    }

    /// Check if no emulators are registered.
    pub fn is_empty(&self) -> bool {
        self.emulators.read().is_empty()
    }
}

impl fmt::Debug for EmulatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmulatorRegistry")
            .field("emulators", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedEmulator;

    #[test]
    fn test_first_registered_wins() {
        let registry = EmulatorRegistry::new();
        let first = registry.register(ScriptedEmulator::new("first").claiming("bin"));
        let _second = registry.register(ScriptedEmulator::new("second").claiming("bin"));

        let owner = registry
            .try_create(RawHandle(1), Path::new("/data/B.bin"), "")
            .unwrap();
        assert!(Arc::ptr_eq(&owner, &first));
    }

    #[test]
    fn test_stops_at_first_acceptance() {
        let registry = EmulatorRegistry::new();
        let first = Arc::new(ScriptedEmulator::new("first").claiming("bin"));
        let second = Arc::new(ScriptedEmulator::new("second").claiming("bin"));
        registry.register_arc(first.clone());
        registry.register_arc(second.clone());

        registry.try_create(RawHandle(1), Path::new("/b.bin"), "");
        assert_eq!(first.claim_attempts(), 1);
        assert_eq!(second.claim_attempts(), 0);
    }

    #[test]
    fn test_falls_through_to_later_emulator() {
        let registry = EmulatorRegistry::new();
        registry.register(ScriptedEmulator::new("pak").claiming("pak"));
        let bf = registry.register(ScriptedEmulator::new("bf").claiming("bf"));

        let owner = registry.try_create(RawHandle(1), Path::new("/x.bf"), "").unwrap();
        assert!(Arc::ptr_eq(&owner, &bf));
    }

    #[test]
    fn test_no_acceptance() {
        let registry = EmulatorRegistry::new();
        registry.register(ScriptedEmulator::new("pak").claiming("pak"));
        assert!(registry.try_create(RawHandle(1), Path::new("/A.bin"), "").is_none());

        let empty = EmulatorRegistry::new();
        assert!(empty.is_empty());
        assert!(empty.try_create(RawHandle(1), Path::new("/A.bin"), "").is_none());
    }

    #[test]
    fn test_unregister() {
        let registry = EmulatorRegistry::new();
        registry.register(ScriptedEmulator::new("pak").claiming("bin"));
        registry.register(ScriptedEmulator::new("bf").claiming("bin"));

        assert!(registry.unregister("pak"));
        assert!(!registry.unregister("pak"));
        assert_eq!(registry.names(), vec!["bf".to_string()]);
    }

    #[test]
    fn test_snapshot_is_stable() {
        let registry = EmulatorRegistry::new();
        registry.register(ScriptedEmulator::new("a").claiming("bin"));
        let snapshot = registry.snapshot();
        registry.register(ScriptedEmulator::new("b").claiming("bin"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_default_name_is_type_name() {
        struct Plain;
        impl Emulator for Plain {
            fn try_create_file(&self, _: RawHandle, _: &Path, _: &str) -> bool {
                false
            }
            fn read_data(&self, _: RawHandle, _: &mut [u8], _: i64, _: &FileEntry) -> Option<usize> {
                None
            }
        }
        assert!(Plain.name().ends_with("Plain"));
    }
}
