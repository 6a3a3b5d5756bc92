//! Close interception.
//!
//! Releasing a claimed handle can run arbitrary emulator teardown, which
//! may itself close handles. A close that arrives for a handle already being
//! closed on this thread skips the bookkeeping instead of recursing.

use std::cell::RefCell;

use log::debug;
use rustc_hash::FxHashSet;

use super::FileAccessServer;
use crate::native::{FileType, NtStatus, RawHandle};

/// Removes a handle from the closing set when dropped.
struct ClosingMarker<'a> {
    closing: &'a RefCell<FxHashSet<RawHandle>>,
    handle: RawHandle,
}

impl Drop for ClosingMarker<'_> {
    fn drop(&mut self) {
        self.closing.borrow_mut().remove(&self.handle);
    }
}

impl FileAccessServer {
    /// Intercepted close: release emulation state, then close for real.
    ///
    /// Returns the real close status unchanged.
    pub fn close_handle(&self, handle: RawHandle) -> NtStatus {
        self.on_close(handle);
        self.api.close(handle)
    }

    /// Release emulation state for `handle` without closing it.
    ///
    /// For installers that run this before the original close entry point.
    /// Only disk files are considered. Returns `true` if a claimed handle was
    /// released; its owner's `close_handle` has then run exactly once.
    pub fn on_close(&self, handle: RawHandle) -> bool {
        if self.api.file_type(handle) != FileType::Disk {
            return false;
        }

        let state = self.state.lock();
        if !state.closing.borrow_mut().insert(handle) {
            debug!("[FileAccessServer] Nested close ignored: {handle}");
            return false;
        }
        let _marker = ClosingMarker {
            closing: &state.closing,
            handle,
        };

        let removed = state.handles.borrow_mut().remove(handle);
        let Some(entry) = removed else {
            return false;
        };

        entry.emulator.close_handle(handle, &entry);
        debug!(
            "[FileAccessServer] Closed emulated handle: {handle}, File: {}",
            entry.path.display()
        );
        true
    }
}
