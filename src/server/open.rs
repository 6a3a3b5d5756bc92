//! Create/open interception.

use log::debug;

use super::FileAccessServer;
use crate::native::{IoStatusBlock, NtStatus, OpenRequest, RawHandle};
use crate::route::RouteScope;

impl FileAccessServer {
    /// Intercepted create/open.
    ///
    /// The real open always runs first and its status is returned unchanged.
    /// On success the new handle is resolved to its canonical path and
    /// offered to the emulators in registration order; the first to accept
    /// becomes the handle's owner with the cursor at 0.
    ///
    /// The route seen by nested opens (issued by emulators while claiming)
    /// is extended by this file's path, and restored on every exit.
    pub fn create_file(
        &self,
        request: &OpenRequest,
        handle: &mut RawHandle,
        io_status: &mut IoStatusBlock,
    ) -> NtStatus {
        let state = self.state.lock();
        let scope = RouteScope::enter(&state.route);

        let status = self.api.create(request, handle, io_status);
        if !status.is_success() {
            return status;
        }

        let handle = *handle;
        let Some(path) = self.resolver.final_path(handle) else {
            debug!("[FileAccessServer] Can't get final file name: {handle}");
            return status;
        };

        if self.config.is_excluded(&path) {
            return status;
        }

        let route = scope.push(&path.to_string_lossy());
        debug!(
            "[FileAccessServer] Accessing: {handle}, {}, Route: {route}",
            path.display()
        );

        let parent = scope.saved().full_path_or_empty();
        if let Some(emulator) = self.emulators.try_create(handle, &path, parent) {
            debug!(
                "[FileAccessServer] Claimed by {}: {handle}, {}",
                emulator.name(),
                path.display()
            );
            state.handles.borrow_mut().register(handle, path, 0, emulator);
        }

        status
    }
}
