//! Set-position and query-size interception.

use log::{debug, info};

use super::{FileAccessServer, ServerState};
use crate::native::{FileInformation, FileInformationClass, IoStatusBlock, NtStatus, RawHandle};

impl FileAccessServer {
    /// Intercepted set-information.
    ///
    /// Position updates on a claimed handle also move the tracked cursor,
    /// whether they arrive typed or as a raw position record.
    /// The call is always forwarded to the real primitive, so both cursors
    /// stay in step and a fallback read starts from the right place.
    pub fn set_information_file(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &FileInformation,
    ) -> NtStatus {
        let state = self.state.lock();
        self.set_information_locked(&state, handle, io_status, info)
    }

    pub(crate) fn set_information_locked(
        &self,
        state: &ServerState,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &FileInformation,
    ) -> NtStatus {
        if let Some(offset) = info.as_position() {
            let tracked = state.handles.borrow_mut().set_offset(handle, offset);
            if tracked {
                debug!("[FileAccessServer] Seek, Handle: {handle}, Offset: {offset}");
            }
        }
        self.api.set_information(handle, io_status, info)
    }

    /// Intercepted query-information.
    ///
    /// The real query runs first. If it succeeded, the handle is claimed and
    /// the query is for standard information (typed or a raw record), the
    /// owning emulator may replace the reported end of file. A failed real
    /// query is never patched. Everything else is returned as the
    /// real primitive produced it.
    pub fn query_information_file(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        info: &mut FileInformation,
    ) -> NtStatus {
        let state = self.state.lock();
        let status = self.api.query_information(handle, io_status, info);

        if info.class() != FileInformationClass::Standard || !status.is_success() {
            return status;
        }
        let Some(old_size) = info.end_of_file() else {
            return status;
        };
        let entry = state.entry(handle);
        let Some(entry) = entry else {
            return status;
        };

        match entry
            .emulator
            .file_size(handle, &entry)
            .filter(|size| *size >= 0)
        {
            Some(new_size) => {
                info.set_end_of_file(new_size);
                if self.config.log_size_overrides {
                    info!(
                        "File Size Override | Old: {old_size}, New: {new_size} | {}",
                        entry.path.display()
                    );
                }
            }
            None => debug!(
                "[FileAccessServer] No size override, Size: {old_size} | {}",
                entry.path.display()
            ),
        }

        status
    }
}
