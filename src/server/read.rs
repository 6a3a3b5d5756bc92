//! Read interception.

use log::debug;

use super::FileAccessServer;
use crate::native::{
    FILE_USE_FILE_POINTER_POSITION, FileInformation, IoStatusBlock, NtStatus, RawHandle,
};

impl FileAccessServer {
    /// Intercepted read.
    ///
    /// Untracked handles go straight to the real read. For a claimed handle
    /// the owning emulator is asked for bytes at the explicit `byte_offset`,
    /// or at the tracked cursor when the offset is `None` or
    /// [`FILE_USE_FILE_POINTER_POSITION`]. On success the cursor advances by
    /// the bytes produced and the real file pointer is moved to match. If the
    /// emulator can't serve the region, the real read runs unmodified.
    pub fn read_file(
        &self,
        handle: RawHandle,
        io_status: &mut IoStatusBlock,
        buffer: &mut [u8],
        byte_offset: Option<i64>,
    ) -> NtStatus {
        let state = self.state.lock();
        let entry = state.entry(handle);
        let Some(entry) = entry else {
            return self.api.read(handle, io_status, buffer, byte_offset);
        };

        let offset = match byte_offset {
            Some(offset) if offset != FILE_USE_FILE_POINTER_POSITION => offset,
            _ => entry.offset,
        };

        debug!(
            "[FileAccessServer] Read Request, Handle: {handle}, Length: {}, Offset: {offset}",
            buffer.len()
        );

        let Some(produced) = entry.emulator.read_data(handle, buffer, offset, &entry) else {
            debug!(
                "[FileAccessServer] Read fallback, Handle: {handle}, Offset: {offset}, File: {}",
                entry.path.display()
            );
            return self.api.read(handle, io_status, buffer, byte_offset);
        };

        // Never report more than the caller asked for
        let produced = produced.min(buffer.len());
        debug!("[FileAccessServer] Read Success, Length: {produced}, Offset: {offset}");

        let next = offset.saturating_add(produced as i64);
        self.set_information_locked(
            &state,
            handle,
            io_status,
            &FileInformation::Position(next),
        );

        io_status.complete(NtStatus::SUCCESS, produced);
        NtStatus::SUCCESS
    }
}
