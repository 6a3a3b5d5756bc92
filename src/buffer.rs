//! Byte buffer and offset helpers for emulator implementations.

use std::fmt;
use std::io::{self, Read};

/// Fill `buf` completely from `reader`.
///
/// Like [`Read::read_exact`], but reports a short stream instead of failing:
/// returns `(true, buf.len())` when every byte was read, otherwise
/// `(false, n)` with the `n` bytes that were read before the stream ended
/// or errored. Interrupted reads are retried.
pub fn try_read<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> (bool, usize) {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return (false, filled),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => return (false, filled),
        }
    }
    (true, filled)
}

/// Copy bytes of `src` starting at `offset` into `dst`.
///
/// Returns the number of bytes copied, which is short when the end of `src`
/// is reached. Returns `None` when `offset` is negative or at/past the end
/// of `src` (nothing to emulate there), unless `dst` is empty.
pub fn read_at(src: &[u8], offset: i64, dst: &mut [u8]) -> Option<usize> {
    let start = usize::try_from(offset).ok()?;
    if dst.is_empty() {
        return (start <= src.len()).then_some(0);
    }
    let available = src.get(start..).filter(|rest| !rest.is_empty())?;
    let count = available.len().min(dst.len());
    dst[..count].copy_from_slice(&available[..count]);
    Some(count)
}

// =============================================================================
// FixedName
// =============================================================================

/// Fixed-capacity ASCII name field, as stored in archive entry tables.
///
/// The field is exactly `N` bytes. Decoding stops at the first NUL and drops
/// trailing spaces; bytes outside ASCII decode as U+FFFD. Encoding truncates
/// to `N` bytes and pads the rest with NUL.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedName<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedName<N> {
    /// Capacity of the field in bytes.
    pub const CAPACITY: usize = N;

    /// Wrap a raw field.
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    /// Encode `name`, truncating to `N` bytes.
    ///
    /// Truncation is byte-wise; names are expected to be ASCII.
    pub fn encode(name: &str) -> Self {
        let mut bytes = [0u8; N];
        let src = name.as_bytes();
        let len = src.len().min(N);
        bytes[..len].copy_from_slice(&src[..len]);
        Self { bytes }
    }

    /// Raw field bytes.
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Meaningful bytes: up to the first NUL, trailing spaces removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        let mut name = &self.bytes[..end];
        while let [rest @ .., b' '] = name {
            name = rest;
        }
        name
    }

    /// Decode as text.
    pub fn decode(&self) -> String {
        self.trimmed()
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect()
    }

    /// Check if the field holds no name.
    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }
}

impl<const N: usize> Default for FixedName<N> {
    fn default() -> Self {
        Self { bytes: [0; N] }
    }
}

impl<const N: usize> fmt::Display for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.decode())
    }
}

impl<const N: usize> fmt::Debug for FixedName<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedName<{N}>({:?})", self.decode())
    }
}
