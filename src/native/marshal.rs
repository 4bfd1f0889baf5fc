// In: src/native/marshal.rs

//! The one place where Rust text meets the libsfh calling convention.
//!
//! libsfh follows the Fortran string convention: a pointer to the characters
//! plus a hidden, by-value length appended after all other arguments. Nothing
//! is NUL-terminated. Outgoing fixed-width buffers come back blank padded and
//! occasionally NUL padded.

use std::os::raw::c_char;

/// A borrowed text argument ready to cross the native boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeText<'a> {
    bytes: &'a [u8],
}

impl<'a> NativeText<'a> {
    pub fn as_ptr(&self) -> *const c_char {
        self.bytes.as_ptr() as *const c_char
    }

    /// The length companion passed after the regular arguments.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

/// Converts caller text into its native byte form and length.
///
/// Accepts anything byte-like, so `str` and raw byte strings take the same path.
pub fn marshal<T: AsRef<[u8]> + ?Sized>(text: &T) -> NativeText<'_> {
    NativeText {
        bytes: text.as_ref(),
    }
}

/// Converts a fixed-width native field back to text: NULs removed, padding trimmed.
pub fn unmarshal(field: &[u8]) -> String {
    let cleaned: Vec<u8> = field.iter().copied().filter(|&b| b != 0).collect();
    String::from_utf8_lossy(&cleaned).trim().to_string()
}

/// Allocates a blank-filled buffer for a fixed-width output field.
pub fn blank_buffer(len: usize) -> Vec<u8> {
    vec![b' '; len]
}
