use std::fmt::{self, Write};
use std::ops::{Deref, DerefMut};

/// A big-endian 4 byte atom identifier (four character code).
///
/// Non-ASCII bytes are permitted and common: the iTunes copyright atom
/// `©too` starts with `0xA9`, which isn't valid ASCII but is a perfectly
/// valid `Fourcc` byte.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Fourcc(pub [u8; 4]);

impl Deref for Fourcc {
    type Target = [u8; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Fourcc {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl fmt::Debug for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fourcc({self})")
    }
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter() {
            f.write_char(char::from(*b))?;
        }
        Ok(())
    }
}

impl Fourcc {
    /// Builds a `Fourcc` from the ASCII bytes of `s`, right-padding with
    /// `NUL` if it is shorter than 4 bytes and truncating if it is longer.
    ///
    /// Non-ASCII strings are still accepted; only the first 4 bytes of the
    /// string's UTF-8 representation are used, matching the C-style
    /// byte-oriented `str_to_fourcc` this is modeled on.
    pub fn from_str_padded(s: &str) -> Self {
        let bytes = s.as_bytes();
        let mut out = [0u8; 4];
        let len = bytes.len().min(4);
        out[..len].copy_from_slice(&bytes[..len]);
        Fourcc(out)
    }

    /// Returns true if `s` is exactly 4 bytes long and therefore usable as a
    /// raw FourCC when it doesn't match any canonical tag name.
    pub fn is_raw_candidate(s: &str) -> bool {
        s.len() == 4
    }
}
