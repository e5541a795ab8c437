use std::borrow::Cow;
use std::{error, fmt, io, string};

/// Type alias for the result of a core operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The closed set of ways a core operation can fail.
///
/// New variants may be added in a future minor release, so callers should
/// always include a wildcard arm when matching.
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An argument passed to a public entry point was invalid (empty tag name,
    /// zero-length caller buffer, ...).
    InvalidArg,
    /// An operation that requires an open file was called on a closed one.
    NotOpen,
    /// `open`/`open_rw` was called on an already-open instance.
    AlreadyOpen,
    /// A mutating operation was attempted on a file opened read-only.
    ReadOnly,
    /// An allocation failed. Rust's global allocator reports this as a
    /// process abort rather than a `Result`, so this variant only ever
    /// originates from capacity-checked `Vec`/`String` growth.
    NoMemory,
    /// A generic I/O error that doesn't have a more specific variant.
    Io(io::Error),
    /// Seeking within the file failed.
    SeekFailed(io::Error),
    /// Writing to the file failed.
    WriteFailed(io::Error),
    /// Renaming the rewrite scratch file over the original failed.
    RenameFailed(io::Error),
    /// The file isn't a recognized ISO-BMFF / MP4 family container.
    NotMp4,
    /// A box header was structurally invalid (e.g. `total_size < header_size`).
    BadBox,
    /// The box tree is internally inconsistent (a torn write, a box that
    /// claims a size its container cannot contain, ...).
    Corrupt,
    /// The reader ran out of bytes before a box header or payload completed.
    Truncated,
    /// A wire feature was recognized but isn't supported by this core
    /// (e.g. an item data type outside the ones listed in the codec).
    Unsupported,
    /// `read_tags` was called but no `ilst` is present in the file.
    NoTags,
    /// The requested tag name has no corresponding item in the collection.
    TagNotFound,
    /// The caller-provided buffer is smaller than the value it would receive.
    TagTooLarge,
}

/// An error produced by a core operation, carrying both its [`ErrorKind`]
/// and a human-readable description.
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// A human readable string describing the error.
    pub description: Cow<'static, str>,
}

impl Error {
    /// Creates a new error of the given kind with the given description.
    pub fn new(kind: ErrorKind, description: impl Into<Cow<'static, str>>) -> Error {
        Error { kind, description: description.into() }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e)
            | ErrorKind::SeekFailed(e)
            | ErrorKind::WriteFailed(e)
            | ErrorKind::RenameFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        let description = format!("IO error: {err}");
        Error::new(ErrorKind::Io(err), description)
    }
}

impl From<string::FromUtf8Error> for Error {
    fn from(err: string::FromUtf8Error) -> Error {
        Error::new(ErrorKind::Corrupt, format!("Item value is not valid utf-8: {err}"))
    }
}

impl From<string::FromUtf16Error> for Error {
    fn from(err: string::FromUtf16Error) -> Error {
        Error::new(ErrorKind::Corrupt, format!("Item value is not valid utf-16: {err}"))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{}: {:?}", self.description, self.kind)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{}", self.kind.strerror())
        } else {
            write!(f, "{}", self.description)
        }
    }
}

impl ErrorKind {
    /// Returns a stable, human readable string for this kind, analogous to
    /// the C API's `strerror(code)`. Unknown/future kinds fall back to a
    /// generic message instead of panicking.
    pub fn strerror(&self) -> &'static str {
        match self {
            Self::InvalidArg => "invalid argument",
            Self::NotOpen => "no file is open",
            Self::AlreadyOpen => "a file is already open",
            Self::ReadOnly => "file was opened read-only",
            Self::NoMemory => "allocation failed",
            Self::Io(_) => "I/O error",
            Self::SeekFailed(_) => "seek failed",
            Self::WriteFailed(_) => "write failed",
            Self::RenameFailed(_) => "rename failed",
            Self::NotMp4 => "not a recognized MP4/ISO-BMFF file",
            Self::BadBox => "malformed box header",
            Self::Corrupt => "corrupt metadata",
            Self::Truncated => "unexpected end of file",
            Self::Unsupported => "unsupported feature",
            Self::NoTags => "no tags present",
            Self::TagNotFound => "tag not found",
            Self::TagTooLarge => "buffer too small for tag value",
        }
    }
}
