//! Reading and writing iTunes style metadata inside ISO Base Media File
//! Format containers (`.mp4`, `.m4a`, `.m4b`, `.m4v`, `.m4p`, `.mov`).
//!
//! Metadata lives in the nested box hierarchy `moov > udta > meta > ilst` and
//! consists of named items — title, artist, track number, cover art, and so
//! on. [`TagFile`] is the entry point: open a file, read or mutate its
//! [`Collection`] of [`Tag`]s, and the writer below picks the cheapest safe
//! way to get the change back onto disk.

mod boxes;
mod error;
mod fourcc;
mod ident;
mod io_util;
mod item;
mod tag;
mod writer;

pub use error::{Error, ErrorKind, Result};
pub use fourcc::Fourcc;
pub use tag::{Collection, SimpleTag, Tag, TagTarget};

use std::fs::OpenOptions;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use boxes::FileMap;

/// The crate version, exposed the way a C library would expose `version()`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// An open ISO-BMFF file and everything needed to read or rewrite its
/// metadata.
///
/// Holds at most one cached, parsed [`Collection`]: any mutating call
/// invalidates it, and the next [`TagFile::read_tags`] reparses from disk.
/// Dropping a `TagFile` closes the underlying file handle; [`TagFile::close`]
/// does the same thing early and is safe to call more than once.
pub struct TagFile {
    path: PathBuf,
    file: Option<std::fs::File>,
    read_only: bool,
    map: Option<FileMap>,
    cached: Option<Collection>,
}

impl TagFile {
    /// Opens `path` read-only. Mutating calls return [`ErrorKind::ReadOnly`].
    pub fn open(path: impl AsRef<Path>) -> Result<TagFile> {
        Self::open_impl(path.as_ref(), true)
    }

    /// Opens `path` read/write, allowing [`TagFile::write_tags`] and friends.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<TagFile> {
        Self::open_impl(path.as_ref(), false)
    }

    fn open_impl(path: &Path, read_only: bool) -> Result<TagFile> {
        let mut file = OpenOptions::new().read(true).write(!read_only).open(path)?;
        let len = file.metadata()?.len();
        let map = FileMap::build(&mut file, len)?;
        Ok(TagFile {
            path: path.to_path_buf(),
            file: Some(file),
            read_only,
            map: Some(map),
            cached: None,
        })
    }

    /// Closes the file early. Idempotent: closing an already-closed
    /// `TagFile` is a no-op rather than an error.
    pub fn close(&mut self) {
        self.file = None;
        self.map = None;
        self.cached = None;
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    fn file_mut(&mut self) -> Result<&mut std::fs::File> {
        self.file.as_mut().ok_or_else(|| Error::new(ErrorKind::NotOpen, "no file is open"))
    }

    fn map(&self) -> Result<&FileMap> {
        self.map.as_ref().ok_or_else(|| Error::new(ErrorKind::NotOpen, "no file is open"))
    }

    /// Returns the parsed [`Collection`], reusing the cached one from a
    /// previous call when nothing has mutated the file since.
    pub fn read_tags(&mut self) -> Result<&Collection> {
        if self.cached.is_none() {
            let map = self.map()?.clone();
            let ilst = map
                .ilst
                .ok_or_else(|| Error::new(ErrorKind::NoTags, "file has no ilst metadata"))?;
            let file = self.file_mut()?;
            let items = item::decode_ilst(file, ilst)?;
            let mut tag = Tag::for_mp4();
            tag.items = items;
            let mut collection = Collection::new();
            collection.push(tag);
            self.cached = Some(collection);
        }
        Ok(self.cached.as_ref().expect("just populated above"))
    }

    /// Copies the value of `name` into `buf`, returning the number of bytes
    /// written. Name lookup is case-insensitive.
    pub fn read_tag_string(&mut self, name: &str, buf: &mut [u8]) -> Result<usize> {
        let value = self
            .read_tags()?
            .find(name)
            .and_then(|item| item.value.as_deref())
            .ok_or_else(|| Error::new(ErrorKind::TagNotFound, format!("no tag named '{name}'")))?;
        let bytes = value.as_bytes();
        if bytes.len() > buf.len() {
            return Err(Error::new(ErrorKind::TagTooLarge, "caller buffer too small for tag value"));
        }
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Replaces the file's entire metadata with `collection`.
    pub fn write_tags(&mut self, collection: &Collection) -> Result<()> {
        self.write_items(flatten(collection), false)
    }

    /// Like [`TagFile::write_tags`], but always takes the rewrite-then-rename
    /// path rather than trying the in-place update first. For callers that
    /// can't tolerate Strategy 1's torn-write risk window.
    pub fn write_tags_forced_rewrite(&mut self, collection: &Collection) -> Result<()> {
        self.write_items(flatten(collection), true)
    }

    fn write_items(&mut self, items: Vec<SimpleTag>, forced_rewrite: bool) -> Result<()> {
        if self.read_only {
            return Err(Error::new(ErrorKind::ReadOnly, "file was opened read-only"));
        }
        self.cached = None;
        let map = self.map()?.clone();
        let path = self.path.clone();
        let file = self.file_mut()?;
        let new_map = if forced_rewrite {
            writer::force_rewrite(file, &items, &path)?
        } else {
            writer::write_items(file, &map, &items, &path)?
        };
        self.map = Some(new_map);
        Ok(())
    }

    /// Sets `name` to `value`, preserving every other existing tag. Passing
    /// `None` removes the tag (equivalent to [`TagFile::remove_tag`]).
    pub fn set_tag_string(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        if self.read_only {
            return Err(Error::new(ErrorKind::ReadOnly, "file was opened read-only"));
        }
        let existing = match self.read_tags() {
            Ok(collection) => flatten(collection),
            Err(e) if e.kind_is_no_tags() => Vec::new(),
            Err(e) => return Err(e),
        };
        let mut items: Vec<SimpleTag> =
            existing.into_iter().filter(|item| !item.name.eq_ignore_ascii_case(name)).collect();
        if let Some(value) = value {
            items.push(SimpleTag::with_value(name, value));
        }
        self.write_items(items, false)
    }

    /// Removes `name` entirely. Equivalent to `set_tag_string(name, None)`.
    pub fn remove_tag(&mut self, name: &str) -> Result<()> {
        self.set_tag_string(name, None)
    }
}

impl Error {
    fn kind_is_no_tags(&self) -> bool {
        matches!(self.kind, ErrorKind::NoTags)
    }
}

fn flatten(collection: &Collection) -> Vec<SimpleTag> {
    collection.tags.iter().flat_map(|t| t.items.clone()).collect()
}
