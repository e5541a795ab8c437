use std::io::{Read, Seek, SeekFrom};

use super::header::BoxHeader;
use super::{COMPATIBLE_BRANDS, FREE, FTYP, HDLR, ILST, MAJOR_BRANDS, MDAT, META, MOOV, SKIP, UDTA};
use crate::{Error, ErrorKind, Result};

/// The full-box version+flags prefix every `meta` box carries before its
/// children.
const META_FULLBOX_PREFIX_LEN: u64 = 4;

/// Positions and presence flags for the box tree this core cares about.
///
/// `has_ilst() ⇒ has_meta() ∧ has_udta()`: `ilst` is only ever located by
/// descending through `udta` and `meta`, so its presence already implies
/// theirs.
#[derive(Debug, Clone)]
pub struct FileMap {
    pub ftyp: Option<BoxHeader>,
    pub moov: BoxHeader,
    pub mdat: Option<BoxHeader>,
    pub udta: Option<BoxHeader>,
    pub meta: Option<BoxHeader>,
    pub hdlr: Option<BoxHeader>,
    pub ilst: Option<BoxHeader>,
    pub trailing_free: Option<BoxHeader>,
}

impl FileMap {
    pub fn has_udta(&self) -> bool {
        self.udta.is_some()
    }

    pub fn has_meta(&self) -> bool {
        self.meta.is_some()
    }

    pub fn has_ilst(&self) -> bool {
        self.ilst.is_some()
    }

    /// Parses the box tree rooted at the start of `reader`, validating the
    /// container brand and locating every box this core operates on.
    pub fn build<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<FileMap> {
        reader.seek(SeekFrom::Start(0))?;

        let top = scan_children(reader, 0, file_len)?;

        let ftyp = top.iter().find(|b| b.fourcc == FTYP).copied();
        match &ftyp {
            Some(h) if h.offset == 0 => validate_brand(reader, *h)?,
            _ => return Err(Error::new(ErrorKind::NotMp4, "file does not start with an ftyp box")),
        }

        let moov =
            top.iter().find(|b| b.fourcc == MOOV).copied().ok_or_else(|| {
                Error::new(ErrorKind::NotMp4, "no moov box present")
            })?;
        let mdat = top.iter().find(|b| b.fourcc == MDAT).copied();

        let moov_children = scan_children(reader, moov.data_offset, moov.end())?;
        let udta = moov_children.iter().find(|b| b.fourcc == UDTA).copied();

        let (meta, hdlr, ilst) = if let Some(udta) = udta {
            let udta_children = scan_children(reader, udta.data_offset, udta.end())?;
            let meta = udta_children.iter().find(|b| b.fourcc == META).copied();
            if let Some(meta) = meta {
                let children_start = meta_children_offset(&meta);
                if children_start > meta.end() {
                    return Err(Error::new(ErrorKind::Corrupt, "meta box smaller than its full-box prefix"));
                }
                let meta_children = scan_children(reader, children_start, meta.end())?;
                let hdlr = meta_children.iter().find(|b| b.fourcc == HDLR).copied();
                let ilst = meta_children.iter().find(|b| b.fourcc == ILST).copied();
                (Some(meta), hdlr, ilst)
            } else {
                (None, None, None)
            }
        } else {
            (None, None, None)
        };

        let trailing_free = if let (Some(meta), Some(ilst)) = (meta, ilst) {
            find_trailing_free(reader, ilst.end(), meta.end())?
        } else {
            None
        };

        Ok(FileMap { ftyp, moov, mdat, udta, meta, hdlr, ilst, trailing_free })
    }
}

/// Reads consecutive box headers over `[start, end)`, stopping cleanly at
/// `end`. A box whose header would run past `end` is a local error — it
/// doesn't abort the whole parse, but the caller can't keep walking past it.
fn scan_children<R: Read + Seek>(reader: &mut R, start: u64, end: u64) -> Result<Vec<BoxHeader>> {
    let mut pos = start;
    let mut out = Vec::new();
    while pos < end {
        reader.seek(SeekFrom::Start(pos))?;
        let header = BoxHeader::read(reader, end)?;
        pos = header.end();
        out.push(header);
    }
    Ok(out)
}

/// Offset where `meta`'s children begin, i.e. past its full-box prefix.
fn meta_children_offset(meta: &BoxHeader) -> u64 {
    meta.data_offset + META_FULLBOX_PREFIX_LEN
}

fn validate_brand<R: Read + Seek>(reader: &mut R, ftyp: BoxHeader) -> Result<()> {
    if ftyp.data_size < 8 {
        return Err(Error::new(ErrorKind::BadBox, "ftyp box too small to carry a major brand"));
    }
    reader.seek(SeekFrom::Start(ftyp.data_offset))?;
    let mut major = [0u8; 4];
    reader.read_exact(&mut major)?;

    if MAJOR_BRANDS.contains(&major) {
        return Ok(());
    }

    // Skip minor_version (4 bytes), then scan the compatible-brands list.
    reader.seek(SeekFrom::Start(ftyp.data_offset + 8))?;
    let remaining = ftyp.data_size - 8;
    let count = remaining / 4;
    for _ in 0..count {
        let mut brand = [0u8; 4];
        reader.read_exact(&mut brand)?;
        if COMPATIBLE_BRANDS.contains(&brand) {
            return Ok(());
        }
    }

    Err(Error::new(ErrorKind::NotMp4, format!("unrecognized major brand {major:?} and no compatible brand matched")))
}

fn find_trailing_free<R: Read + Seek>(
    reader: &mut R,
    after: u64,
    bound: u64,
) -> Result<Option<BoxHeader>> {
    if after >= bound {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(after))?;
    let header = BoxHeader::read(reader, bound)?;
    if header.fourcc == FREE || header.fourcc == SKIP {
        Ok(Some(header))
    } else {
        Ok(None)
    }
}
