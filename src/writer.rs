//! The two-strategy writer: an in-place update that reuses existing ilst +
//! trailing free space, falling back to a full rewrite-then-rename that
//! preserves every other box byte-for-byte.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::boxes::header::BoxHeader;
use crate::boxes::{FileMap, ILST, MOOV, UDTA};
use crate::item::{build_udta, encode_ilst_content};
use crate::tag::SimpleTag;
use crate::{Error, ErrorKind, Result};

const COPY_BUF_LEN: usize = 64 * 1024;

/// Internal signal raised when the existing ilst + trailing free space can't
/// hold the new content. This never becomes a public [`Error`] — it's caught
/// inside this module and escalates straight to [`rewrite_then_rename`].
enum InPlaceErr {
    NoSpace,
    Real(Error),
}

impl From<Error> for InPlaceErr {
    fn from(e: Error) -> Self {
        InPlaceErr::Real(e)
    }
}

impl From<std::io::Error> for InPlaceErr {
    fn from(e: std::io::Error) -> Self {
        InPlaceErr::Real(e.into())
    }
}

/// Writes `items` as the file's complete metadata.
///
/// Tries the in-place strategy first when an `ilst` already exists; falls
/// back to the rewrite-then-rename strategy otherwise or when there isn't
/// enough reusable space. Returns the freshly parsed [`FileMap`] for the
/// file as it now stands on disk.
pub fn write_items(file: &mut File, map: &FileMap, items: &[SimpleTag], path: &Path) -> Result<FileMap> {
    if map.has_ilst() {
        let ilst_content = encode_ilst_content(items)?;
        match try_in_place(file, map, &ilst_content) {
            Ok(()) => {
                file.sync_all()?;
                let new_len = file.metadata()?.len();
                file.seek(SeekFrom::Start(0))?;
                return FileMap::build(file, new_len);
            }
            Err(InPlaceErr::NoSpace) => {}
            Err(InPlaceErr::Real(e)) => return Err(e),
        }
    }
    rewrite_then_rename(file, items, path)
}

/// Always takes the rewrite-then-rename path, skipping the in-place attempt
/// entirely. This is the forced-rewrite entry point applications that can't
/// tolerate Strategy 1's torn-write risk window should call instead of
/// [`write_items`].
pub fn force_rewrite(file: &mut File, items: &[SimpleTag], path: &Path) -> Result<FileMap> {
    rewrite_then_rename(file, items, path)
}

fn try_in_place(file: &mut File, map: &FileMap, ilst_content: &[u8]) -> std::result::Result<(), InPlaceErr> {
    let ilst = map.ilst.expect("write_items only calls this when has_ilst()");
    let new_ilst_total = 8 + ilst_content.len() as u64;
    let trailing_free_size = map.trailing_free.map(|f| f.total_size).unwrap_or(0);
    let available = ilst.total_size + trailing_free_size;

    if new_ilst_total > available {
        return Err(InPlaceErr::NoSpace);
    }

    file.seek(SeekFrom::Start(ilst.offset))?;
    BoxHeader::write(file, ILST, new_ilst_total)?;
    file.write_all(ilst_content)?;

    let remaining = available - new_ilst_total;
    if remaining >= 8 {
        BoxHeader::write_free_box(file, remaining)?;
    } else if remaining > 0 {
        file.write_all(&vec![0u8; remaining as usize])?;
    }

    Ok(())
}

fn rewrite_then_rename(file: &mut File, items: &[SimpleTag], path: &Path) -> Result<FileMap> {
    let file_len = file.metadata()?.len();
    let scratch_path = scratch_path_for(path);
    let new_udta = build_udta(items)?;

    let result = (|| -> Result<()> {
        let mut scratch =
            OpenOptions::new().read(true).write(true).create(true).truncate(true).open(&scratch_path)?;

        file.seek(SeekFrom::Start(0))?;
        let mut pos = 0u64;
        while pos < file_len {
            file.seek(SeekFrom::Start(pos))?;
            let header = BoxHeader::read(file, file_len)?;
            if header.fourcc == MOOV {
                copy_moov_replacing_udta(file, &mut scratch, header, &new_udta)?;
            } else {
                copy_verbatim(file, &mut scratch, header.offset, header.total_size)?;
            }
            pos = header.end();
        }
        scratch.sync_all()?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&scratch_path);
        return Err(e);
    }

    if let Err(e) = fs::rename(&scratch_path, path) {
        let _ = fs::remove_file(&scratch_path);
        return Err(Error::new(ErrorKind::RenameFailed(e), "failed to rename rewrite scratch file over original"));
    }

    let mut reopened = OpenOptions::new().read(true).write(true).open(path)?;
    let new_len = reopened.metadata()?.len();
    let new_map = FileMap::build(&mut reopened, new_len)?;
    *file = reopened;
    Ok(new_map)
}

fn copy_moov_replacing_udta<R: Read + Seek>(
    src: &mut R,
    dst: &mut File,
    moov: BoxHeader,
    new_udta: &[u8],
) -> Result<()> {
    let mut kept_total: u64 = 0;
    let mut pos = moov.data_offset;
    while pos < moov.end() {
        src.seek(SeekFrom::Start(pos))?;
        let child = BoxHeader::read(src, moov.end())?;
        if child.fourcc != UDTA {
            kept_total += child.total_size;
        }
        pos = child.end();
    }

    let new_moov_total = 8 + kept_total + new_udta.len() as u64;
    BoxHeader::write(dst, MOOV, new_moov_total)?;

    let mut pos = moov.data_offset;
    while pos < moov.end() {
        src.seek(SeekFrom::Start(pos))?;
        let child = BoxHeader::read(src, moov.end())?;
        if child.fourcc != UDTA {
            copy_verbatim(src, dst, child.offset, child.total_size)?;
        }
        pos = child.end();
    }
    dst.write_all(new_udta)?;
    Ok(())
}

fn copy_verbatim<R: Read + Seek, W: Write>(src: &mut R, dst: &mut W, offset: u64, len: u64) -> Result<()> {
    src.seek(SeekFrom::Start(offset))?;
    let mut remaining = len;
    let mut buf = [0u8; COPY_BUF_LEN];
    while remaining > 0 {
        let chunk = remaining.min(buf.len() as u64) as usize;
        src.read_exact(&mut buf[..chunk])?;
        dst.write_all(&buf[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

fn scratch_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::filemap::FileMap;

    fn box_bytes(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let total = 8 + payload.len() as u32;
        let mut buf = total.to_be_bytes().to_vec();
        buf.extend_from_slice(fourcc);
        buf.extend_from_slice(payload);
        buf
    }

    fn sample_file_bytes(trailing_free_len: usize) -> Vec<u8> {
        let ftyp = box_bytes(b"ftyp", b"isom\x00\x00\x00\x00isom");

        let mut hdlr_payload = vec![0u8; 16];
        hdlr_payload[8..12].copy_from_slice(b"mdir");
        hdlr_payload[12..16].copy_from_slice(b"appl");
        hdlr_payload.extend_from_slice(&[0u8; 9]);
        let hdlr = box_bytes(b"hdlr", &hdlr_payload);

        let nam_data = {
            let mut d = 20u32.to_be_bytes().to_vec();
            d.extend_from_slice(b"data");
            d.extend_from_slice(&1u32.to_be_bytes());
            d.extend_from_slice(&0u32.to_be_bytes());
            d.extend_from_slice(b"Test");
            d
        };
        let nam_item = box_bytes(b"\xa9nam", &nam_data);
        let ilst = box_bytes(b"ilst", &nam_item);

        let mut meta_payload = vec![0u8; 4];
        meta_payload.extend_from_slice(&hdlr);
        meta_payload.extend_from_slice(&ilst);
        let meta = box_bytes(b"meta", &meta_payload);

        let mut udta_payload = meta;
        if trailing_free_len > 0 {
            udta_payload.extend_from_slice(&box_bytes(b"free", &vec![0u8; trailing_free_len - 8]));
        }
        let udta = box_bytes(b"udta", &udta_payload);
        let moov = box_bytes(b"moov", &udta);
        let mdat = box_bytes(b"mdat", &[0xABu8; 32]);

        let mut out = ftyp;
        out.extend_from_slice(&moov);
        out.extend_from_slice(&mdat);
        out
    }

    #[test]
    fn strategy_one_preserves_file_length_and_mdat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.m4a");
        let data = sample_file_bytes(512);
        fs::write(&path, &data).unwrap();

        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        let map = FileMap::build(&mut file, len).unwrap();
        let mdat = map.mdat.unwrap();

        let items = vec![SimpleTag::with_value("title", "New Title")];
        let new_map = write_items(&mut file, &map, &items, &path).unwrap();

        let new_len = file.metadata().unwrap().len();
        assert_eq!(new_len, len, "strategy 1 must not change file length");
        assert_eq!(new_map.mdat.unwrap().offset, mdat.offset, "mdat must not move");

        let decoded = crate::item::decode_ilst(&mut file, new_map.ilst.unwrap()).unwrap();
        assert_eq!(decoded[0].value.as_deref(), Some("New Title"));
    }

    #[test]
    fn strategy_two_triggers_when_no_free_space_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.m4a");
        let data = sample_file_bytes(0);
        fs::write(&path, &data).unwrap();

        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        let map = FileMap::build(&mut file, len).unwrap();

        let items = vec![SimpleTag::with_value(
            "title",
            "A Very Long Replacement Title That Cannot Possibly Fit In The Old ilst Box",
        )];
        let new_map = write_items(&mut file, &map, &items, &path).unwrap();

        let decoded = crate::item::decode_ilst(&mut file, new_map.ilst.unwrap()).unwrap();
        assert_eq!(
            decoded[0].value.as_deref(),
            Some("A Very Long Replacement Title That Cannot Possibly Fit In The Old ilst Box")
        );
        assert!(!scratch_path_for(&path).exists(), "scratch file must be cleaned up after rename");
    }

    #[test]
    fn rewrite_preserves_mdat_bytes_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.m4a");
        let data = sample_file_bytes(0);
        fs::write(&path, &data).unwrap();

        let mut file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        let len = file.metadata().unwrap().len();
        let map = FileMap::build(&mut file, len).unwrap();
        let old_mdat = map.mdat.unwrap();
        let mut old_mdat_bytes = vec![0u8; old_mdat.data_size as usize];
        file.seek(SeekFrom::Start(old_mdat.data_offset)).unwrap();
        file.read_exact(&mut old_mdat_bytes).unwrap();

        let items = vec![SimpleTag::with_value(
            "title",
            "Force a rewrite with a title long enough to overflow available space",
        )];
        let new_map = write_items(&mut file, &map, &items, &path).unwrap();
        let new_mdat = new_map.mdat.unwrap();
        let mut new_mdat_bytes = vec![0u8; new_mdat.data_size as usize];
        file.seek(SeekFrom::Start(new_mdat.data_offset)).unwrap();
        file.read_exact(&mut new_mdat_bytes).unwrap();

        assert_eq!(old_mdat_bytes, new_mdat_bytes);
    }

    #[test]
    fn scratch_path_appends_tmp_suffix() {
        let p = Path::new("/tmp/song.m4a");
        assert_eq!(scratch_path_for(p), PathBuf::from("/tmp/song.m4a.tmp"));
    }
}
