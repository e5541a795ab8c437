//! Encode/decode of iTunes metadata items inside `ilst`.

use std::io::{Read, Seek, SeekFrom};

use crate::boxes::header::BoxHeader;
use crate::boxes::{DATA, FREE, SKIP};
use crate::fourcc::Fourcc;
use crate::ident;
use crate::io_util::{ReadExt, WriteExt};
use crate::tag::SimpleTag;
use crate::{Error, ErrorKind, Result};

/// Data type indicators recognized inside an item's `data` box.
mod indicator {
    pub const IMPLICIT: u32 = 0;
    pub const UTF8: u32 = 1;
    pub const UTF16: u32 = 2;
    pub const JPEG: u32 = 13;
    pub const PNG: u32 = 14;
    pub const INTEGER: u32 = 21;
}

const TRKN: Fourcc = Fourcc(*b"trkn");
const DISK: Fourcc = Fourcc(*b"disk");
const TMPO: Fourcc = Fourcc(*b"tmpo");
const CPIL: Fourcc = Fourcc(*b"cpil");
const PGAP: Fourcc = Fourcc(*b"pgap");
const COVR: Fourcc = Fourcc(*b"covr");
const GNRE: Fourcc = Fourcc(*b"gnre");

/// Decodes every item box under `ilst` into a [`SimpleTag`].
///
/// `free`/`skip` boxes found directly inside `ilst` are skipped rather than
/// treated as items — the same tolerance the box-tree parser applies to a
/// trailing free box after `ilst` itself.
pub fn decode_ilst<R: Read + Seek>(reader: &mut R, ilst: BoxHeader) -> Result<Vec<SimpleTag>> {
    let mut tags = Vec::new();
    let mut pos = ilst.data_offset;
    while pos < ilst.end() {
        reader.seek(SeekFrom::Start(pos))?;
        let item = BoxHeader::read(reader, ilst.end())?;
        pos = item.end();

        if item.fourcc == FREE || item.fourcc == SKIP {
            continue;
        }

        if let Some(tag) = decode_item(reader, item)? {
            tags.push(tag);
        }
    }
    Ok(tags)
}

fn decode_item<R: Read + Seek>(reader: &mut R, item: BoxHeader) -> Result<Option<SimpleTag>> {
    let data = find_data_child(reader, item)?;
    let Some(data) = data else { return Ok(None) };
    if data.data_size < 8 {
        return Ok(None);
    }

    reader.seek(SeekFrom::Start(data.data_offset))?;
    let type_indicator = reader.read_be_u32()?;
    let _locale = reader.read_be_u32()?;
    let value_len = (data.data_size - 8) as usize;
    let raw = reader.read_u8_vec(value_len)?;

    let name = ident::name_of(item.fourcc);

    if item.fourcc == TRKN || item.fourcc == DISK {
        return Ok(Some(SimpleTag::with_value(name, decode_pair(&raw)?)));
    }
    if item.fourcc == TMPO {
        return Ok(Some(SimpleTag::with_value(name, decode_uint_any_len(&raw)?.to_string())));
    }
    if item.fourcc == CPIL || item.fourcc == PGAP {
        return Ok(Some(SimpleTag::with_value(name, decode_uint_any_len(&raw)?.to_string())));
    }

    let tag = match type_indicator {
        indicator::UTF8 | indicator::IMPLICIT => {
            SimpleTag::with_value(name, String::from_utf8(raw)?)
        }
        indicator::UTF16 => {
            let units: Vec<u16> =
                raw.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            SimpleTag::with_value(name, String::from_utf16(&units)?)
        }
        indicator::INTEGER => SimpleTag::with_value(name, decode_uint_any_len(&raw)?.to_string()),
        indicator::JPEG | indicator::PNG => SimpleTag::with_binary(name, raw),
        _ => SimpleTag::with_binary(name, raw),
    };
    Ok(Some(tag))
}

fn find_data_child<R: Read + Seek>(reader: &mut R, item: BoxHeader) -> Result<Option<BoxHeader>> {
    let mut pos = item.data_offset;
    while pos < item.end() {
        reader.seek(SeekFrom::Start(pos))?;
        let child = BoxHeader::read(reader, item.end())?;
        if child.fourcc == DATA {
            return Ok(Some(child));
        }
        pos = child.end();
    }
    Ok(None)
}

fn decode_pair(raw: &[u8]) -> Result<String> {
    if raw.len() < 6 {
        return Err(Error::new(ErrorKind::Corrupt, "trkn/disk payload shorter than 6 bytes"));
    }
    let n = u16::from_be_bytes([raw[2], raw[3]]);
    let t = u16::from_be_bytes([raw[4], raw[5]]);
    if t > 0 {
        Ok(format!("{n}/{t}"))
    } else {
        Ok(n.to_string())
    }
}

fn decode_uint_any_len(raw: &[u8]) -> Result<u64> {
    if raw.is_empty() || raw.len() > 8 {
        return Err(Error::new(
            ErrorKind::Corrupt,
            format!("integer atom payload has invalid length {}", raw.len()),
        ));
    }
    let mut buf = [0u8; 8];
    buf[8 - raw.len()..].copy_from_slice(raw);
    Ok(u64::from_be_bytes(buf))
}

/// Encodes `items` into the concatenated item-box bytes that make up
/// `ilst`'s content (no `ilst` header of its own).
///
/// Tags whose name resolves to no known or raw-fallback `Fourcc`, or whose
/// value can't be encoded under that atom's rules, are silently dropped —
/// matching the encoder's "else skip the tag" rule.
pub fn encode_ilst_content(items: &[SimpleTag]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for item in items {
        if let Some(bytes) = encode_item(item)? {
            out.extend_from_slice(&bytes);
        }
    }
    Ok(out)
}

fn encode_item(item: &SimpleTag) -> Result<Option<Vec<u8>>> {
    let Some(fourcc) = ident::resolve(&item.name) else { return Ok(None) };

    let (indicator, payload) = if fourcc == TRKN || fourcc == DISK {
        let Some(value) = &item.value else { return Ok(None) };
        (indicator::IMPLICIT, encode_pair(value)?)
    } else if fourcc == TMPO {
        let Some(value) = &item.value else { return Ok(None) };
        let n: u16 = value.parse().map_err(|_| {
            Error::new(ErrorKind::InvalidArg, format!("'{value}' is not a valid tempo"))
        })?;
        (indicator::INTEGER, n.to_be_bytes().to_vec())
    } else if fourcc == CPIL || fourcc == PGAP {
        let Some(value) = &item.value else { return Ok(None) };
        let b: u8 = value.parse().map_err(|_| {
            Error::new(ErrorKind::InvalidArg, format!("'{value}' is not a valid boolean flag"))
        })?;
        (indicator::INTEGER, vec![b])
    } else if fourcc == COVR {
        let Some(binary) = &item.binary else { return Ok(None) };
        if binary.is_empty() {
            return Ok(None);
        }
        // PNG is detected by magic; anything else (including real JPEG magic)
        // defaults to JPEG, since those are the only two cover art codecs.
        let indicator =
            if binary.starts_with(&[0x89, 0x50, 0x4E, 0x47]) { indicator::PNG } else { indicator::JPEG };
        (indicator, binary.clone())
    } else if fourcc == GNRE {
        let Some(value) = &item.value else { return Ok(None) };
        let n: u16 = value.parse().map_err(|_| {
            Error::new(ErrorKind::InvalidArg, format!("'{value}' is not a valid genre id"))
        })?;
        (indicator::IMPLICIT, n.to_be_bytes().to_vec())
    } else {
        let Some(value) = &item.value else { return Ok(None) };
        (indicator::UTF8, value.clone().into_bytes())
    };

    let mut data_box = Vec::with_capacity(16 + payload.len());
    let data_total = 16u64 + payload.len() as u64;
    BoxHeader::write(&mut data_box, DATA, data_total)?;
    data_box.write_be_u32(indicator)?;
    data_box.write_be_u32(0)?; // locale
    data_box.extend_from_slice(&payload);

    let mut item_box = Vec::with_capacity(8 + data_box.len());
    let item_total = 8u64 + data_box.len() as u64;
    BoxHeader::write(&mut item_box, fourcc, item_total)?;
    item_box.extend_from_slice(&data_box);

    Ok(Some(item_box))
}

fn encode_pair(value: &str) -> Result<Vec<u8>> {
    let (n, t) = match value.split_once('/') {
        Some((n, t)) => (parse_u16(n)?, parse_u16(t)?),
        None => (parse_u16(value)?, 0),
    };
    let mut buf = vec![0u8; 8];
    buf[2..4].copy_from_slice(&n.to_be_bytes());
    buf[4..6].copy_from_slice(&t.to_be_bytes());
    Ok(buf)
}

fn parse_u16(s: &str) -> Result<u16> {
    s.trim()
        .parse()
        .map_err(|_| Error::new(ErrorKind::InvalidArg, format!("'{s}' is not a valid track/disk number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_ilst(items: &[u8]) -> (Vec<u8>, BoxHeader) {
        let total = 8 + items.len() as u32;
        let mut buf = total.to_be_bytes().to_vec();
        buf.extend_from_slice(b"ilst");
        buf.extend_from_slice(items);
        let header = BoxHeader {
            fourcc: Fourcc(*b"ilst"),
            offset: 0,
            header_size: 8,
            total_size: total as u64,
            data_offset: 8,
            data_size: items.len() as u64,
        };
        (buf, header)
    }

    fn item_box(fourcc: &[u8; 4], indicator: u32, payload: &[u8]) -> Vec<u8> {
        let mut data_box = Vec::new();
        let data_total = 16 + payload.len() as u32;
        data_box.extend_from_slice(&data_total.to_be_bytes());
        data_box.extend_from_slice(b"data");
        data_box.extend_from_slice(&indicator.to_be_bytes());
        data_box.extend_from_slice(&0u32.to_be_bytes());
        data_box.extend_from_slice(payload);

        let mut item = Vec::new();
        let item_total = 8 + data_box.len() as u32;
        item.extend_from_slice(&item_total.to_be_bytes());
        item.extend_from_slice(fourcc);
        item.extend_from_slice(&data_box);
        item
    }

    #[test]
    fn decodes_utf8_text_item() {
        let item = item_box(b"\xa9nam", indicator::UTF8, b"Test Title");
        let (bytes, ilst) = build_ilst(&item);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "title");
        assert_eq!(tags[0].value.as_deref(), Some("Test Title"));
    }

    #[test]
    fn decodes_track_number_pair() {
        let item = item_box(b"trkn", indicator::IMPLICIT, &[0, 0, 0, 3, 0, 12, 0, 0]);
        let (bytes, ilst) = build_ilst(&item);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags[0].value.as_deref(), Some("3/12"));
    }

    #[test]
    fn decodes_track_number_without_total() {
        let item = item_box(b"trkn", indicator::IMPLICIT, &[0, 0, 0, 5, 0, 0, 0, 0]);
        let (bytes, ilst) = build_ilst(&item);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags[0].value.as_deref(), Some("5"));
    }

    #[test]
    fn decodes_tempo_and_boolean_atoms() {
        let tmpo = item_box(b"tmpo", indicator::INTEGER, &[0, 128]);
        let cpil = item_box(b"cpil", indicator::INTEGER, &[1]);
        let mut items = tmpo;
        items.extend_from_slice(&cpil);
        let (bytes, ilst) = build_ilst(&items);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags[0].value.as_deref(), Some("128"));
        assert_eq!(tags[1].value.as_deref(), Some("1"));
    }

    #[test]
    fn skips_free_boxes_inside_ilst() {
        let mut items = item_box(b"\xa9nam", indicator::UTF8, b"T");
        items.extend_from_slice(&8u32.to_be_bytes());
        items.extend_from_slice(b"free");
        let (bytes, ilst) = build_ilst(&items);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn round_trips_track_number_through_encode_and_decode() {
        let tag = SimpleTag::with_value("track_number", "3/12");
        let content = encode_ilst_content(&[tag]).unwrap();
        let (bytes, ilst) = build_ilst(&content);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags[0].value.as_deref(), Some("3/12"));
    }

    #[test]
    fn encode_detects_png_and_jpeg_cover_art_by_magic() {
        let png = SimpleTag::with_binary("cover_art", vec![0x89, 0x50, 0x4E, 0x47, 0, 0]);
        let jpeg = SimpleTag::with_binary("cover_art", vec![0xFF, 0xD8, 0xFF, 0, 0]);
        let content = encode_ilst_content(&[png, jpeg]).unwrap();
        let (bytes, ilst) = build_ilst(&content);
        let mut c = Cursor::new(bytes);
        let tags = decode_ilst(&mut c, ilst).unwrap();
        assert_eq!(tags.len(), 2);
        assert!(tags[0].binary.is_some());
        assert!(tags[1].binary.is_some());
    }

    #[test]
    fn encode_skips_tag_with_unresolvable_name() {
        let tag = SimpleTag::with_value("not a valid name at all", "x");
        let content = encode_ilst_content(&[tag]).unwrap();
        assert!(content.is_empty());
    }
}
