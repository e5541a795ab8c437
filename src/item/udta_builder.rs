//! Builds a standalone `udta { meta { hdlr; ilst } }` byte sequence from
//! scratch, used whenever the writer has to create the metadata chain
//! rather than update an existing one.

use crate::boxes::header::BoxHeader;
use crate::boxes::{HDLR, ILST, META, UDTA};
use crate::io_util::WriteExt;
use crate::tag::SimpleTag;
use crate::Result;

use super::codec::encode_ilst_content;

/// The fixed 33 byte `hdlr` payload used by every `udta/meta` this core
/// writes: full-box prefix, zeroed predefined/component-type fields, handler
/// type `mdir`, reserved field carrying the ASCII `appl`, 8 zeroed reserved
/// bytes, and a single `NUL` for the (empty) handler name.
fn hdlr_payload() -> [u8; 25] {
    let mut buf = [0u8; 25];
    buf[8..12].copy_from_slice(b"mdir");
    buf[12..16].copy_from_slice(b"appl");
    // buf[16..24] reserved, stays zero; buf[24] is the empty name NUL.
    buf
}

fn build_hdlr() -> Vec<u8> {
    let payload = hdlr_payload();
    let mut out = Vec::with_capacity(8 + payload.len());
    let total = 8u64 + payload.len() as u64;
    BoxHeader::write(&mut out, HDLR, total).expect("a fixed 33 byte hdlr box always fits in a u32");
    out.extend_from_slice(&payload);
    out
}

fn build_ilst(items: &[SimpleTag]) -> Result<Vec<u8>> {
    let content = encode_ilst_content(items)?;
    let mut out = Vec::with_capacity(8 + content.len());
    let total = 8u64 + content.len() as u64;
    BoxHeader::write(&mut out, ILST, total)?;
    out.extend_from_slice(&content);
    Ok(out)
}

fn build_meta(items: &[SimpleTag]) -> Result<Vec<u8>> {
    let hdlr = build_hdlr();
    let ilst = build_ilst(items)?;

    let mut out = Vec::with_capacity(12 + hdlr.len() + ilst.len());
    let total = 8u64 + 4 + hdlr.len() as u64 + ilst.len() as u64;
    BoxHeader::write(&mut out, META, total)?;
    out.write_be_u32(0)?; // full-box version+flags
    out.extend_from_slice(&hdlr);
    out.extend_from_slice(&ilst);
    Ok(out)
}

/// Builds the complete `udta` box (including its own header) containing a
/// freshly built `meta { hdlr; ilst { items… } }` chain.
pub fn build_udta(items: &[SimpleTag]) -> Result<Vec<u8>> {
    let meta = build_meta(items)?;
    let mut out = Vec::with_capacity(8 + meta.len());
    let total = 8u64 + meta.len() as u64;
    BoxHeader::write(&mut out, UDTA, total)?;
    out.extend_from_slice(&meta);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::filemap::FileMap;
    use std::io::Cursor;

    #[test]
    fn builds_a_udta_chain_the_parser_can_read_back() {
        let items = vec![SimpleTag::with_value("title", "Hello")];
        let udta = build_udta(&items).unwrap();

        let mut ftyp = 20u32.to_be_bytes().to_vec();
        ftyp.extend_from_slice(b"ftyp");
        ftyp.extend_from_slice(b"isom\x00\x00\x00\x00isom");

        let moov_total = 8 + udta.len() as u32;
        let mut moov = moov_total.to_be_bytes().to_vec();
        moov.extend_from_slice(b"moov");
        moov.extend_from_slice(&udta);

        let mut data = ftyp;
        data.extend_from_slice(&moov);
        let len = data.len() as u64;
        let mut c = Cursor::new(data);
        let map = FileMap::build(&mut c, len).unwrap();
        assert!(map.has_ilst());
    }
}
