use std::io::{Read, Seek, SeekFrom};

use crate::fourcc::Fourcc;
use crate::io_util::{ReadExt, WriteExt};
use crate::{Error, ErrorKind, Result};

/// The well known 8 and 16 byte header sizes. A standard box header is a
/// 4 byte size followed by a 4 byte [`Fourcc`]; an extended header additionally
/// carries a 64-bit size in place of the 32-bit one (signaled by `size == 1`).
pub const STANDARD_HEADER_LEN: u64 = 8;
pub const EXTENDED_HEADER_LEN: u64 = 16;

/// A parsed ISO-BMFF box header together with the position it was read at.
///
/// `data_offset`/`data_size` describe the box's payload, i.e. everything
/// after the header up to (and not including) the next sibling box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub fourcc: Fourcc,
    pub offset: u64,
    pub header_size: u64,
    pub total_size: u64,
    pub data_offset: u64,
    pub data_size: u64,
}

impl BoxHeader {
    /// Reads a box header starting at the reader's current position.
    ///
    /// `file_len` is required to resolve a "to end of file" box (wire size
    /// field `0`); callers that know they'll never encounter one (e.g. while
    /// reading a box whose container already bounds it) may pass the
    /// container's own end as `file_len`.
    pub fn read<R: Read + Seek>(reader: &mut R, file_len: u64) -> Result<BoxHeader> {
        let offset = reader.stream_position()?;
        if file_len.saturating_sub(offset) < STANDARD_HEADER_LEN {
            return Err(Error::new(ErrorKind::Truncated, "box header runs past end of file"));
        }

        let size32 = reader.read_be_u32()?;
        let mut fourcc_bytes = [0u8; 4];
        reader.read_exact(&mut fourcc_bytes)?;
        let fourcc = Fourcc(fourcc_bytes);

        let (header_size, total_size) = match size32 {
            0 => {
                // "to end of file": the box extends to the end of its container.
                (STANDARD_HEADER_LEN, file_len - offset)
            }
            1 => {
                if file_len.saturating_sub(offset) < EXTENDED_HEADER_LEN {
                    return Err(Error::new(
                        ErrorKind::Truncated,
                        "extended box header runs past end of file",
                    ));
                }
                let size64 = reader.read_be_u64()?;
                (EXTENDED_HEADER_LEN, size64)
            }
            n => (STANDARD_HEADER_LEN, u64::from(n)),
        };

        if total_size < header_size {
            return Err(Error::new(
                ErrorKind::BadBox,
                format!("box '{fourcc}' at {offset} has total_size {total_size} < header_size {header_size}"),
            ));
        }
        let end = offset.checked_add(total_size).ok_or_else(|| {
            Error::new(
                ErrorKind::BadBox,
                format!("box '{fourcc}' at {offset} claims size {total_size}, which overflows a 64-bit offset"),
            )
        })?;
        if end > file_len {
            return Err(Error::new(
                ErrorKind::BadBox,
                format!("box '{fourcc}' at {offset} claims size {total_size} past end of file"),
            ));
        }

        Ok(BoxHeader {
            fourcc,
            offset,
            header_size,
            total_size,
            data_offset: offset + header_size,
            data_size: total_size - header_size,
        })
    }

    /// The offset one past the end of this box, i.e. where its next sibling
    /// (if any) begins.
    ///
    /// Saturates instead of overflowing: every `BoxHeader` returned by
    /// [`BoxHeader::read`] already has `offset + total_size <= file_len`, so
    /// this only matters for a header built some other way (tests construct
    /// a few by hand), and saturating is still the safe choice there.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.total_size)
    }

    /// Seeks `reader` to the start of this box's payload.
    pub fn seek_to_data<R: Seek>(&self, reader: &mut R) -> Result<()> {
        reader.seek(SeekFrom::Start(self.data_offset))?;
        Ok(())
    }

    /// Seeks `reader` past this box entirely, to the start of its sibling.
    pub fn seek_to_end<R: Seek>(&self, reader: &mut R) -> Result<()> {
        reader.seek(SeekFrom::Start(self.end()))?;
        Ok(())
    }

    /// Writes a standard 8 byte header for a box of `fourcc` with the given
    /// total size. This core never emits the extended 64-bit size form, so
    /// `total_size` must fit in a `u32`; returns `ErrorKind::Unsupported`
    /// instead of silently truncating it when it doesn't.
    pub fn write<W: std::io::Write>(w: &mut W, fourcc: Fourcc, total_size: u64) -> Result<()> {
        let total_size = u32::try_from(total_size).map_err(|_| {
            Error::new(
                ErrorKind::Unsupported,
                format!(
                    "box '{fourcc}' total size {total_size} exceeds u32; extended box headers are not written by this core"
                ),
            )
        })?;
        w.write_be_u32(total_size)?;
        w.write_all(&*fourcc)?;
        Ok(())
    }

    /// Writes a `free` padding box of `total_size` bytes (header + zeroed
    /// payload). `total_size` must be at least 8; smaller padding must be
    /// written as raw zero bytes instead, since a box header alone needs 8.
    /// Fails with `ErrorKind::Unsupported` if `total_size` doesn't fit in a
    /// `u32`, same as [`BoxHeader::write`].
    pub fn write_free_box<W: std::io::Write>(w: &mut W, total_size: u64) -> Result<()> {
        debug_assert!(total_size >= STANDARD_HEADER_LEN);
        Self::write(w, crate::boxes::FREE, total_size)?;
        let padding = vec![0u8; (total_size - STANDARD_HEADER_LEN) as usize];
        w.write_all(&padding)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_box(fourcc: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let total = 8 + payload.len() as u32;
        let mut buf = total.to_be_bytes().to_vec();
        buf.extend_from_slice(&fourcc);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn reads_standard_header() {
        let data = make_box(*b"free", &[0u8; 4]);
        let len = data.len() as u64;
        let mut c = Cursor::new(data);
        let h = BoxHeader::read(&mut c, len).unwrap();
        assert_eq!(h.fourcc.0, *b"free");
        assert_eq!(h.header_size, 8);
        assert_eq!(h.total_size, 12);
        assert_eq!(h.data_offset, 8);
        assert_eq!(h.data_size, 4);
    }

    #[test]
    fn reads_extended_header() {
        let mut data = 1u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&20u64.to_be_bytes());
        data.extend_from_slice(&[0u8; 4]);
        let len = data.len() as u64;
        let mut c = Cursor::new(data);
        let h = BoxHeader::read(&mut c, len).unwrap();
        assert_eq!(h.header_size, 16);
        assert_eq!(h.total_size, 20);
        assert_eq!(h.data_size, 4);
    }

    #[test]
    fn reads_to_end_of_file_header() {
        let mut data = 0u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"mdat");
        data.extend_from_slice(&[1, 2, 3, 4, 5]);
        let len = data.len() as u64;
        let mut c = Cursor::new(data);
        let h = BoxHeader::read(&mut c, len).unwrap();
        assert_eq!(h.total_size, len);
        assert_eq!(h.data_size, len - 8);
    }

    #[test]
    fn rejects_size_smaller_than_header() {
        // Declared size 4 is smaller than any valid header.
        let mut bad = 4u32.to_be_bytes().to_vec();
        bad.extend_from_slice(b"free");
        let len = bad.len() as u64;
        let mut c = Cursor::new(bad);
        assert!(matches!(BoxHeader::read(&mut c, len).unwrap_err().kind, ErrorKind::BadBox));
    }

    #[test]
    fn write_free_box_round_trips() {
        let mut buf = Vec::new();
        BoxHeader::write_free_box(&mut buf, 16).unwrap();
        assert_eq!(buf.len(), 16);
        let len = buf.len() as u64;
        let mut c = Cursor::new(buf);
        let h = BoxHeader::read(&mut c, len).unwrap();
        assert_eq!(h.fourcc.0, *b"free");
        assert_eq!(h.total_size, 16);
    }
}
