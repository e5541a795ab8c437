use std::io::{self, Read, Write};

/// Big-endian integer and bounded-length read helpers shared by the box
/// parser and item codec.
pub trait ReadExt: Read {
    fn read_u8(&mut self) -> io::Result<u8> {
        let mut buf = [0];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_be_u16(&mut self) -> io::Result<u16> {
        let mut buf = [0; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn read_be_u32(&mut self) -> io::Result<u32> {
        let mut buf = [0; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn read_be_u64(&mut self) -> io::Result<u64> {
        let mut buf = [0; 8];
        self.read_exact(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    /// Reads a big-endian unsigned integer of `len` bytes (1..=8) into a
    /// `u64`, as used by the INTEGER item indicator and the boolean/atom
    /// shortcuts in the item codec.
    fn read_be_uint(&mut self, len: usize) -> io::Result<u64> {
        debug_assert!((1..=8).contains(&len));
        let mut buf = [0u8; 8];
        self.read_exact(&mut buf[8 - len..])?;
        Ok(u64::from_be_bytes(buf))
    }

    fn read_u8_vec(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn read_utf8(&mut self, len: usize) -> crate::Result<String> {
        let data = self.read_u8_vec(len)?;
        Ok(String::from_utf8(data)?)
    }

    /// Reads a big-endian UTF-16 string. Used only by the item codec's
    /// read-only UTF-16 indicator (2); there is no corresponding write path.
    fn read_be_utf16(&mut self, len: usize) -> crate::Result<String> {
        let buf = self.read_u8_vec(len)?;
        let units: Vec<u16> =
            buf.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
        Ok(String::from_utf16(&units)?)
    }
}

impl<T: Read> ReadExt for T {}

pub trait WriteExt: Write {
    fn write_be_u32(&mut self, val: u32) -> io::Result<()> {
        self.write_all(&val.to_be_bytes())
    }

    fn write_be_u64(&mut self, val: u64) -> io::Result<()> {
        self.write_all(&val.to_be_bytes())
    }

    /// Writes the low `len` bytes (1..=8) of `val` in big-endian order, the
    /// inverse of [`ReadExt::read_be_uint`].
    fn write_be_uint(&mut self, val: u64, len: usize) -> io::Result<()> {
        debug_assert!((1..=8).contains(&len));
        let buf = val.to_be_bytes();
        self.write_all(&buf[8 - len..])
    }
}

impl<T: Write> WriteExt for T {}
