pub mod filemap;
pub mod header;

use crate::fourcc::Fourcc;

pub use filemap::FileMap;
pub use header::BoxHeader;

pub const FTYP: Fourcc = Fourcc(*b"ftyp");
pub const MOOV: Fourcc = Fourcc(*b"moov");
pub const MDAT: Fourcc = Fourcc(*b"mdat");
pub const UDTA: Fourcc = Fourcc(*b"udta");
pub const META: Fourcc = Fourcc(*b"meta");
pub const HDLR: Fourcc = Fourcc(*b"hdlr");
pub const ILST: Fourcc = Fourcc(*b"ilst");
pub const FREE: Fourcc = Fourcc(*b"free");
pub const SKIP: Fourcc = Fourcc(*b"skip");
pub const DATA: Fourcc = Fourcc(*b"data");

/// Major/compatible brands accepted at `ftyp`, per the box-tree parser's
/// brand validation step.
pub const MAJOR_BRANDS: &[[u8; 4]] = &[
    *b"isom", *b"iso2", *b"iso5", *b"iso6", *b"mp41", *b"mp42", *b"M4A ", *b"M4B ", *b"M4P ",
    *b"M4V ", *b"M4VH", *b"avc1", *b"f4v ", *b"qt  ", *b"MSNV", *b"NDAS", *b"dash", *b"3gp4",
    *b"3gp5", *b"3gp6", *b"3g2a",
];

/// Fallback brands scanned for in the compatible-brands list when the major
/// brand isn't recognized.
pub const COMPATIBLE_BRANDS: &[[u8; 4]] =
    &[*b"isom", *b"mp41", *b"mp42", *b"M4A ", *b"M4B ", *b"M4V ", *b"avc1"];
