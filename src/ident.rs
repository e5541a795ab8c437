use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::fourcc::Fourcc;

macro_rules! fourcc {
    ($a:expr, $b:expr, $c:expr, $d:expr) => {
        Fourcc([$a, $b, $c, $d])
    };
}

/// Canonical name/`Fourcc` pairs for the well known iTunes metadata atoms.
///
/// Names are matched case-insensitively on lookup; this table stores the
/// canonical spelling used when formatting a name back out.
const NAMED_ATOMS: &[(&str, Fourcc)] = &[
    ("title", fourcc!(0xa9, b'n', b'a', b'm')),
    ("artist", fourcc!(0xa9, b'A', b'R', b'T')),
    ("album", fourcc!(0xa9, b'a', b'l', b'b')),
    ("album_artist", fourcc!(b'a', b'A', b'R', b'T')),
    ("date_released", fourcc!(0xa9, b'd', b'a', b'y')),
    ("track_number", fourcc!(b't', b'r', b'k', b'n')),
    ("disc_number", fourcc!(b'd', b'i', b's', b'k')),
    ("genre", fourcc!(0xa9, b'g', b'e', b'n')),
    ("composer", fourcc!(0xa9, b'w', b'r', b't')),
    ("comment", fourcc!(0xa9, b'c', b'm', b't')),
    ("encoder", fourcc!(0xa9, b't', b'o', b'o')),
    ("copyright", fourcc!(b'c', b'p', b'r', b't')),
    ("bpm", fourcc!(b't', b'm', b'p', b'o')),
    ("lyrics", fourcc!(0xa9, b'l', b'y', b'r')),
    ("grouping", fourcc!(0xa9, b'g', b'r', b'p')),
    ("description", fourcc!(b'd', b'e', b's', b'c')),
    ("cover_art", fourcc!(b'c', b'o', b'v', b'r')),
    ("compilation", fourcc!(b'c', b'p', b'i', b'l')),
    ("gapless", fourcc!(b'p', b'g', b'a', b'p')),
    ("sort_name", fourcc!(b's', b'o', b'n', b'm')),
    ("sort_artist", fourcc!(b's', b'o', b'a', b'r')),
    ("sort_album", fourcc!(b's', b'o', b'a', b'l')),
    ("sort_album_artist", fourcc!(b's', b'o', b'a', b'a')),
    ("sort_composer", fourcc!(b's', b'o', b'c', b'o')),
];

lazy_static! {
    static ref NAME_TO_FOURCC: HashMap<&'static str, Fourcc> =
        NAMED_ATOMS.iter().map(|&(name, fourcc)| (name, fourcc)).collect();
    static ref FOURCC_TO_NAME: HashMap<Fourcc, &'static str> =
        NAMED_ATOMS.iter().map(|&(name, fourcc)| (fourcc, name)).collect();
}

/// Resolves a tag name to the FourCC identifier of the `ilst` child atom it
/// denotes.
///
/// Lookup order, per the item codec's encode path:
/// 1. case-insensitive match against the canonical name table
/// 2. if the name is exactly 4 bytes long, treat it as a raw FourCC
///
/// Returns `None` for anything else; callers treat that as "no such atom"
/// rather than an error.
pub fn resolve(name: &str) -> Option<Fourcc> {
    let lower = name.to_ascii_lowercase();
    if let Some(&fourcc) = NAME_TO_FOURCC.get(lower.as_str()) {
        return Some(fourcc);
    }
    if Fourcc::is_raw_candidate(name) {
        return Some(Fourcc::from_str_padded(name));
    }
    None
}

/// Returns the canonical name for `fourcc`, falling back to its raw 4
/// character rendering when it isn't one of the well known atoms.
pub fn name_of(fourcc: Fourcc) -> String {
    match FOURCC_TO_NAME.get(&fourcc) {
        Some(&name) => name.to_string(),
        None => fourcc.to_string(),
    }
}
