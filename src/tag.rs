//! The in-memory representation of parsed or to-be-written metadata,
//! independent of the ISO-BMFF wire format.

/// Ordered classifier for what level of a work a [`Tag`] describes.
///
/// MP4/`ilst` metadata always classifies as [`TagTarget::Album`]; the other
/// variants exist so a `Collection` built by this core has the same shape
/// as one built for container formats with finer-grained targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u32)]
pub enum TagTarget {
    Shot = 10,
    Subtrack = 20,
    Track = 30,
    Part = 40,
    Album = 50,
    Edition = 60,
    Collection = 70,
}

/// A single name/value metadata item, as decoded from (or destined for) one
/// `ilst` item box.
///
/// Exactly one of `value` and `binary` is meaningful for a given item: text
/// and integer atoms populate `value` with the stringified form (`"3/12"`,
/// `"128"`, `"1"`); image atoms populate `binary`. `nested` holds children
/// attached under this item (unused by the MP4 codec today, but part of the
/// shared data model).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleTag {
    pub name: String,
    pub value: Option<String>,
    pub binary: Option<Vec<u8>>,
    pub language: Option<String>,
    pub is_default: bool,
    pub nested: Vec<SimpleTag>,
}

impl SimpleTag {
    pub fn new(name: impl Into<String>) -> SimpleTag {
        SimpleTag { name: name.into(), ..Default::default() }
    }

    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> SimpleTag {
        SimpleTag { value: Some(value.into()), ..SimpleTag::new(name) }
    }

    pub fn with_binary(name: impl Into<String>, binary: Vec<u8>) -> SimpleTag {
        SimpleTag { binary: Some(binary), ..SimpleTag::new(name) }
    }

    pub fn push_nested(&mut self, child: SimpleTag) {
        self.nested.push(child);
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = Some(language.into());
    }
}

/// A set of [`SimpleTag`]s scoped to one [`TagTarget`], plus the UID lists
/// that associate it with specific tracks/editions/chapters/attachments in
/// container formats that have them.
#[derive(Debug, Clone)]
pub struct Tag {
    pub target: TagTarget,
    pub track_uids: Vec<u64>,
    pub edition_uids: Vec<u64>,
    pub chapter_uids: Vec<u64>,
    pub attachment_uids: Vec<u64>,
    pub items: Vec<SimpleTag>,
}

impl Tag {
    pub fn new(target: TagTarget) -> Tag {
        Tag {
            target,
            track_uids: Vec::new(),
            edition_uids: Vec::new(),
            chapter_uids: Vec::new(),
            attachment_uids: Vec::new(),
            items: Vec::new(),
        }
    }

    /// MP4 metadata always classifies at album scope.
    pub fn for_mp4() -> Tag {
        Tag::new(TagTarget::Album)
    }

    pub fn push_simple(&mut self, item: SimpleTag) {
        self.items.push(item);
    }

    pub fn push_track_uid(&mut self, uid: u64) {
        self.track_uids.push(uid);
    }

    pub fn push_edition_uid(&mut self, uid: u64) {
        self.edition_uids.push(uid);
    }

    pub fn push_chapter_uid(&mut self, uid: u64) {
        self.chapter_uids.push(uid);
    }

    pub fn push_attachment_uid(&mut self, uid: u64) {
        self.attachment_uids.push(uid);
    }

    /// Finds the first item whose name matches `name` case-insensitively.
    pub fn find(&self, name: &str) -> Option<&SimpleTag> {
        self.items.iter().find(|i| i.name.eq_ignore_ascii_case(name))
    }
}

/// An ordered set of [`Tag`]s, the unit a `read_tags`/`write_tags` pair
/// exchanges with the caller.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub tags: Vec<Tag>,
}

impl Collection {
    pub fn new() -> Collection {
        Collection::default()
    }

    pub fn push(&mut self, tag: Tag) {
        self.tags.push(tag);
    }

    /// Finds the first item named `name` across every tag in the collection.
    /// MP4 files only ever have a single, album-scoped `Tag`, so in practice
    /// this just looks at `tags[0]`.
    pub fn find(&self, name: &str) -> Option<&SimpleTag> {
        self.tags.iter().find_map(|t| t.find(name))
    }
}
