// minetile_deployer/deployer/src/nbt/tag.rs
use indexmap::map::{IndexMap, Iter};

use crate::core::error::FormatError;

/// Wire discriminant of every tag kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn from_id(id: u8) -> Result<Self, FormatError> {
        Ok(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            12 => TagKind::LongArray,
            other => return Err(FormatError::UnknownTagType(other)),
        })
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self { Tag::Byte(v) => Some(*v), _ => None }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self { Tag::Int(v) => Some(*v), _ => None }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self { Tag::Double(v) => Some(*v), _ => None }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self { Tag::String(v) => Some(v), _ => None }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self { Tag::List(v) => Some(v), _ => None }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self { Tag::List(v) => Some(v), _ => None }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self { Tag::Compound(v) => Some(v), _ => None }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut Compound> {
        match self { Tag::Compound(v) => Some(v), _ => None }
    }
}

macro_rules! tag_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Tag {
            fn from(v: $ty) -> Self { Tag::$variant(v) }
        })*
    };
}

tag_from! {
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Vec<i8> => ByteArray,
    String => String,
    List => List,
    Compound => Compound,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
}

impl From<&str> for Tag {
    fn from(v: &str) -> Self { Tag::String(v.to_string()) }
}

/// Named children with unique keys. Iteration follows insertion order so a decoded
/// document re-encodes to the same bytes; equality ignores order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound(IndexMap<String, Tag>);

impl Compound {
    pub fn new() -> Self {
        Compound(IndexMap::new())
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tag> {
        self.0.get_mut(key)
    }

    /// Sets `key`, returning the previous value. Replacing keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Tag>) -> Option<Tag> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        self.0.shift_remove(key)
    }

    pub fn iter(&self) -> Iter<'_, String, Tag> {
        self.0.iter()
    }

    pub fn get_byte(&self, key: &str) -> Option<i8> {
        self.get(key).and_then(Tag::as_byte)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(Tag::as_int)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Tag::as_double)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Tag::as_str)
    }

    pub fn get_list(&self, key: &str) -> Option<&List> {
        self.get(key).and_then(Tag::as_list)
    }

    pub fn get_list_mut(&mut self, key: &str) -> Option<&mut List> {
        self.get_mut(key).and_then(Tag::as_list_mut)
    }

    pub fn get_compound(&self, key: &str) -> Option<&Compound> {
        self.get(key).and_then(Tag::as_compound)
    }

    pub fn get_compound_mut(&mut self, key: &str) -> Option<&mut Compound> {
        self.get_mut(key).and_then(Tag::as_compound_mut)
    }
}

impl FromIterator<(String, Tag)> for Compound {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Compound(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Compound {
    type Item = (&'a String, &'a Tag);
    type IntoIter = Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Homogeneous sequence. The element kind is fixed by the first push (or by
/// construction) and kept even when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    kind: TagKind,
    items: Vec<Tag>,
}

impl Default for List {
    fn default() -> Self {
        List::new()
    }
}

impl List {
    pub fn new() -> Self {
        List { kind: TagKind::End, items: Vec::new() }
    }

    pub fn of(kind: TagKind) -> Self {
        List { kind, items: Vec::new() }
    }

    pub fn from_tags(tags: Vec<Tag>) -> Result<Self, FormatError> {
        let mut list = List::new();
        for tag in tags {
            list.push(tag)?;
        }
        Ok(list)
    }

    pub(crate) fn from_parts(kind: TagKind, items: Vec<Tag>) -> Self {
        List { kind, items }
    }

    /// Element kind; `End` only for a list that has never held anything.
    pub fn kind(&self) -> TagKind { self.kind }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    fn accept(&mut self, tag: &Tag) -> Result<(), FormatError> {
        let found = tag.kind();
        if self.kind == TagKind::End || (self.items.is_empty() && self.kind != found) {
            self.kind = found;
            return Ok(());
        }
        if self.kind != found {
            return Err(FormatError::ListKindMismatch { expected: self.kind, found });
        }
        Ok(())
    }

    pub fn push(&mut self, tag: impl Into<Tag>) -> Result<(), FormatError> {
        let tag = tag.into();
        self.accept(&tag)?;
        self.items.push(tag);
        Ok(())
    }

    /// Replaces the element at `index`, returning the old one; `None` when out of range.
    pub fn set(&mut self, index: usize, tag: impl Into<Tag>) -> Result<Option<Tag>, FormatError> {
        let tag = tag.into();
        if index >= self.items.len() {
            return Ok(None);
        }
        if tag.kind() != self.kind {
            return Err(FormatError::ListKindMismatch { expected: self.kind, found: tag.kind() });
        }
        Ok(Some(std::mem::replace(&mut self.items[index], tag)))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Mutable access to compound elements; the element kind cannot change through it.
    pub fn compounds_mut(&mut self) -> impl Iterator<Item = &mut Compound> {
        self.items.iter_mut().filter_map(Tag::as_compound_mut)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A complete tag document: one named root compound.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub name: String,
    pub root: Compound,
}

impl Document {
    pub fn new(name: impl Into<String>, root: Compound) -> Self {
        Document { name: name.into(), root }
    }
}
