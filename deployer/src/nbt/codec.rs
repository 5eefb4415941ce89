// minetile_deployer/deployer/src/nbt/codec.rs
//
// Binary tag documents: a type id, a u16-length-prefixed name, then the payload,
// all big-endian. Compounds are terminated by an End (0) type id; lists carry one
// element type id and an i32 count; arrays carry an i32 count.
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::borrow::Cow;

use super::tag::{Compound, Document, List, Tag, TagKind};
use crate::core::constants::MAX_TAG_DEPTH;
use crate::core::error::FormatError;

/// Decodes one document. The input must hold exactly one root compound.
pub fn decode(bytes: &[u8]) -> Result<Document, FormatError> {
    let mut reader = TagReader { input: bytes };
    let doc = reader.read_document()?;
    if !reader.input.is_empty() {
        return Err(FormatError::TrailingBytes(reader.input.len()));
    }
    Ok(doc)
}

/// Decodes one document from the front of `bytes`, returning the unread remainder.
pub fn decode_prefix(bytes: &[u8]) -> Result<(Document, &[u8]), FormatError> {
    let mut reader = TagReader { input: bytes };
    let doc = reader.read_document()?;
    Ok((doc, reader.input))
}

pub fn encode(doc: &Document) -> Result<Vec<u8>, FormatError> {
    let mut out = Vec::with_capacity(256);
    encode_into(doc, &mut out)?;
    Ok(out)
}

pub fn encode_into(doc: &Document, out: &mut Vec<u8>) -> Result<(), FormatError> {
    out.push(TagKind::Compound.id());
    write_string(out, &doc.name)?;
    write_compound(out, &doc.root, 1)
}

struct TagReader<'a> {
    input: &'a [u8],
}

impl<'a> TagReader<'a> {
    fn read_document(&mut self) -> Result<Document, FormatError> {
        let id = self.input.read_u8().map_err(|_| FormatError::UnexpectedEof("root tag type"))?;
        if id != TagKind::Compound.id() {
            return Err(FormatError::RootNotCompound(id));
        }
        let name = self.read_string()?;
        let root = self.read_compound(1)?;
        Ok(Document { name, root })
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], FormatError> {
        if self.input.len() < len {
            return Err(FormatError::UnexpectedEof(what));
        }
        let (head, tail) = self.input.split_at(len);
        self.input = tail;
        Ok(head)
    }

    fn read_len(&mut self, what: &'static str, element_size: usize) -> Result<usize, FormatError> {
        let len = self.input.read_i32::<BigEndian>().map_err(|_| FormatError::UnexpectedEof(what))?;
        if len < 0 {
            return Err(FormatError::NegativeLength(len, what));
        }
        let len = len as usize;
        // Reject counts the remaining input cannot possibly satisfy before allocating.
        if len.saturating_mul(element_size.max(1)) > self.input.len() {
            return Err(FormatError::UnexpectedEof(what));
        }
        Ok(len)
    }

    fn read_string(&mut self) -> Result<String, FormatError> {
        let len = self.input.read_u16::<BigEndian>().map_err(|_| FormatError::UnexpectedEof("string length"))?;
        let bytes = self.take(len as usize, "string")?;
        match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            Err(_) => decode_modified_utf8(bytes),
        }
    }

    fn read_compound(&mut self, depth: usize) -> Result<Compound, FormatError> {
        if depth > MAX_TAG_DEPTH {
            return Err(FormatError::TooDeep(MAX_TAG_DEPTH));
        }
        let mut compound = Compound::new();
        loop {
            let id = self.input.read_u8().map_err(|_| FormatError::UnexpectedEof("compound entry"))?;
            let kind = TagKind::from_id(id)?;
            if kind == TagKind::End {
                return Ok(compound);
            }
            let name = self.read_string()?;
            let value = self.read_payload(kind, depth)?;
            compound.insert(name, value);
        }
    }

    fn read_payload(&mut self, kind: TagKind, depth: usize) -> Result<Tag, FormatError> {
        Ok(match kind {
            TagKind::End => return Err(FormatError::UnknownTagType(0)),
            TagKind::Byte => Tag::Byte(self.input.read_i8().map_err(eof("byte"))?),
            TagKind::Short => Tag::Short(self.input.read_i16::<BigEndian>().map_err(eof("short"))?),
            TagKind::Int => Tag::Int(self.input.read_i32::<BigEndian>().map_err(eof("int"))?),
            TagKind::Long => Tag::Long(self.input.read_i64::<BigEndian>().map_err(eof("long"))?),
            TagKind::Float => Tag::Float(self.input.read_f32::<BigEndian>().map_err(eof("float"))?),
            TagKind::Double => Tag::Double(self.input.read_f64::<BigEndian>().map_err(eof("double"))?),
            TagKind::ByteArray => {
                let len = self.read_len("byte array", 1)?;
                let bytes = self.take(len, "byte array")?;
                Tag::ByteArray(bytes.iter().map(|b| *b as i8).collect())
            }
            TagKind::String => Tag::String(self.read_string()?),
            TagKind::List => Tag::List(self.read_list(depth + 1)?),
            TagKind::Compound => Tag::Compound(self.read_compound(depth + 1)?),
            TagKind::IntArray => {
                let len = self.read_len("int array", 4)?;
                let mut values = vec![0i32; len];
                self.input.read_i32_into::<BigEndian>(&mut values).map_err(eof("int array"))?;
                Tag::IntArray(values)
            }
            TagKind::LongArray => {
                let len = self.read_len("long array", 8)?;
                let mut values = vec![0i64; len];
                self.input.read_i64_into::<BigEndian>(&mut values).map_err(eof("long array"))?;
                Tag::LongArray(values)
            }
        })
    }

    fn read_list(&mut self, depth: usize) -> Result<List, FormatError> {
        if depth > MAX_TAG_DEPTH {
            return Err(FormatError::TooDeep(MAX_TAG_DEPTH));
        }
        let id = self.input.read_u8().map_err(|_| FormatError::UnexpectedEof("list type"))?;
        let kind = TagKind::from_id(id)?;
        let len = self.read_len("list", min_payload_size(kind))?;
        if kind == TagKind::End && len > 0 {
            return Err(FormatError::UnknownTagType(0));
        }
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.read_payload(kind, depth)?);
        }
        Ok(List::from_parts(kind, items))
    }
}

fn eof(what: &'static str) -> impl FnOnce(std::io::Error) -> FormatError {
    move |_| FormatError::UnexpectedEof(what)
}

/// Smallest encoded payload of one element, used to bound list counts.
fn min_payload_size(kind: TagKind) -> usize {
    match kind {
        TagKind::End | TagKind::Compound => 1,
        TagKind::Byte => 1,
        TagKind::Short | TagKind::String => 2,
        TagKind::Int | TagKind::Float => 4,
        TagKind::Long | TagKind::Double => 8,
        TagKind::ByteArray | TagKind::IntArray | TagKind::LongArray => 4,
        TagKind::List => 5,
    }
}

fn write_len(out: &mut Vec<u8>, len: usize, what: &'static str) -> Result<(), FormatError> {
    let len = i32::try_from(len).map_err(|_| FormatError::LengthOverflow(len, what))?;
    out.write_i32::<BigEndian>(len).map_err(|_| FormatError::LengthOverflow(len as usize, what))
}

fn write_string(out: &mut Vec<u8>, value: &str) -> Result<(), FormatError> {
    let bytes = encode_modified_utf8(value);
    let len = u16::try_from(bytes.len()).map_err(|_| FormatError::LengthOverflow(bytes.len(), "string"))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&bytes);
    Ok(())
}

fn write_compound(out: &mut Vec<u8>, compound: &Compound, depth: usize) -> Result<(), FormatError> {
    if depth > MAX_TAG_DEPTH {
        return Err(FormatError::TooDeep(MAX_TAG_DEPTH));
    }
    for (name, value) in compound {
        out.push(value.kind().id());
        write_string(out, name)?;
        write_payload(out, value, depth)?;
    }
    out.push(TagKind::End.id());
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, tag: &Tag, depth: usize) -> Result<(), FormatError> {
    match tag {
        Tag::Byte(v) => out.push(*v as u8),
        Tag::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        Tag::ByteArray(values) => {
            write_len(out, values.len(), "byte array")?;
            out.extend(values.iter().map(|b| *b as u8));
        }
        Tag::String(v) => write_string(out, v)?,
        Tag::List(list) => {
            if depth + 1 > MAX_TAG_DEPTH {
                return Err(FormatError::TooDeep(MAX_TAG_DEPTH));
            }
            out.push(list.kind().id());
            write_len(out, list.len(), "list")?;
            for item in list {
                write_payload(out, item, depth + 1)?;
            }
        }
        Tag::Compound(c) => write_compound(out, c, depth + 1)?,
        Tag::IntArray(values) => {
            write_len(out, values.len(), "int array")?;
            out.reserve(values.len() * 4);
            for v in values {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
        Tag::LongArray(values) => {
            write_len(out, values.len(), "long array")?;
            out.reserve(values.len() * 8);
            for v in values {
                out.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
    Ok(())
}

// --- Modified UTF-8 ---
// NUL is stored as C0 80 and supplementary characters as a 3+3 byte surrogate pair.

fn decode_modified_utf8(bytes: &[u8]) -> Result<String, FormatError> {
    let invalid = |at: usize| FormatError::InvalidString(format!("malformed modified UTF-8 at byte {}", at));
    let cont = |i: usize| -> Result<u32, FormatError> {
        match bytes.get(i) {
            Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u32),
            _ => Err(invalid(i)),
        }
    };

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            units.push(((((b & 0x1F) as u32) << 6) | cont(i + 1)?) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            units.push(((((b & 0x0F) as u32) << 12) | (cont(i + 1)? << 6) | cont(i + 2)?) as u16);
            i += 3;
        } else if b & 0xF8 == 0xF0 {
            // Plain 4-byte UTF-8 is not modified UTF-8, but some writers emit it.
            let cp = (((b & 0x07) as u32) << 18) | (cont(i + 1)? << 12) | (cont(i + 2)? << 6) | cont(i + 3)?;
            let ch = char::from_u32(cp).ok_or_else(|| invalid(i))?;
            let mut buf = [0u16; 2];
            units.extend_from_slice(ch.encode_utf16(&mut buf));
            i += 4;
        } else {
            return Err(invalid(i));
        }
    }
    String::from_utf16(&units).map_err(|e| FormatError::InvalidString(e.to_string()))
}

fn encode_modified_utf8(value: &str) -> Cow<'_, [u8]> {
    if !value.chars().any(|c| c == '\0' || c as u32 > 0xFFFF) {
        return Cow::Borrowed(value.as_bytes());
    }
    let mut out = Vec::with_capacity(value.len() + 8);
    for unit in value.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_document() -> Document {
        let mut pos = List::new();
        pos.push(1050.5f64).unwrap();
        pos.push(64.0f64).unwrap();
        pos.push(-300.25f64).unwrap();

        let mut entity = Compound::new();
        entity.insert("id", "minecraft:cow");
        entity.insert("Pos", pos);

        let mut entities = List::new();
        entities.push(entity).unwrap();

        let mut level = Compound::new();
        level.insert("xPos", 3);
        level.insert("zPos", -2);
        level.insert("LastUpdate", 123_456_789_i64);
        level.insert("Biomes", vec![1i32, 2, 3]);
        level.insert("Blocks", vec![0i8, -1, 7]);
        level.insert("BlockStates", vec![i64::MIN, 0, i64::MAX]);
        level.insert("Entities", entities);
        level.insert("TileTicks", List::of(TagKind::Compound));
        level.insert("LightPopulated", 1i8);
        level.insert("Scale", 0.5f32);
        level.insert("Height", 256i16);

        let mut root = Compound::new();
        root.insert("Level", level);
        root.insert("DataVersion", 1343);
        Document::new("", root)
    }

    #[test]
    fn decode_of_encode_is_identity() {
        let doc = sample_document();
        let bytes = encode(&doc).unwrap();
        assert_eq!(decode(&bytes).unwrap(), doc);
    }

    #[test]
    fn reencoding_reproduces_source_bytes() {
        let bytes = encode(&sample_document()).unwrap();
        let again = encode(&decode(&bytes).unwrap()).unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn minimal_document_layout() {
        let mut root = Compound::new();
        root.insert("a", 1i8);
        let bytes = encode(&Document::new("hi", root)).unwrap();
        assert_eq!(bytes, vec![10, 0, 2, b'h', b'i', 1, 0, 1, b'a', 1, 0]);
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = encode(&sample_document()).unwrap();
        for cut in [0, 1, 3, bytes.len() / 2, bytes.len() - 1] {
            assert!(decode(&bytes[..cut]).is_err(), "cut at {} decoded", cut);
        }
    }

    #[test]
    fn unknown_type_discriminant_is_rejected() {
        let bytes = vec![10, 0, 0, 42, 0, 1, b'x', 0];
        assert!(matches!(decode(&bytes), Err(FormatError::UnknownTagType(42))));
    }

    #[test]
    fn non_compound_root_is_rejected() {
        assert!(matches!(decode(&[3, 0, 0, 0, 0, 0, 1]), Err(FormatError::RootNotCompound(3))));
    }

    #[test]
    fn huge_array_length_fails_without_allocating() {
        // int array claiming i32::MAX elements with no payload behind it
        let bytes = vec![10, 0, 0, 11, 0, 1, b'a', 0x7F, 0xFF, 0xFF, 0xFF];
        assert!(matches!(decode(&bytes), Err(FormatError::UnexpectedEof(_))));
    }

    #[test]
    fn negative_length_is_rejected() {
        let bytes = vec![10, 0, 0, 7, 0, 1, b'a', 0xFF, 0xFF, 0xFF, 0xFF, 0];
        assert!(matches!(decode(&bytes), Err(FormatError::NegativeLength(-1, _))));
    }

    #[test]
    fn excessive_nesting_is_rejected() {
        let mut bytes = vec![10, 0, 0];
        for _ in 0..(MAX_TAG_DEPTH + 2) {
            bytes.extend_from_slice(&[10, 0, 0]);
        }
        bytes.extend(std::iter::repeat(0).take(MAX_TAG_DEPTH + 3));
        assert!(matches!(decode(&bytes), Err(FormatError::TooDeep(_))));
    }

    #[test]
    fn modified_utf8_nul_and_supplementary_round_trip() {
        let text = "a\0b\u{1F600}";
        let encoded = encode_modified_utf8(text);
        assert_eq!(&encoded[..4], &[b'a', 0xC0, 0x80, b'b']);
        assert_eq!(encoded.len(), 4 + 6);
        assert_eq!(decode_modified_utf8(&encoded).unwrap(), text);
    }

    #[test]
    fn plain_text_is_written_verbatim() {
        assert!(matches!(encode_modified_utf8("Sign text ä"), Cow::Borrowed(_)));
    }

    #[test]
    fn decode_prefix_returns_remainder() {
        let mut bytes = encode(&sample_document()).unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        let (doc, rest) = decode_prefix(&bytes).unwrap();
        assert_eq!(doc, sample_document());
        assert_eq!(rest, &[0, 0, 0]);
        assert!(matches!(decode(&bytes), Err(FormatError::TrailingBytes(3))));
    }
}
