// minetile_deployer/deployer/tests/integration/region_codec.rs
use minetile_deployer::nbt::{self, Compound, Document, List, Tag};
use minetile_deployer::region::RegionFile;
use proptest::prelude::*;

fn chunk_with_payload(cx: i32, cz: i32, filler: usize) -> Document {
    let mut level = Compound::new();
    level.insert("xPos", cx);
    level.insert("zPos", cz);
    // xorshift noise so zlib cannot shrink the payload much
    let mut state = 0x9e37_79b9u32 ^ (cx as u32) << 8 ^ cz as u32;
    let noise: Vec<i8> = (0..filler)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as i8
        })
        .collect();
    level.insert("Blocks", Tag::ByteArray(noise));
    let mut root = Compound::new();
    root.insert("Level", level);
    Document::new("", root)
}

#[test]
fn chunks_round_trip_at_arbitrary_slots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.0.0.mca");
    let slots = [(0, 0), (31, 0), (0, 31), (31, 31), (5, 17), (16, 16), (30, 2)];

    let mut region = RegionFile::open_or_create_for_write(&path).unwrap();
    for (i, &(cx, cz)) in slots.iter().enumerate() {
        region.write_chunk(cx, cz, &chunk_with_payload(cx, cz, 100 + i * 3000)).unwrap();
    }
    region.close().unwrap();

    let mut region = RegionFile::open_for_read(&path).unwrap();
    assert_eq!(region.chunk_count(), slots.len());
    for (i, &(cx, cz)) in slots.iter().enumerate() {
        let doc = region.read_chunk(cx, cz).unwrap().unwrap();
        assert_eq!(doc, chunk_with_payload(cx, cz, 100 + i * 3000));
    }
    assert!(region.read_chunk(1, 1).unwrap().is_none());
    assert!(!region.has_chunk(1, 1));
    assert!(region.read_chunk(32, 0).is_err());
}

#[test]
fn growing_a_chunk_relocates_it_without_touching_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.1.-1.mca");

    let mut region = RegionFile::open_or_create_for_write(&path).unwrap();
    region.write_chunk(0, 0, &chunk_with_payload(0, 0, 100)).unwrap();
    region.write_chunk(1, 0, &chunk_with_payload(1, 0, 100)).unwrap();
    region.write_chunk(2, 0, &chunk_with_payload(2, 0, 100)).unwrap();
    region.close().unwrap();

    let mut region = RegionFile::open_or_create_for_write(&path).unwrap();
    region.write_chunk(1, 0, &chunk_with_payload(1, 0, 40_000)).unwrap();
    region.close().unwrap();
    // three one-sector records plus a grown record appended after them
    assert!(std::fs::metadata(&path).unwrap().len() > 5 * 4096);

    let mut region = RegionFile::open_for_read(&path).unwrap();
    assert_eq!(region.read_chunk(0, 0).unwrap().unwrap(), chunk_with_payload(0, 0, 100));
    assert_eq!(region.read_chunk(1, 0).unwrap().unwrap(), chunk_with_payload(1, 0, 40_000));
    assert_eq!(region.read_chunk(2, 0).unwrap().unwrap(), chunk_with_payload(2, 0, 100));
    assert_eq!(std::fs::metadata(&path).unwrap().len() % 4096, 0);
}

#[test]
fn removed_chunk_reads_as_absent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("r.0.0.mca");
    let mut region = RegionFile::open_or_create_for_write(&path).unwrap();
    region.write_chunk(4, 4, &chunk_with_payload(4, 4, 10)).unwrap();
    assert!(region.remove_chunk(4, 4).unwrap());
    region.close().unwrap();

    let mut region = RegionFile::open_for_read(&path).unwrap();
    assert!(region.read_chunk(4, 4).unwrap().is_none());
    assert_eq!(region.chunk_count(), 0);
}

fn leaf_tag() -> impl Strategy<Value = Tag> {
    prop_oneof![
        any::<i8>().prop_map(Tag::Byte),
        any::<i16>().prop_map(Tag::Short),
        any::<i32>().prop_map(Tag::Int),
        any::<i64>().prop_map(Tag::Long),
        (-1.0e6f32..1.0e6).prop_map(Tag::Float),
        (-1.0e12f64..1.0e12).prop_map(Tag::Double),
        "\\PC{0,12}".prop_map(Tag::String),
        prop::collection::vec(any::<i8>(), 0..16).prop_map(Tag::ByteArray),
        prop::collection::vec(any::<i32>(), 0..8).prop_map(Tag::IntArray),
        prop::collection::vec(any::<i64>(), 0..8).prop_map(Tag::LongArray),
    ]
}

fn any_tag() -> impl Strategy<Value = Tag> {
    leaf_tag().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(("[a-zA-Z_]{1,8}", inner.clone()), 0..6)
                .prop_map(|entries| Tag::Compound(entries.into_iter().collect())),
            prop::collection::vec(any::<i32>(), 0..6)
                .prop_map(|ints| Tag::List(List::from_tags(ints.into_iter().map(Tag::Int).collect()).unwrap())),
            prop::collection::vec(inner, 0..4).prop_map(|items| {
                let wrapped = items
                    .into_iter()
                    .map(|item| Tag::Compound(std::iter::once(("v".to_string(), item)).collect()))
                    .collect();
                Tag::List(List::from_tags(wrapped).unwrap())
            }),
        ]
    })
}

proptest! {
    #[test]
    fn documents_survive_encode_decode(name in "\\PC{0,8}", entries in prop::collection::vec(("\\PC{1,8}", any_tag()), 0..8)) {
        let doc = Document::new(name, entries.into_iter().collect::<Compound>());
        let bytes = nbt::encode(&doc).unwrap();
        prop_assert_eq!(nbt::decode(&bytes).unwrap(), doc);
    }
}
