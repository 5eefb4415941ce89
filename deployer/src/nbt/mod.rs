// minetile_deployer/deployer/src/nbt/mod.rs
pub mod codec;
pub mod tag;

pub use codec::{decode, encode};
pub use tag::{Compound, Document, List, Tag, TagKind};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::core::error::{FormatError, RegionError, RegionResult};

/// Reads a gzip-wrapped document such as `level.dat`.
pub fn read_gzip_file(path: &Path) -> RegionResult<Document> {
    let mut raw = Vec::new();
    GzDecoder::new(File::open(path)?)
        .read_to_end(&mut raw)
        .map_err(|e| RegionError::Format(FormatError::Decompression(e.to_string())))?;
    Ok(decode(&raw)?)
}

/// Writes `doc` gzip-wrapped. The gzip header carries no timestamp, so equal
/// documents produce equal files.
pub fn write_gzip_file(path: &Path, doc: &Document) -> RegionResult<()> {
    let bytes = encode(doc)?;
    let mut encoder = GzEncoder::new(BufWriter::new(File::create(path)?), Compression::default());
    encoder.write_all(&bytes)?;
    encoder.finish()?.flush()?;
    Ok(())
}
