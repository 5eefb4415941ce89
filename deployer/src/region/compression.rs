// minetile_deployer/deployer/src/region/compression.rs
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{Read, Write};

use crate::core::error::FormatError;

/// Marker byte stored in front of every chunk payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionScheme {
    Gzip = 1,
    Zlib = 2,
    Uncompressed = 3,
}

impl CompressionScheme {
    /// External `.mcc` payloads (marker bit 0x80) are not supported and fail here too.
    pub fn from_marker(marker: u8) -> Result<Self, FormatError> {
        match marker {
            1 => Ok(CompressionScheme::Gzip),
            2 => Ok(CompressionScheme::Zlib),
            3 => Ok(CompressionScheme::Uncompressed),
            other => Err(FormatError::UnknownCompression(other)),
        }
    }

    pub fn marker(self) -> u8 {
        self as u8
    }

    pub fn decompress(self, payload: &[u8]) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::with_capacity(payload.len() * 4);
        let result = match self {
            CompressionScheme::Gzip => GzDecoder::new(payload).read_to_end(&mut out),
            CompressionScheme::Zlib => ZlibDecoder::new(payload).read_to_end(&mut out),
            CompressionScheme::Uncompressed => {
                out.extend_from_slice(payload);
                Ok(payload.len())
            }
        };
        result.map_err(|e| FormatError::Decompression(e.to_string()))?;
        Ok(out)
    }

    pub fn compress(self, raw: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            CompressionScheme::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
                encoder.write_all(raw)?;
                encoder.finish()
            }
            CompressionScheme::Zlib => {
                let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
                encoder.write_all(raw)?;
                encoder.finish()
            }
            CompressionScheme::Uncompressed => Ok(raw.to_vec()),
        }
    }
}
