// minetile_deployer/deployer/src/core/error.rs
use thiserror::Error;

/// Corrupt or unsupported bytes in a tag document or region container.
/// Always recovered at the smallest scope that contains it (one chunk, one region file).
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("Unknown tag type id {0}")]
    UnknownTagType(u8),

    #[error("Root tag must be a compound, found type id {0}")]
    RootNotCompound(u8),

    #[error("Negative length {0} for {1}")]
    NegativeLength(i32, &'static str),

    #[error("Invalid string data: {0}")]
    InvalidString(String),

    #[error("Tag nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("List of {expected:?} cannot hold a {found:?}")]
    ListKindMismatch {
        expected: crate::nbt::TagKind,
        found: crate::nbt::TagKind,
    },

    #[error("Unknown compression scheme {0}")]
    UnknownCompression(u8),

    #[error("Region header truncated: file is {0} bytes")]
    TruncatedHeader(u64),

    #[error("Chunk ({cx}, {cz}) has a bad sector entry: {reason}")]
    BadSector { cx: i32, cz: i32, reason: String },

    #[error("Chunk ({cx}, {cz}) needs {sectors} sectors, more than a region record can hold")]
    ChunkTooLarge { cx: i32, cz: i32, sectors: usize },

    #[error("Chunk slot ({0}, {1}) is outside the 32x32 region grid")]
    SlotOutOfRange(i32, i32),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Trailing {0} bytes after root tag")]
    TrailingBytes(usize),

    #[error("Length {0} does not fit the wire format for {1}")]
    LengthOverflow(usize, &'static str),
}

/// Errors raised by region container I/O. Format problems are kept apart
/// from I/O problems so callers can decide at which scope to recover.
#[derive(Error, Debug)]
pub enum RegionError {
    #[error("Region I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Region format error: {0}")]
    Format(#[from] FormatError),
}

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Tile ({x}, {z}) failed: {message}")]
    JobError { x: i32, z: i32, message: String },

    #[error("Threading error: {0}")]
    ThreadingError(String),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Region error: {0}")]
    Region(#[from] RegionError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DeployError {
    /// Configuration problems are the only errors that stop a run before tile work starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeployError::ConfigError(_) | DeployError::ThreadingError(_))
    }
}

pub type DeployResult<T> = Result<T, DeployError>;
pub type RegionResult<T> = Result<T, RegionError>;
