// minetile_deployer/deployer/src/region/region_file.rs
use byteorder::{BigEndian, ByteOrder};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

use super::compression::CompressionScheme;
use crate::core::constants::{
    CHUNK_RECORD_PREFIX_BYTES, HEADER_BYTES, HEADER_SECTORS, MAX_SECTORS_PER_CHUNK, REGION_SLOTS, SECTOR_BYTES,
};
use crate::core::error::{FormatError, RegionResult};
use crate::core::types::{ChunkSlot, RegionCoord};
use crate::nbt::{self, Document};

/// Scheme used for every chunk this crate writes.
const WRITE_SCHEME: CompressionScheme = CompressionScheme::Zlib;

/// Largest sector index a 3-byte location entry can address.
const MAX_SECTOR_OFFSET: usize = (1 << 24) - 1;

/// One location-table entry: `offset << 8 | sector_count`, both in 4096-byte sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct Location(u32);

impl Location {
    fn new(offset: usize, sectors: usize) -> Self {
        Location(((offset as u32) << 8) | (sectors as u32 & 0xFF))
    }

    fn offset(self) -> usize { (self.0 >> 8) as usize }
    fn sectors(self) -> usize { (self.0 & 0xFF) as usize }
    fn is_absent(self) -> bool { self.offset() == 0 || self.sectors() == 0 }
}

/// Handle on one region container: a 32x32 grid of optional, individually
/// compressed chunk documents behind an 8 KiB location/timestamp header.
///
/// A handle is used by one thread at a time. Read handles never modify the file;
/// write handles keep the header in memory and flush it on [`RegionFile::close`].
pub struct RegionFile {
    path: PathBuf,
    file: File,
    writable: bool,
    locations: Vec<Location>,
    timestamps: Vec<u32>,
    /// Sector occupancy, header included. Only maintained for write handles.
    used_sectors: Vec<bool>,
    file_len: u64,
    header_dirty: bool,
}

impl RegionFile {
    pub fn open_for_read(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let file_len = file.metadata()?.len();

        let (locations, timestamps) = if file_len == 0 {
            (vec![Location::default(); REGION_SLOTS], vec![0; REGION_SLOTS])
        } else if file_len < HEADER_BYTES as u64 {
            return Err(FormatError::TruncatedHeader(file_len).into());
        } else {
            read_header(&mut file)?
        };

        Ok(RegionFile {
            path,
            file,
            writable: false,
            locations,
            timestamps,
            used_sectors: Vec::new(),
            file_len,
            header_dirty: false,
        })
    }

    /// Opens an existing container for update or creates an empty one.
    /// A file too short to hold a header is reset to an empty container.
    pub fn open_or_create_for_write(path: impl AsRef<Path>) -> RegionResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        let mut file_len = file.metadata()?.len();

        let (mut locations, timestamps) = if file_len < HEADER_BYTES as u64 {
            if file_len > 0 {
                warn!("Region file {} has a truncated header ({} bytes), resetting it", path.display(), file_len);
            }
            file.set_len(0)?;
            file.write_all(&[0u8; HEADER_BYTES])?;
            file_len = HEADER_BYTES as u64;
            (vec![Location::default(); REGION_SLOTS], vec![0; REGION_SLOTS])
        } else {
            read_header(&mut file)?
        };

        // Keep the file a whole number of sectors long.
        let rem = file_len % SECTOR_BYTES as u64;
        if rem != 0 {
            file_len += SECTOR_BYTES as u64 - rem;
            file.set_len(file_len)?;
        }

        let total_sectors = (file_len / SECTOR_BYTES as u64) as usize;
        let mut used_sectors = vec![false; total_sectors];
        used_sectors[..HEADER_SECTORS as usize].iter_mut().for_each(|s| *s = true);

        let mut header_dirty = false;
        for (index, location) in locations.iter_mut().enumerate() {
            if location.is_absent() {
                continue;
            }
            let end = location.offset() + location.sectors();
            if location.offset() < HEADER_SECTORS as usize || end > total_sectors {
                warn!(
                    "Region file {} slot {} points at sectors {}..{} outside the file, dropping it",
                    path.display(), index, location.offset(), end
                );
                *location = Location::default();
                header_dirty = true;
                continue;
            }
            used_sectors[location.offset()..end].iter_mut().for_each(|s| *s = true);
        }

        Ok(RegionFile {
            path,
            file,
            writable: true,
            locations,
            timestamps,
            used_sectors,
            file_len,
            header_dirty,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Region-grid coordinate taken from the file name, if it follows `r.<x>.<z>.mca`.
    pub fn coord(&self) -> Option<RegionCoord> {
        self.path.file_name().and_then(|n| n.to_str()).and_then(RegionCoord::from_file_name)
    }

    pub fn has_chunk(&self, cx: i32, cz: i32) -> bool {
        ChunkSlot::new(cx, cz).map(|slot| !self.locations[slot.index()].is_absent()).unwrap_or(false)
    }

    /// Slots with a location entry, in copy order (x outer, z inner).
    pub fn occupied_slots(&self) -> Vec<ChunkSlot> {
        ChunkSlot::all().filter(|slot| !self.locations[slot.index()].is_absent()).collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.locations.iter().filter(|l| !l.is_absent()).count()
    }

    pub fn timestamp(&self, cx: i32, cz: i32) -> RegionResult<u32> {
        let slot = ChunkSlot::new(cx, cz)?;
        Ok(self.timestamps[slot.index()])
    }

    pub fn set_timestamp(&mut self, cx: i32, cz: i32, timestamp: u32) -> RegionResult<()> {
        let slot = ChunkSlot::new(cx, cz)?;
        self.timestamps[slot.index()] = timestamp;
        self.header_dirty = true;
        Ok(())
    }

    /// Decodes the chunk document in slot (cx, cz); `None` for an empty slot.
    pub fn read_chunk(&mut self, cx: i32, cz: i32) -> RegionResult<Option<Document>> {
        match self.read_chunk_data(cx, cz)? {
            Some(raw) => Ok(Some(nbt::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Decompressed document bytes of slot (cx, cz).
    pub fn read_chunk_data(&mut self, cx: i32, cz: i32) -> RegionResult<Option<Vec<u8>>> {
        let slot = ChunkSlot::new(cx, cz)?;
        let location = self.locations[slot.index()];
        if location.is_absent() {
            return Ok(None);
        }

        let bad = |reason: String| FormatError::BadSector { cx, cz, reason };
        let start = location.offset() as u64 * SECTOR_BYTES as u64;
        let capacity = location.sectors() * SECTOR_BYTES;
        if location.offset() < HEADER_SECTORS as usize {
            return Err(bad(format!("sector {} overlaps the header", location.offset())).into());
        }
        // The last record of a file may stop short of its sector boundary.
        if start + CHUNK_RECORD_PREFIX_BYTES as u64 > self.file_len {
            return Err(bad(format!("record starts past end of file ({} bytes)", self.file_len)).into());
        }

        self.file.seek(SeekFrom::Start(start))?;
        let mut prefix = [0u8; CHUNK_RECORD_PREFIX_BYTES];
        self.file.read_exact(&mut prefix)?;
        let length = BigEndian::read_u32(&prefix[..4]) as usize;
        if length == 0 {
            return Err(bad("record length is 0".into()).into());
        }
        if length + 4 > capacity {
            return Err(bad(format!("record of {} bytes exceeds {} allocated", length, capacity)).into());
        }
        if start + 4 + length as u64 > self.file_len {
            return Err(bad(format!("record ends past end of file ({} bytes)", self.file_len)).into());
        }

        let scheme = CompressionScheme::from_marker(prefix[4])?;
        let mut payload = vec![0u8; length - 1];
        self.file.read_exact(&mut payload)?;
        Ok(Some(scheme.decompress(&payload)?))
    }

    /// Encodes and stores `doc` in slot (cx, cz), replacing any previous chunk there.
    pub fn write_chunk(&mut self, cx: i32, cz: i32, doc: &Document) -> RegionResult<()> {
        let raw = nbt::encode(doc)?;
        self.write_chunk_data(cx, cz, &raw)
    }

    /// Stores already-encoded document bytes in slot (cx, cz).
    pub fn write_chunk_data(&mut self, cx: i32, cz: i32, raw: &[u8]) -> RegionResult<()> {
        if !self.writable {
            return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "region opened read-only").into());
        }
        let slot = ChunkSlot::new(cx, cz)?;
        let compressed = WRITE_SCHEME.compress(raw)?;

        let record_len = compressed.len() + 1;
        let sectors = (record_len + 4).div_ceil(SECTOR_BYTES);
        if sectors > MAX_SECTORS_PER_CHUNK {
            return Err(FormatError::ChunkTooLarge { cx, cz, sectors }.into());
        }

        let previous = self.locations[slot.index()];
        let offset = if !previous.is_absent() && previous.sectors() >= sectors {
            if previous.sectors() > sectors {
                self.release(Location::new(previous.offset() + sectors, previous.sectors() - sectors));
            }
            previous.offset()
        } else {
            if !previous.is_absent() {
                self.release(previous);
            }
            self.allocate(sectors)?
        };

        let mut record = Vec::with_capacity(sectors * SECTOR_BYTES);
        record.extend_from_slice(&(record_len as u32).to_be_bytes());
        record.push(WRITE_SCHEME.marker());
        record.extend_from_slice(&compressed);
        record.resize(sectors * SECTOR_BYTES, 0);

        let start = offset as u64 * SECTOR_BYTES as u64;
        self.file.seek(SeekFrom::Start(start))?;
        self.file.write_all(&record)?;
        self.file_len = self.file_len.max(start + record.len() as u64);

        self.locations[slot.index()] = Location::new(offset, sectors);
        self.timestamps[slot.index()] = unix_now();
        self.header_dirty = true;
        debug!("Wrote chunk ({}, {}) to {} at sector {} (+{})", cx, cz, self.path.display(), offset, sectors);
        Ok(())
    }

    /// Empties slot (cx, cz) and frees its sectors for reuse.
    pub fn remove_chunk(&mut self, cx: i32, cz: i32) -> RegionResult<bool> {
        let slot = ChunkSlot::new(cx, cz)?;
        let previous = self.locations[slot.index()];
        if previous.is_absent() {
            return Ok(false);
        }
        self.release(previous);
        self.locations[slot.index()] = Location::default();
        self.timestamps[slot.index()] = 0;
        self.header_dirty = true;
        Ok(true)
    }

    /// Flushes the header and closes the handle.
    pub fn close(mut self) -> RegionResult<()> {
        self.flush_header()
    }

    fn flush_header(&mut self) -> RegionResult<()> {
        if !self.writable || !self.header_dirty {
            return Ok(());
        }
        let mut header = vec![0u8; HEADER_BYTES];
        let (loc_bytes, ts_bytes) = header.split_at_mut(HEADER_BYTES / 2);
        for (index, location) in self.locations.iter().enumerate() {
            BigEndian::write_u32(&mut loc_bytes[index * 4..index * 4 + 4], location.0);
        }
        BigEndian::write_u32_into(&self.timestamps, ts_bytes);

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&header)?;
        self.file.flush()?;
        self.header_dirty = false;
        Ok(())
    }

    /// First-fit search for `count` free sectors; grows the file when no hole fits.
    fn allocate(&mut self, count: usize) -> RegionResult<usize> {
        let mut run_start = HEADER_SECTORS as usize;
        let mut run_len = 0;
        for (index, used) in self.used_sectors.iter().enumerate().skip(HEADER_SECTORS as usize) {
            if *used {
                run_start = index + 1;
                run_len = 0;
            } else {
                run_len += 1;
                if run_len == count {
                    break;
                }
            }
        }
        // Either a complete hole, or the trailing free run which the new record extends.
        if run_start + count > MAX_SECTOR_OFFSET {
            return Err(FormatError::LengthOverflow(run_start, "region sector offset").into());
        }
        if self.used_sectors.len() < run_start + count {
            self.used_sectors.resize(run_start + count, false);
        }
        self.used_sectors[run_start..run_start + count].iter_mut().for_each(|s| *s = true);
        Ok(run_start)
    }

    fn release(&mut self, location: Location) {
        let end = (location.offset() + location.sectors()).min(self.used_sectors.len());
        if location.offset() < end {
            self.used_sectors[location.offset()..end].iter_mut().for_each(|s| *s = false);
        }
    }
}

impl Drop for RegionFile {
    fn drop(&mut self) {
        if let Err(e) = self.flush_header() {
            warn!("Failed to flush header of {} on drop: {}", self.path.display(), e);
        }
    }
}

fn read_header(file: &mut File) -> RegionResult<(Vec<Location>, Vec<u32>)> {
    let mut header = vec![0u8; HEADER_BYTES];
    file.seek(SeekFrom::Start(0))?;
    file.read_exact(&mut header)?;

    let mut raw = vec![0u32; REGION_SLOTS];
    BigEndian::read_u32_into(&header[..HEADER_BYTES / 2], &mut raw);
    let locations = raw.iter().map(|v| Location(*v)).collect();

    let mut timestamps = vec![0u32; REGION_SLOTS];
    BigEndian::read_u32_into(&header[HEADER_BYTES / 2..], &mut timestamps);
    Ok((locations, timestamps))
}

fn unix_now() -> u32 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as u32).unwrap_or(0)
}
