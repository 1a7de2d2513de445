//! Record file engine: the physical layer of a variable.
//!
//! One growable file per variable: a fixed 128-byte header (see
//! [`header`]) followed by fixed-width `f64` little-endian records, one
//! per time step.
//!
//! **Append-Only Write Pattern**: appending at the tail is the only
//! write operation; committed records are never rewritten. Each append
//! follows an ordered two-phase protocol:
//!
//! 1. write the record bytes at slot `committed`, `sync_data`;
//! 2. advance the committed-count header field, `sync_data` again.
//!
//! A reader in another process that re-reads the count field therefore
//! only ever observes a prefix of complete records, which is what makes
//! unlocked cross-process polling safe. No file locks are taken.

pub mod header;
mod cache;

use crate::datatype::TypeDescriptor;
use crate::error::{Error, Result};
use cache::RecordCache;
use header::{Header, CAPACITY_OFFSET, COMMITTED_OFFSET, HEADER_LEN};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Hard limit on the size a variable file may grow to (1 TiB).
///
/// Turns runaway geometric growth into `CapacityExceeded` instead of
/// filling the disk.
pub const MAX_FILE_BYTES: u64 = 1 << 40;

/// Open handle on one variable file.
///
/// Durable storage of a growable sequence of fixed-width records. Every
/// successful [`append`](Self::append) is durable before it returns, so
/// the handle needs no explicit flush on shutdown; [`sync`](Self::sync)
/// exists for callers that want a full-metadata fsync.
#[derive(Debug)]
pub struct RecordFile {
    file: File,
    path: PathBuf,
    datatype: TypeDescriptor,
    capacity: u64,
    committed: u64,
    cache: RecordCache,
}

impl RecordFile {
    /// Creates a new variable file at `path`.
    ///
    /// Parent directories are created as needed. The data region is
    /// preallocated to `capacity` records via `set_len` so early
    /// appends do not re-extend the file.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` if a file is already present (callers open
    /// instead); `CapacityExceeded` if the requested preallocation
    /// passes [`MAX_FILE_BYTES`].
    pub fn create(
        path: &Path,
        datatype: TypeDescriptor,
        cache_size: usize,
        capacity: u64,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let total = file_size_for(&datatype, capacity)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    Error::AlreadyExists {
                        path: path.to_path_buf(),
                    }
                } else {
                    Error::Io(e)
                }
            })?;

        let header = Header {
            datatype,
            capacity,
            committed: 0,
        };
        file.write_all(&header.encode()?)?;
        file.set_len(total)?;
        file.sync_all()?;

        debug!(path = %path.display(), %datatype, capacity, "created variable file");
        Ok(Self {
            file,
            path: path.to_path_buf(),
            datatype,
            capacity,
            committed: 0,
            cache: RecordCache::new(cache_size),
        })
    }

    /// Opens an existing variable file.
    ///
    /// # Errors
    ///
    /// `NotFound` if no file is present; `Corrupt` if the header fails
    /// validation.
    pub fn open(path: &Path, cache_size: usize) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Error::NotFound {
                        path: path.to_path_buf(),
                    }
                } else {
                    Error::Io(e)
                }
            })?;

        let mut buf = [0u8; HEADER_LEN as usize];
        file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                Error::Corrupt {
                    path: path.to_path_buf(),
                    reason: "file shorter than a variable header".to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let header = Header::decode(&buf, path)?;

        debug!(
            path = %path.display(),
            datatype = %header.datatype,
            committed = header.committed,
            "opened variable file"
        );
        Ok(Self {
            file,
            path: path.to_path_buf(),
            datatype: header.datatype,
            capacity: header.capacity,
            committed: header.committed,
            cache: RecordCache::new(cache_size),
        })
    }

    /// Datatype every record of this file conforms to.
    #[must_use]
    pub const fn datatype(&self) -> &TypeDescriptor {
        &self.datatype
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records the data region is currently sized for.
    #[must_use]
    pub const fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Number of fully written records safe to read, as of the last
    /// open, append, or [`refresh`](Self::refresh) on this handle.
    #[must_use]
    pub const fn committed(&self) -> u64 {
        self.committed
    }

    /// Re-reads the commit marker from disk.
    ///
    /// This is how a reader observes records appended by another
    /// process since the handle was opened. Returns the new committed
    /// count.
    ///
    /// # Errors
    ///
    /// IO failures re-reading the header fields.
    pub fn refresh(&mut self) -> Result<u64> {
        let mut buf = [0u8; 16];
        self.file.seek(SeekFrom::Start(CAPACITY_OFFSET))?;
        self.file.read_exact(&mut buf)?;
        self.capacity = u64::from_le_bytes(buf[0..8].try_into().unwrap());
        self.committed = u64::from_le_bytes(buf[8..16].try_into().unwrap());
        Ok(self.committed)
    }

    /// Reads the record at `index`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `index >= committed()`.
    pub fn read(&mut self, index: u64) -> Result<Vec<f64>> {
        if index >= self.committed {
            return Err(Error::OutOfRange {
                index,
                count: self.committed,
            });
        }
        if let Some(record) = self.cache.get(index) {
            return Ok(record.clone());
        }

        let record_bytes = self.datatype.record_bytes();
        let mut buf = vec![0u8; record_bytes];
        self.file.seek(SeekFrom::Start(self.data_offset(index)))?;
        self.file.read_exact(&mut buf)?;
        let record = decode_record(&buf);
        self.cache.insert(index, record.clone());
        Ok(record)
    }

    /// Reads the contiguous records `[start, end)` in one bulk read.
    ///
    /// Bulk reads bypass the cache so a history scan cannot evict the
    /// hot entries of a sequential reader.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `end > committed()` or `start > end`.
    pub fn read_range(&mut self, start: u64, end: u64) -> Result<Vec<Vec<f64>>> {
        if end > self.committed || start > end {
            return Err(Error::OutOfRange {
                index: if start > end { start } else { end },
                count: self.committed,
            });
        }
        let record_bytes = self.datatype.record_bytes();
        let n = usize::try_from(end - start).map_err(|_| Error::OutOfRange {
            index: end,
            count: self.committed,
        })?;
        let mut buf = vec![0u8; n * record_bytes];
        self.file.seek(SeekFrom::Start(self.data_offset(start)))?;
        self.file.read_exact(&mut buf)?;
        Ok(buf.chunks_exact(record_bytes).map(decode_record).collect())
    }

    /// Appends a record at the next free slot, returning its index.
    ///
    /// Durable before returning: the payload is flushed, then the
    /// commit marker is advanced and flushed.
    ///
    /// # Errors
    ///
    /// `LengthMismatch` if `values` has the wrong arity for the
    /// datatype; `CapacityExceeded` if growth would pass
    /// [`MAX_FILE_BYTES`].
    pub fn append(&mut self, values: &[f64]) -> Result<u64> {
        if values.len() != self.datatype.record_len() {
            return Err(Error::LengthMismatch {
                expected: self.datatype.record_len(),
                got: values.len(),
            });
        }
        if self.committed == self.capacity {
            self.grow()?;
        }

        let index = self.committed;
        self.file.seek(SeekFrom::Start(self.data_offset(index)))?;
        self.file.write_all(&encode_record(values))?;
        self.file.sync_data()?;

        // Payload is durable; advance the commit marker.
        self.file.seek(SeekFrom::Start(COMMITTED_OFFSET))?;
        self.file.write_all(&(index + 1).to_le_bytes())?;
        self.file.sync_data()?;

        self.committed = index + 1;
        self.cache.insert(index, values.to_vec());
        Ok(index)
    }

    /// Fsyncs file data and metadata.
    ///
    /// # Errors
    ///
    /// IO failures from the underlying fsync.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Doubles the record capacity and re-extends the backing file.
    ///
    /// The new capacity field is flushed together with the next payload
    /// write, before the commit marker moves, so readers still only
    /// trust fully committed state.
    fn grow(&mut self) -> Result<()> {
        let new_capacity = (self.capacity * 2).max(self.capacity + 1);
        let total = file_size_for(&self.datatype, new_capacity)?;
        self.file.set_len(total)?;
        self.file.seek(SeekFrom::Start(CAPACITY_OFFSET))?;
        self.file.write_all(&new_capacity.to_le_bytes())?;

        debug!(
            path = %self.path.display(),
            old_capacity = self.capacity,
            new_capacity,
            "grew variable file"
        );
        self.capacity = new_capacity;
        Ok(())
    }

    const fn data_offset(&self, index: u64) -> u64 {
        HEADER_LEN + index * self.datatype.record_bytes() as u64
    }
}

/// Total file size for a capacity of `capacity` records, checked
/// against [`MAX_FILE_BYTES`].
fn file_size_for(datatype: &TypeDescriptor, capacity: u64) -> Result<u64> {
    let over = || Error::CapacityExceeded {
        requested_bytes: u64::MAX,
        max_bytes: MAX_FILE_BYTES,
    };
    let total = capacity
        .checked_mul(datatype.record_bytes() as u64)
        .and_then(|data| data.checked_add(HEADER_LEN))
        .ok_or_else(over)?;
    if total > MAX_FILE_BYTES {
        return Err(Error::CapacityExceeded {
            requested_bytes: total,
            max_bytes: MAX_FILE_BYTES,
        });
    }
    Ok(total)
}

fn encode_record(values: &[f64]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 8);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}

fn decode_record(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| f64::from_le_bytes(c.try_into().unwrap()))
        .collect()
}
