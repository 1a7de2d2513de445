//! Scoped sessions over a variable.
//!
//! [`Variable`] is the public entry point of the store: it opens or
//! creates one variable, negotiates its schema, and exposes typed
//! read/write/range/iterate operations. The handle is a scoped
//! resource: dropping it releases the file engine on every exit path,
//! and every committed record is already durable, so no data is lost
//! on an error path.
//!
//! Multiple sessions on the same variable, from the same or different
//! processes, are a first-class pattern: one external appender, any
//! number of readers.
//!
//! # Example
//!
//! ```rust,no_run
//! use timevar::{path, Variable};
//! use std::path::Path;
//!
//! # fn main() -> timevar::Result<()> {
//! let p = path::resolve(Path::new("/data/run1"), "img", "error_data");
//! let datatype = "Map1D<Scalar>=100".parse()?;
//! let mut v = Variable::realize(&p, Some(datatype), 1, 100)?;
//! v.set(0, &vec![0.5; 100])?;
//! let (first, count) = v.time_range();
//! assert_eq!((first, count), (0, 1));
//! # Ok(())
//! # }
//! ```

use crate::datatype::TypeDescriptor;
use crate::error::{Error, Result};
use crate::file::RecordFile;
use std::path::Path;
use tracing::warn;

/// Default number of records kept resident per session.
pub const DEFAULT_CACHE_SIZE: usize = 2;

/// A scoped session bound to one open variable.
///
/// Owns the file handle and record cache; they are released when the
/// session is dropped or explicitly [`close`](Self::close)d.
#[derive(Debug)]
pub struct Variable {
    file: RecordFile,
    synced: bool,
}

impl Variable {
    /// Opens an existing variable.
    ///
    /// Datatype and cache parameters are taken from the file; the
    /// session cache uses [`DEFAULT_CACHE_SIZE`].
    ///
    /// # Errors
    ///
    /// `NotFound` if no file exists at `path`; `Corrupt` if the file is
    /// not a valid variable.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            file: RecordFile::open(path, DEFAULT_CACHE_SIZE)?,
            synced: false,
        })
    }

    /// Opens or creates a variable, negotiating its schema.
    ///
    /// - With `datatype = None` this behaves as [`open`](Self::open).
    /// - With a datatype, a missing file is created with that schema,
    ///   `cache_size` resident records, and room preallocated for
    ///   `file_capacity` records; an existing file is opened and its
    ///   stored schema validated against the request.
    ///
    /// # Errors
    ///
    /// `NotFound` when opening without a datatype and no file exists;
    /// `SchemaMismatch` when the stored datatype is incompatible with
    /// the requested one.
    pub fn realize(
        path: &Path,
        datatype: Option<TypeDescriptor>,
        cache_size: usize,
        file_capacity: u64,
    ) -> Result<Self> {
        let Some(requested) = datatype else {
            return Self::open(path);
        };

        let file = match RecordFile::create(path, requested, cache_size, file_capacity) {
            Ok(file) => file,
            Err(Error::AlreadyExists { .. }) => {
                let file = RecordFile::open(path, cache_size)?;
                if !file.datatype().is_compatible(&requested) {
                    return Err(Error::SchemaMismatch {
                        path: path.to_path_buf(),
                        stored: file.datatype().to_string(),
                        requested: requested.to_string(),
                    });
                }
                file
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            file,
            synced: false,
        })
    }

    /// Datatype of this variable, immutable since creation.
    #[must_use]
    pub const fn datatype(&self) -> &TypeDescriptor {
        self.file.datatype()
    }

    /// The committed time range as a `(first, count)` pair.
    ///
    /// `first` is currently always 0 (no front truncation), but callers
    /// must treat the range as a pair rather than assume it. The count
    /// reflects this session's last observation; call
    /// [`refresh`](Self::refresh) to see records committed by another
    /// process since then.
    #[must_use]
    pub const fn time_range(&self) -> (u64, u64) {
        (0, self.file.committed())
    }

    /// Re-reads the commit marker so concurrent appends become visible.
    ///
    /// Returns the updated committed count.
    ///
    /// # Errors
    ///
    /// IO failures re-reading the header.
    pub fn refresh(&mut self) -> Result<u64> {
        self.file.refresh()
    }

    /// Reads the record at time `index`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `index` is at or past the committed count.
    pub fn get(&mut self, index: u64) -> Result<Vec<f64>> {
        self.file.read(index)
    }

    /// Reads the contiguous records `[start, end)`.
    ///
    /// # Errors
    ///
    /// `OutOfRange` if `end` passes the committed count or `start > end`.
    pub fn get_range(&mut self, start: u64, end: u64) -> Result<Vec<Vec<f64>>> {
        self.file.read_range(start, end)
    }

    /// Writes a record at time `index`.
    ///
    /// Append-only: the only writable index is the current count (the
    /// next free slot). The record is durable before this returns.
    ///
    /// # Errors
    ///
    /// `InvalidWrite` for any other index; `LengthMismatch` if `values`
    /// has the wrong arity; `CapacityExceeded` if the file cannot grow
    /// further.
    pub fn set(&mut self, index: u64, values: &[f64]) -> Result<()> {
        let next = self.file.committed();
        if index != next {
            return Err(Error::InvalidWrite { index, next });
        }
        self.file.append(values)?;
        Ok(())
    }

    /// Iterates `(index, record)` pairs over the committed range.
    ///
    /// The range `[0, count)` is snapshotted when this is called:
    /// records appended mid-iteration are not observed, and a fresh
    /// call is needed to see them. The iterator is finite and
    /// restartable.
    pub fn iter_all(&mut self) -> RecordIter<'_> {
        let end = self.file.committed();
        RecordIter {
            variable: self,
            next: 0,
            end,
        }
    }

    /// Flushes and releases the session, reporting any final IO error.
    ///
    /// Dropping the session performs the same release; `close` exists
    /// for callers that want the failure surfaced instead of logged.
    ///
    /// # Errors
    ///
    /// IO failures from the final fsync.
    pub fn close(mut self) -> Result<()> {
        self.file.sync()?;
        self.synced = true;
        Ok(())
    }
}

impl Drop for Variable {
    fn drop(&mut self) {
        if !self.synced {
            // Committed records are already durable; this only covers
            // file metadata. Failure is logged, not raised.
            if let Err(e) = self.file.sync() {
                warn!(path = %self.file.path().display(), error = %e, "flush on drop failed");
            }
        }
    }
}

/// Finite iterator over a snapshot of a variable's committed range.
///
/// Produced by [`Variable::iter_all`].
#[derive(Debug)]
pub struct RecordIter<'a> {
    variable: &'a mut Variable,
    next: u64,
    end: u64,
}

impl Iterator for RecordIter<'_> {
    type Item = Result<(u64, Vec<f64>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.variable.get(index).map(|record| (index, record)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.end - self.next).ok();
        (remaining.unwrap_or(usize::MAX), remaining)
    }
}

/// Owning iterator over the full committed history of a variable.
///
/// Produced by [`data_range_full`].
#[derive(Debug)]
pub struct HistoryIter {
    variable: Variable,
    next: u64,
    end: u64,
}

impl Iterator for HistoryIter {
    type Item = Result<(u64, Vec<f64>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(self.variable.get(index).map(|record| (index, record)))
    }
}

/// Opens a variable and yields its whole committed history as
/// `(index, record)` pairs.
///
/// Convenience for consumers that scan an entire finished history
/// (reconstruction and plotting tools). The count is snapshotted at the
/// call, exactly like [`Variable::iter_all`].
///
/// # Errors
///
/// `NotFound` if the variable does not exist; `Corrupt` for an invalid
/// file.
pub fn data_range_full(path: &Path) -> Result<HistoryIter> {
    let variable = Variable::open(path)?;
    let (_, end) = variable.time_range();
    Ok(HistoryIter {
        variable,
        next: 0,
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;
    use tempfile::TempDir;

    #[test]
    fn test_realize_without_datatype_requires_existing_file() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "missing");
        let err = Variable::realize(&p, None, 1, 0).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_set_is_append_only() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "v");
        let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 4).unwrap();

        v.set(0, &[1.0]).unwrap();
        let err = v.set(0, &[2.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidWrite { index: 0, next: 1 }));
        let err = v.set(5, &[2.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidWrite { index: 5, next: 1 }));
    }

    #[test]
    fn test_iter_all_snapshots_count() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "v");
        let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 8).unwrap();
        for i in 0..3u32 {
            v.set(u64::from(i), &[f64::from(i)]).unwrap();
        }

        let seen: Vec<_> = v.iter_all().collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2], (2, vec![2.0]));

        // New appends only show up in a fresh iteration.
        v.set(3, &[3.0]).unwrap();
        assert_eq!(v.iter_all().count(), 4);
    }

    #[test]
    fn test_data_range_full_scans_history() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "predict-out", "predicted-thrust");
        {
            let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 4).unwrap();
            for i in 0..4u32 {
                v.set(u64::from(i), &[f64::from(i) * 0.25]).unwrap();
            }
        }

        let history: Vec<_> = data_range_full(&p)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3], (3, vec![0.75]));
    }
}
