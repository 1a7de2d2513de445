//! Error types for the timevar store.
//!
//! Every failure mode of the store is a distinct variant carrying enough
//! context (path, stored vs requested type, index vs committed count) to
//! produce a specific, actionable message. Nothing is swallowed inside
//! the store; only [`Error::Timeout`] is an expected, recoverable
//! outcome for callers racing an external producer.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Timevar store error types
#[derive(Error, Debug)]
pub enum Error {
    /// Opening a variable whose backing file does not exist
    #[error("variable not found: {}", path.display())]
    NotFound {
        /// Resolved path that was missing
        path: PathBuf,
    },

    /// Creating a variable over an existing file without an open fallback
    #[error("variable already exists: {}", path.display())]
    AlreadyExists {
        /// Resolved path that was already present
        path: PathBuf,
    },

    /// Requested datatype is incompatible with the on-disk schema
    #[error("schema mismatch at {}: file holds '{stored}', requested '{requested}'", path.display())]
    SchemaMismatch {
        /// Path of the conflicting file
        path: PathBuf,
        /// Datatype recorded in the file header
        stored: String,
        /// Datatype the caller asked for
        requested: String,
    },

    /// Read of an index at or beyond the committed count
    #[error("time index {index} out of range (committed count is {count})")]
    OutOfRange {
        /// Index that was requested
        index: u64,
        /// Committed count at the time of the request
        count: u64,
    },

    /// Write at an index other than the next free slot
    #[error("invalid write at time index {index}: appends only, next free slot is {next}")]
    InvalidWrite {
        /// Index the caller tried to write
        index: u64,
        /// The only index currently writable
        next: u64,
    },

    /// Growing the backing file would exceed the allowed size
    #[error("capacity exceeded: growing to {requested_bytes} bytes passes the {max_bytes}-byte limit")]
    CapacityExceeded {
        /// Size the file would need to reach
        requested_bytes: u64,
        /// Hard size limit
        max_bytes: u64,
    },

    /// Query that is meaningless for the variable's datatype
    #[error("unsupported query '{query}' for datatype '{datatype}'")]
    UnsupportedQuery {
        /// Datatype the query was asked of
        datatype: String,
        /// Name of the query
        query: &'static str,
    },

    /// Bounded wait elapsed before the condition held (recoverable)
    #[error("timed out after {waited:?} waiting for variable data")]
    Timeout {
        /// Total time spent waiting
        waited: Duration,
    },

    /// Record payload has the wrong number of elements for the datatype
    #[error("record length mismatch: datatype expects {expected} elements, got {got}")]
    LengthMismatch {
        /// Elements per record declared by the datatype
        expected: usize,
        /// Elements in the rejected payload
        got: usize,
    },

    /// Datatype grammar string that does not parse
    #[error("bad type specification '{0}'")]
    BadTypeSpec(String),

    /// File that exists but does not carry a valid variable header
    #[error("corrupt variable file at {}: {reason}", path.display())]
    Corrupt {
        /// Path of the rejected file
        path: PathBuf,
        /// What the header check found
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
