//! # Timevar: Persistent Timeline Variable Store
//!
//! A file-backed, typed, time-indexed variable store for training
//! telemetry that is written incrementally by one process and read by
//! others, sometimes while still growing.
//!
//! Each **variable** is one on-disk file addressed by a
//! `(root, timeline, name)` triple, holding a header (schema, capacity,
//! committed count) followed by fixed-width `f64` records, one per time
//! step. A single external producer appends; any number of consumer
//! processes read concurrently without locks, made safe by an
//! append-only data region and an ordered commit-marker update.
//!
//! ## Layers
//!
//! - [`path`]: pure resolver from the addressing triple to a file path
//! - [`datatype`]: the closed [`TypeDescriptor`] grammar and schema
//!   compatibility rules
//! - [`file`]: the record file engine (header, ordered appends,
//!   growth, record cache)
//! - [`variable`]: [`Variable`], the scoped session with RAII release
//! - [`poll`]: bounded waits for consumers racing the producer
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use timevar::{path, poll, Variable};
//!
//! # fn main() -> timevar::Result<()> {
//! let root = Path::new("/data/run1");
//! let p = path::resolve(root, "predict-out", "predicted-thrust");
//!
//! // Wait for the trainer to create the variable, then for data.
//! if !poll::wait_for_existence(&p, Duration::from_secs(20), Duration::from_secs(1)) {
//!     return Ok(());
//! }
//! let mut predictions = Variable::open(&p)?;
//! if poll::wait_for_count(&mut predictions, 1, Duration::from_secs(10), Duration::from_millis(500))? {
//!     let (_, count) = predictions.time_range();
//!     let history = predictions.get_range(0, count)?;
//!     println!("{} predictions ready", history.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod datatype;
pub mod error;
pub mod file;
pub mod path;
pub mod poll;
pub mod variable;

pub use datatype::{ElementKind, TypeDescriptor};
pub use error::{Error, Result};
pub use variable::Variable;
