//! Canonical on-disk addressing for variables.
//!
//! All path conventions live here so they can evolve without touching
//! the file engine or the session layer. A variable is identified by
//! the triple (root, timeline, name); the resolver is a pure function
//! from that triple to a filesystem path and performs no I/O.
//!
//! Variable names may embed `/` (saved-weight variables are named
//! `MapName/WeightName`); each embedded separator introduces one
//! directory level, so `("saved", "Error/We-0")` resolves to
//! `<root>/saved/Error/We-0.var` rather than a flat file whose name
//! contains a slash.

use std::path::{Path, PathBuf};

/// Extension carried by every variable file.
pub const VAR_EXTENSION: &str = "var";

/// Resolves (root, timeline, name) to the variable's canonical path.
///
/// Pure function, no I/O. Distinct (timeline, name) pairs under the
/// same root never alias the same file: the timeline is always one
/// directory level and the `.var` extension is appended to the final
/// name segment only.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use timevar::path::resolve;
///
/// let p = resolve(Path::new("/data/run1"), "saved", "Error/We-0");
/// assert_eq!(p, Path::new("/data/run1/saved/Error/We-0.var"));
/// ```
#[must_use]
pub fn resolve(root: &Path, timeline: &str, name: &str) -> PathBuf {
    let mut path = root.join(timeline);
    let mut segments = name.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.{VAR_EXTENSION}"));
        }
    }
    path
}
