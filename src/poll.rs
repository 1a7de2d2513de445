//! Bounded polling for consumers racing a still-running producer.
//!
//! A consumer may start before the external trainer has created a
//! variable, or before it has committed enough records. Those are
//! expected, non-exceptional states, so the waiters here return `false`
//! on timeout instead of raising; only the strict [`existing`] variant
//! converts absence into an error. Timeouts are mandatory: the producer
//! is out of this crate's control and may never satisfy the condition.
//!
//! All waits are synchronous sleep loops with a fixed poll interval;
//! there are no other suspension points in the crate.

use crate::error::{Error, Result};
use crate::variable::Variable;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Waits for a variable file to appear at `path`.
///
/// Polls every `poll_interval` until the file exists or `timeout`
/// elapses. Returns `true` as soon as the file is present (including
/// immediately), `false` on timeout.
#[must_use]
pub fn wait_for_existence(path: &Path, timeout: Duration, poll_interval: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if path.exists() {
            return true;
        }
        if Instant::now() >= deadline {
            trace!(path = %path.display(), ?timeout, "existence wait timed out");
            return false;
        }
        thread::sleep(remaining_or(poll_interval, deadline));
    }
}

/// Waits until a variable's committed count reaches `min_count`.
///
/// Re-queries the commit marker via [`Variable::refresh`] every
/// `poll_interval`. Returns `Ok(true)` once `count >= min_count`,
/// `Ok(false)` on timeout. The count observed on success is already
/// visible through `variable.time_range()`.
///
/// # Errors
///
/// IO failures while re-reading the header propagate; a timeout does
/// not.
pub fn wait_for_count(
    variable: &mut Variable,
    min_count: u64,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<bool> {
    let deadline = Instant::now() + timeout;
    loop {
        if variable.refresh()? >= min_count {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            trace!(min_count, ?timeout, "count wait timed out");
            return Ok(false);
        }
        thread::sleep(remaining_or(poll_interval, deadline));
    }
}

/// Strict existence wait: fails with `Timeout` if the file never shows.
///
/// For callers that treat a missing variable as fatal (for example the
/// inspection tool in `--wait` mode) rather than as "data not ready".
///
/// # Errors
///
/// `Timeout` after `timeout` without the file appearing.
pub fn existing(path: &Path, timeout: Duration, poll_interval: Duration) -> Result<PathBuf> {
    if wait_for_existence(path, timeout, poll_interval) {
        Ok(path.to_path_buf())
    } else {
        Err(Error::Timeout { waited: timeout })
    }
}

/// Clamps a sleep to the remaining time before `deadline`, so a wait
/// never overshoots its budget by a full interval.
fn remaining_or(poll_interval: Duration, deadline: Instant) -> Duration {
    poll_interval.min(deadline.saturating_duration_since(Instant::now()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::TypeDescriptor;
    use crate::path;
    use tempfile::TempDir;

    const TICK: Duration = Duration::from_millis(10);

    #[test]
    fn test_wait_for_existence_immediate_hit() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "v");
        Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 1).unwrap();
        assert!(wait_for_existence(&p, Duration::ZERO, TICK));
    }

    #[test]
    fn test_wait_for_existence_times_out_quietly() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "never");
        let start = Instant::now();
        assert!(!wait_for_existence(&p, Duration::from_millis(50), TICK));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_for_count_already_satisfied() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "v");
        let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 4).unwrap();
        v.set(0, &[1.0]).unwrap();

        assert!(wait_for_count(&mut v, 1, Duration::ZERO, TICK).unwrap());
    }

    #[test]
    fn test_wait_for_count_timeout_returns_false() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "v");
        let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 4).unwrap();

        let ok = wait_for_count(&mut v, 5, Duration::from_millis(40), TICK).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_existing_raises_timeout() {
        let dir = TempDir::new().unwrap();
        let p = path::resolve(dir.path(), "img", "never");
        let err = existing(&p, Duration::from_millis(30), TICK).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
