//! Polling tests: a consumer racing a producer that is still creating
//! or still filling a variable. The producer runs on its own thread
//! with its own session, which exercises the same commit-marker
//! protocol a separate process would.

use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use timevar::{path, poll, TypeDescriptor, Variable};

const TICK: Duration = Duration::from_millis(10);

#[test]
fn test_reader_eventually_observes_producer_appends() {
    let dir = TempDir::new().unwrap();
    let p = path::resolve(dir.path(), "predict-out", "predicted-thrust");

    let mut reader = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 32).unwrap();

    let writer_path = p.clone();
    let producer = thread::spawn(move || {
        let mut writer = Variable::open(&writer_path).unwrap();
        for t in 0..20u32 {
            writer.set(u64::from(t), &[f64::from(t) / 20.0]).unwrap();
            thread::sleep(Duration::from_millis(5));
        }
    });

    let ok = poll::wait_for_count(&mut reader, 20, Duration::from_secs(30), TICK).unwrap();
    assert!(ok, "producer never reached 20 records");

    // Every committed index reads back complete.
    for t in 0..20u64 {
        let record = reader.get(t).unwrap();
        assert_eq!(record.len(), 1);
        assert!((0.0..1.0).contains(&record[0]));
    }

    producer.join().unwrap();
}

#[test]
fn test_wait_for_existence_sees_late_creation() {
    let dir = TempDir::new().unwrap();
    let p = path::resolve(dir.path(), "img", "late");

    let create_path = p.clone();
    let producer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(60));
        Variable::realize(&create_path, Some(TypeDescriptor::Scalar), 1, 1).unwrap();
    });

    assert!(poll::wait_for_existence(&p, Duration::from_secs(5), TICK));
    producer.join().unwrap();
}

#[test]
fn test_existence_timeout_on_never_created_variable() {
    let dir = TempDir::new().unwrap();
    let p = path::resolve(dir.path(), "img", "never");

    let start = Instant::now();
    assert!(!poll::wait_for_existence(&p, Duration::from_secs(2), Duration::from_millis(100)));
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(2));
    // The wait must not overshoot its budget by more than one interval
    // plus scheduling noise.
    assert!(elapsed < Duration::from_secs(4), "waited {elapsed:?}");
}

#[test]
fn test_count_timeout_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let p = path::resolve(dir.path(), "img", "stalled");
    let mut v = Variable::realize(&p, Some(TypeDescriptor::Scalar), 1, 4).unwrap();
    v.set(0, &[0.5]).unwrap();

    // Producer stalls at 1 record; the wait reports "not ready".
    let ok = poll::wait_for_count(&mut v, 2, Duration::from_millis(80), TICK).unwrap();
    assert!(!ok);

    // The session is fully usable afterwards.
    assert_eq!(v.time_range(), (0, 1));
    assert_eq!(v.get(0).unwrap(), vec![0.5]);
}

#[test]
fn test_reader_count_is_monotonic_under_concurrent_appends() {
    let dir = TempDir::new().unwrap();
    let p = path::resolve(dir.path(), "img", "grow");
    // Tiny initial capacity so the producer grows the file mid-run.
    let mut reader = Variable::realize(&p, Some(TypeDescriptor::Pos2D), 1, 1).unwrap();

    let writer_path = p.clone();
    let producer = thread::spawn(move || {
        let mut writer = Variable::open(&writer_path).unwrap();
        for t in 0..50u32 {
            writer
                .set(u64::from(t), &[f64::from(t), f64::from(t) * 2.0])
                .unwrap();
        }
    });

    let mut last = 0;
    let deadline = Instant::now() + Duration::from_secs(30);
    while last < 50 && Instant::now() < deadline {
        let count = reader.refresh().unwrap();
        assert!(count >= last, "committed count went backwards: {last} -> {count}");
        // Everything at or below the observed count is fully readable.
        if count > 0 {
            assert_eq!(reader.get(count - 1).unwrap().len(), 2);
        }
        last = count;
    }
    assert_eq!(last, 50);

    producer.join().unwrap();
}
