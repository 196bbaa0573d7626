// Integration tests for the pool's exclusivity lock.
//
//   - many threads compressing distinct pairs through one pool never mix
//     their inputs
//   - a second operation blocks until the first has fully torn down
//   - a panic inside an operation leaves the pool usable

use std::fs::{File, Permissions};
use std::io;
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use recompress::io::{EnginePool, FsOpener, Opener};
use tempfile::TempDir;

#[test]
fn concurrent_callers_never_interleave() {
    let dir = TempDir::new().unwrap();
    let pool = Arc::new(EnginePool::new());

    let handles: Vec<_> = (0..8u8)
        .map(|t| {
            let pool = Arc::clone(&pool);
            let src = dir.path().join(format!("in{}.bin", t));
            let dst = dir.path().join(format!("out{}.zst", t));
            // Each thread's input is distinguishable from every other's.
            let data: Vec<u8> = (0..300_000u32)
                .map(|i| (i as u8).wrapping_mul(t + 1) ^ t)
                .collect();
            std::fs::write(&src, &data).unwrap();
            thread::spawn(move || {
                for _ in 0..4 {
                    pool.compress(&src, &dst).unwrap();
                    let compressed = std::fs::read(&dst).unwrap();
                    assert_eq!(zstd::decode_all(&compressed[..]).unwrap(), data);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("worker panicked");
    }
    assert_eq!(pool.constructions(), 1);
}

/// Filesystem opener that parks inside `open_source` until released.
struct Gate {
    entered: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl Opener for Gate {
    type Source = File;
    type Sink = File;

    fn open_source(&self, path: &Path) -> io::Result<File> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        FsOpener.open_source(path)
    }

    fn open_sink(&self, path: &Path, perms: &Permissions) -> io::Result<File> {
        FsOpener.open_sink(path, perms)
    }
}

#[test]
fn second_caller_waits_for_first_teardown() {
    let dir = TempDir::new().unwrap();
    let src_a = dir.path().join("a.txt");
    let src_b = dir.path().join("b.txt");
    std::fs::write(&src_a, b"first caller").unwrap();
    std::fs::write(&src_b, b"second caller").unwrap();
    let dst_a = dir.path().join("a.zst");
    let dst_b = dir.path().join("b.zst");

    let pool = Arc::new(EnginePool::new());
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let gate = Gate {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };

    let first = {
        let pool = Arc::clone(&pool);
        let (src, dst) = (src_a.clone(), dst_a.clone());
        thread::spawn(move || pool.compress_with(&src, &dst, &gate).unwrap())
    };
    entered_rx.recv().unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    let second = {
        let pool = Arc::clone(&pool);
        let (src, dst) = (src_b.clone(), dst_b.clone());
        thread::spawn(move || {
            pool.compress(&src, &dst).unwrap();
            done_tx.send(()).unwrap();
        })
    };

    assert!(
        done_rx.recv_timeout(Duration::from_millis(200)).is_err(),
        "second caller ran while the first held the engine"
    );
    assert!(!dst_b.exists());

    release_tx.send(()).unwrap();
    first.join().unwrap();
    done_rx.recv_timeout(Duration::from_secs(10)).expect("second caller finishes");
    second.join().unwrap();

    let a = zstd::decode_all(&std::fs::read(&dst_a).unwrap()[..]).unwrap();
    let b = zstd::decode_all(&std::fs::read(&dst_b).unwrap()[..]).unwrap();
    assert_eq!(a, b"first caller");
    assert_eq!(b, b"second caller");
}

/// Opener that panics before handing out the input.
struct Panicking;

impl Opener for Panicking {
    type Source = File;
    type Sink = File;

    fn open_source(&self, _path: &Path) -> io::Result<File> {
        panic!("opener failed mid-operation");
    }

    fn open_sink(&self, path: &Path, perms: &Permissions) -> io::Result<File> {
        FsOpener.open_sink(path, perms)
    }
}

#[test]
fn pool_recovers_after_panicking_operation() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("in.txt");
    let dst = dir.path().join("in.txt.zst");
    std::fs::write(&src, b"abc").unwrap();

    let pool = Arc::new(EnginePool::new());
    pool.compress(&src, &dst).unwrap();

    let crashed = {
        let pool = Arc::clone(&pool);
        let (src, dst) = (src.clone(), dst.clone());
        thread::spawn(move || pool.compress_with(&src, &dst, &Panicking))
    };
    assert!(crashed.join().is_err(), "the operation should have panicked");

    pool.compress(&src, &dst).unwrap();
    assert_eq!(zstd::decode_all(&std::fs::read(&dst).unwrap()[..]).unwrap(), b"abc");
    // The engine held by the panicking operation was lost with it.
    assert_eq!(pool.constructions(), 2);
}
