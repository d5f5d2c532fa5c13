use mailslot::{Interrupt, Slot, SlotError};
use serial_test::serial;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn read_vec(slot: &Slot, max: usize, interrupt: &Interrupt) -> Vec<u8> {
    let mut buf = vec![0u8; max];
    let n = slot.read(&mut buf, false, interrupt).unwrap();
    buf.truncate(n);
    buf
}

#[test]
fn resize_enlarge_keeps_records() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(1024).unwrap();

    for msg in ["ciao1", "ciao2", "ciao3"] {
        assert_eq!(slot.write(msg.as_bytes(), &intr).unwrap(), 5);
    }
    assert_eq!(slot.resize(2048, &intr).unwrap(), 2048);

    for msg in ["ciao1", "ciao2", "ciao3"] {
        assert_eq!(read_vec(&slot, 5, &intr), msg.as_bytes());
    }
}

#[test]
fn resize_on_boundaries() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(16).unwrap();

    slot.write(b"1234", &intr).unwrap();
    slot.write(b"1234", &intr).unwrap();
    assert_eq!(read_vec(&slot, 4, &intr), b"1234");
    assert_eq!(read_vec(&slot, 4, &intr), b"1234");

    slot.write(b"1234", &intr).unwrap();
    assert_eq!(slot.resize(8, &intr).unwrap(), 8);
    assert_eq!(read_vec(&slot, 4, &intr), b"1234");
    assert_eq!(slot.resize(16, &intr).unwrap(), 16);
}

#[test]
fn resize_refuses_to_truncate() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(64).unwrap();
    slot.write(&[1u8; 30], &intr).unwrap();

    assert_eq!(slot.resize(16, &intr), Err(SlotError::WouldTruncate));
    assert_eq!(slot.stats().capacity, 64);
    assert_eq!(read_vec(&slot, 30, &intr), vec![1u8; 30]);
}

#[test]
fn lifecycle_and_uninitialized_errors() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    let mut buf = [0u8; 8];

    assert!(!slot.is_active());
    assert_eq!(slot.write(b"x", &intr), Err(SlotError::NotInitialized));
    assert_eq!(slot.read(&mut buf, true, &intr), Err(SlotError::NotInitialized));
    assert_eq!(slot.resize(64, &intr), Err(SlotError::NotInitialized));

    slot.initialize(64).unwrap();
    assert!(slot.is_active());
    assert_eq!(slot.initialize(64), Err(SlotError::AlreadyInitialized));

    slot.destroy();
    assert!(!slot.is_active());
    slot.initialize(32).unwrap();
    assert_eq!(slot.stats().capacity, 32);
}

#[test]
fn write_limits() {
    let slot = Slot::with_max_record_size(8);
    let intr = Interrupt::new();
    slot.initialize(32).unwrap();

    assert_eq!(slot.write(&[0u8; 9], &intr), Err(SlotError::RecordTooLarge));
    // an empty record still takes its length prefix and is delivered
    assert_eq!(slot.write(b"", &intr), Ok(0));
    assert_eq!(slot.stats().used, 4);
    let mut buf = [0u8; 8];
    assert_eq!(slot.read(&mut buf, true, &intr), Ok(0));
    assert_eq!(slot.stats().used, 0);

    // 3 * (4 + 8) = 36 > 32
    slot.write(&[1u8; 8], &intr).unwrap();
    slot.write(&[2u8; 8], &intr).unwrap();
    let before = slot.stats();
    assert_eq!(slot.write(&[3u8; 8], &intr), Err(SlotError::InsufficientSpace));
    assert_eq!(slot.stats(), before);
}

#[test]
fn empty_records_keep_fifo_position() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(64).unwrap();

    slot.write(b"first", &intr).unwrap();
    slot.write(b"", &intr).unwrap();
    slot.write(b"last", &intr).unwrap();

    assert_eq!(read_vec(&slot, 8, &intr), b"first");
    assert_eq!(read_vec(&slot, 8, &intr), b"");
    assert_eq!(read_vec(&slot, 8, &intr), b"last");
    let mut buf = [0u8; 8];
    assert_eq!(slot.read(&mut buf, true, &intr), Err(SlotError::WouldBlock));
}

#[test]
#[serial]
fn empty_record_wakes_blocked_reader() {
    let slot = Arc::new(Slot::new());
    slot.initialize(64).unwrap();

    let reader = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            let mut buf = [0u8; 4];
            slot.read(&mut buf, false, &Interrupt::new())
        })
    };

    thread::sleep(Duration::from_millis(50));
    slot.write(b"", &Interrupt::new()).unwrap();
    assert_eq!(reader.join().unwrap(), Ok(0));
}

#[test]
fn failed_resize_allocation_keeps_buffer_and_records() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(64).unwrap();
    slot.write(b"keep", &intr).unwrap();
    let before = slot.stats();

    assert_eq!(slot.resize(1usize << 62, &intr), Err(SlotError::OutOfMemory));
    assert_eq!(slot.stats(), before);
    assert_eq!(slot.stats().capacity, 64);
    assert_eq!(read_vec(&slot, 4, &intr), b"keep");

    // the slot keeps working on the original buffer
    slot.write(b"more", &intr).unwrap();
    assert_eq!(read_vec(&slot, 4, &intr), b"more");
}

#[test]
fn small_read_buffer_keeps_record() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(64).unwrap();
    slot.write(b"too long", &intr).unwrap();

    let mut small = [0u8; 3];
    assert_eq!(slot.read(&mut small, true, &intr), Err(SlotError::DestinationTooSmall));
    assert_eq!(slot.read(&mut small, false, &intr), Err(SlotError::DestinationTooSmall));
    assert_eq!(read_vec(&slot, 8, &intr), b"too long");
}

#[test]
fn non_blocking_read_on_empty_returns_immediately() {
    let slot = Slot::new();
    let intr = Interrupt::new();
    slot.initialize(64).unwrap();

    let mut buf = [0u8; 1];
    let start = Instant::now();
    assert_eq!(slot.read(&mut buf, true, &intr), Err(SlotError::WouldBlock));
    assert!(start.elapsed() < Duration::from_millis(100));
}

#[test]
#[serial]
fn blocking_read_wakes_on_write() {
    let slot = Arc::new(Slot::new());
    slot.initialize(64).unwrap();

    let reader = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            let n = slot.read(&mut buf, false, &Interrupt::new()).unwrap();
            buf[..n].to_vec()
        })
    };

    thread::sleep(Duration::from_millis(50));
    let start = Instant::now();
    slot.write(b"wake up", &Interrupt::new()).unwrap();
    assert_eq!(reader.join().unwrap(), b"wake up");
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn blocking_read_is_interruptible() {
    let slot = Arc::new(Slot::new());
    slot.initialize(64).unwrap();
    let intr = Interrupt::new();

    let reader = {
        let slot = Arc::clone(&slot);
        let intr = intr.clone();
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            slot.read(&mut buf, false, &intr)
        })
    };

    thread::sleep(Duration::from_millis(50));
    intr.raise();
    assert_eq!(reader.join().unwrap(), Err(SlotError::Interrupted));

    // nothing was consumed and the slot still works after re-arming
    intr.clear();
    slot.write(b"after", &intr).unwrap();
    assert_eq!(read_vec(&slot, 8, &intr), b"after");
}

#[test]
#[serial]
fn destroy_wakes_blocked_reader() {
    let slot = Arc::new(Slot::new());
    slot.initialize(64).unwrap();

    let reader = {
        let slot = Arc::clone(&slot);
        thread::spawn(move || {
            let mut buf = [0u8; 16];
            slot.read(&mut buf, false, &Interrupt::new())
        })
    };

    thread::sleep(Duration::from_millis(50));
    slot.destroy();
    assert_eq!(reader.join().unwrap(), Err(SlotError::NotInitialized));
}

#[test]
#[serial]
fn concurrent_writers_serialize() {
    const WRITERS: usize = 8;
    const PER_WRITER: usize = 50;

    let slot = Arc::new(Slot::new());
    slot.initialize(WRITERS * PER_WRITER * 16).unwrap();

    let handles: Vec<_> = (0..WRITERS)
        .map(|w| {
            let slot = Arc::clone(&slot);
            thread::spawn(move || {
                let intr = Interrupt::new();
                for i in 0..PER_WRITER {
                    let tag = format!("w{w}-{i:03}");
                    assert_eq!(slot.write(tag.as_bytes(), &intr).unwrap(), tag.len());
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let intr = Interrupt::new();
    let mut seen = HashSet::new();
    let mut last_per_writer = vec![None; WRITERS];
    let mut buf = [0u8; 16];
    while let Ok(n) = slot.read(&mut buf, true, &intr) {
        let tag = String::from_utf8(buf[..n].to_vec()).unwrap();
        let (w, i) = tag[1..].split_once('-').unwrap();
        let (w, i): (usize, usize) = (w.parse().unwrap(), i.parse().unwrap());
        // each writer's own records stay in order
        assert!(last_per_writer[w].map_or(true, |last| last < i));
        last_per_writer[w] = Some(i);
        assert!(seen.insert(tag));
    }
    assert_eq!(seen.len(), WRITERS * PER_WRITER);
}

#[test]
#[serial]
fn readers_writers_and_resizers_do_not_deadlock_or_lose_records() {
    const WRITERS: usize = 4;
    const READERS: usize = 3;
    const PER_WRITER: usize = 400;
    let total = WRITERS * PER_WRITER;

    let slot = Arc::new(Slot::new());
    slot.initialize(4096).unwrap();
    let received = Arc::new(AtomicUsize::new(0));
    let checksum = Arc::new(AtomicUsize::new(0));
    let stop = Interrupt::new();

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let slot = Arc::clone(&slot);
        handles.push(thread::spawn(move || {
            let intr = Interrupt::new();
            let mut rng = fastrand::Rng::with_seed(w as u64);
            let mut sent = 0;
            while sent < PER_WRITER {
                let len = rng.usize(1..48);
                let record = vec![(len % 251) as u8; len];
                match slot.write(&record, &intr) {
                    Ok(_) => sent += 1,
                    Err(SlotError::InsufficientSpace) => thread::yield_now(),
                    Err(err) => panic!("write failed: {err}"),
                }
            }
        }));
    }
    for _ in 0..READERS {
        let slot = Arc::clone(&slot);
        let received = Arc::clone(&received);
        let checksum = Arc::clone(&checksum);
        let stop = stop.clone();
        handles.push(thread::spawn(move || {
            let mut buf = [0u8; 64];
            loop {
                match slot.read(&mut buf, false, &stop) {
                    Ok(n) => {
                        assert!(buf[..n].iter().all(|&b| b == (n % 251) as u8));
                        checksum.fetch_add(n, Ordering::Relaxed);
                        received.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(SlotError::Interrupted) => break,
                    Err(err) => panic!("read failed: {err}"),
                }
            }
        }));
    }
    let resizer = {
        let slot = Arc::clone(&slot);
        let received = Arc::clone(&received);
        thread::spawn(move || {
            let intr = Interrupt::new();
            let sizes = [256, 4096, 1024, 8192, 512];
            let mut i = 0;
            while received.load(Ordering::Relaxed) < total {
                match slot.resize(sizes[i % sizes.len()], &intr) {
                    Ok(_) | Err(SlotError::WouldTruncate) => {}
                    Err(err) => panic!("resize failed: {err}"),
                }
                i += 1;
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    let deadline = Instant::now() + Duration::from_secs(30);
    while received.load(Ordering::Relaxed) < total {
        assert!(Instant::now() < deadline, "records lost or threads stuck");
        assert!(parking_lot::deadlock::check_deadlock().is_empty());
        thread::sleep(Duration::from_millis(10));
    }
    stop.raise();
    slot.interrupt_waiters();

    resizer.join().unwrap();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(received.load(Ordering::SeqCst), total);
    assert_eq!(slot.stats().used, 0);
    assert!(checksum.load(Ordering::SeqCst) > 0);
}
