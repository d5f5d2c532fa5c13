// In demos/hashed_records.rs
//
// A writer thread sends "n:sha256(message_n)" records through one channel while
// a blocking reader verifies every hash. The slot is resized half-way through.
// Ctrl+C interrupts the reader.
use mailslot::{OpenMode, SlotError, SlotTableBuilder};
use sha2::{Digest, Sha256};
use std::env;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

fn hash_of(i: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("message_{}", i).as_bytes());
    format!("{:x}", hasher.finalize())
}

fn main() -> io::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let num_messages: usize = args
        .get(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(1000);

    let table = SlotTableBuilder::new().with_max_slots(16).build()?;
    let reader = table.open(0, OpenMode::read_only())?;
    let writer = table.open(0, OpenMode::write_only())?;

    let interrupt = reader.interrupt().clone();
    ctrlc::set_handler(move || interrupt.raise()).expect("Error setting Ctrl+C handler");

    println!("Writer: Sending {} hashes through slot {}", num_messages, writer.channel_id());
    let producer = thread::spawn(move || -> io::Result<usize> {
        let mut sent = 0;
        for i in 0..num_messages {
            let message = format!("{}:{}", i, hash_of(i));
            loop {
                match writer.write(message.as_bytes()) {
                    Ok(_) => break,
                    // Slot full, retry
                    Err(e) if SlotError::from_io(&e) == Some(SlotError::InsufficientSpace) => {
                        thread::sleep(Duration::from_micros(10));
                    }
                    Err(e) => return Err(e),
                }
            }
            sent += 1;
            if i == num_messages / 2 {
                let capacity = writer.resize(16 * 1024)?;
                println!("Writer: Resized slot to {} bytes", capacity);
            }
        }
        Ok(sent)
    });

    let start = Instant::now();
    let mut buf = [0u8; 128];
    let mut received = 0;
    while received < num_messages {
        match reader.read(&mut buf) {
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]);
                let (index, hash) = text.split_once(':').ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "malformed record")
                })?;
                let index: usize = index
                    .parse()
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "bad index"))?;
                if index != received || hash != hash_of(index) {
                    eprintln!("Reader: Mismatch at record {}", received);
                    std::process::exit(1);
                }
                received += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                println!("Reader: Interrupted after {} records", received);
                std::process::exit(130);
            }
            Err(e) => return Err(e),
        }
    }

    let sent = producer
        .join()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "writer panicked"))??;
    let elapsed = start.elapsed();
    println!("Reader: Verified {} of {} records in {:.2?}", received, sent, elapsed);
    println!(
        "Reader: Throughput: {:.2} records/sec",
        received as f64 / elapsed.as_secs_f64()
    );
    println!("All messages received successfully");
    Ok(())
}
