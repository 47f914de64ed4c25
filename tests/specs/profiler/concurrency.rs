//! Concurrent writer specs
//!
//! Independent writers appending to the same job must never interleave
//! partial lines.

use std::sync::{Arc, Barrier};
use std::thread;

use qp_core::{JobKey, LogRecord, QueryStatus};
use qp_engine::LogWriter;

use crate::prelude::*;

const WRITERS: usize = 8;
const RECORDS_PER_WRITER: usize = 200;

fn record(writer: usize, seq: usize) -> LogRecord {
    // Large payloads make torn writes likely if locking were missing.
    let padding = "x".repeat(2048 + writer * 97);
    LogRecord {
        query: format!("SELECT {writer}, {seq}, '{padding}'"),
        tag: Some(format!("writer-{writer}")),
        trace: None,
        params: Some(format!("[\"{seq}\"]")),
        status: Some(QueryStatus::Ok),
        duration_ms: Some(seq as f64 / 10.0),
        captured_at_micros: 1_700_000_000_000_000 + seq as u64,
    }
}

#[test]
fn concurrent_writers_produce_complete_lines() {
    let dir = LogDir::empty();
    std::fs::create_dir_all(dir.path()).unwrap();
    let jobs = vec![JobKey::parse("shared").unwrap(), JobKey::parse("other").unwrap()];
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|writer| {
            // Each thread owns its writer, as separate processes would.
            let log_writer = LogWriter::new(dir.path().to_path_buf(), true);
            let jobs = jobs.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for seq in 0..RECORDS_PER_WRITER {
                    let fan_out = log_writer.write_all(&jobs, &record(writer, seq));
                    assert_eq!(fan_out.failed, 0);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for key in ["shared", "other"] {
        let text = dir.jsonl_text(key);
        assert!(text.ends_with('\n'));
        let lines = dir.jsonl(key);
        assert_eq!(lines.len(), WRITERS * RECORDS_PER_WRITER);

        let mut seen = vec![0usize; WRITERS];
        for line in &lines {
            let tag = line["tag"].as_str().unwrap();
            let writer: usize = tag.trim_start_matches("writer-").parse().unwrap();
            assert!(line["q"].as_str().unwrap().starts_with(&format!("SELECT {writer}, ")));
            seen[writer] += 1;
        }
        assert!(seen.iter().all(|&n| n == RECORDS_PER_WRITER), "{seen:?}");

        let raw_entries = dir.raw_log(key).lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(raw_entries, WRITERS * RECORDS_PER_WRITER);
    }
}

#[test]
fn parallel_contexts_share_one_log_directory() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let config = dir.config();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let config = config.clone();
            thread::spawn(move || {
                let mut ctx = Profiler::new(config).begin_context();
                ctx.tag(&format!("worker-{worker}")).unwrap();
                for seq in 0..50 {
                    ctx.record_query(&QueryEvent::new(&format!("SELECT {seq}")));
                }
                ctx.finish();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let lines = dir.jsonl("job-42");
    assert_eq!(lines.len(), 200);
    for worker in 0..4 {
        let tag = format!("worker-{worker}");
        assert_eq!(lines.iter().filter(|l| l["tag"] == tag.as_str()).count(), 50);
    }
}
