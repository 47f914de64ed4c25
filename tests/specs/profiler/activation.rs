//! Job activation specs
//!
//! The control file is the only signal of which jobs are active.

use std::time::Duration;

use crate::prelude::*;

fn sorted_keys(ctx: &qp_engine::ExecutionContext<FakeClock>) -> Vec<String> {
    let mut keys: Vec<String> = ctx.active_job_keys().iter().map(|k| k.to_string()).collect();
    keys.sort();
    keys
}

#[test]
fn all_listed_keys_are_active() {
    for n in [1usize, 2, 17, 64] {
        let dir = LogDir::empty();
        let mut expected: Vec<String> = (0..n).map(|i| format!("job-{i}-{}", "x".repeat(i))).collect();
        let refs: Vec<&str> = expected.iter().map(String::as_str).collect();
        dir.activate(&refs);

        let ctx = dir.profiler(&FakeClock::new()).begin_context();

        expected.sort();
        assert_eq!(sorted_keys(&ctx), expected, "n = {n}");
    }
}

#[test]
fn deleted_control_file_means_no_jobs_on_next_refresh() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let clock = FakeClock::new();
    let mut ctx = dir.profiler(&clock).begin_context();
    assert!(ctx.is_any_active());

    dir.remove_control_file();
    clock.advance(Duration::from_secs(1));

    assert!(!ctx.is_any_active());
    assert!(ctx.active_job_keys().is_empty());
}

#[test]
fn new_jobs_are_seen_after_interval() {
    let dir = LogDir::empty();
    let clock = FakeClock::new();
    let mut ctx = dir.profiler(&clock).begin_context();
    assert!(!ctx.is_any_active());

    dir.activate(&["late"]);
    assert!(!ctx.is_any_active());

    clock.advance(Duration::from_secs(1));
    assert!(ctx.is_any_active());
    ctx.record_query(&QueryEvent::new("SELECT 1"));
    assert_eq!(dir.jsonl("late").len(), 1);
}

#[test]
fn partially_written_control_file_is_best_effort() {
    let dir = LogDir::empty();
    dir.control_file(r#"{"active_jobs":{"first":{"started_at":1},"second":{"start"#);

    let ctx = dir.profiler(&FakeClock::new()).begin_context();

    assert_eq!(sorted_keys(&ctx), vec!["first".to_string(), "second".to_string()]);
}

#[test]
fn finishing_last_job_deactivates_completed_ones() {
    let dir = LogDir::empty();
    dir.activate(&["job-1"]);
    let clock = FakeClock::new();
    let mut ctx = dir.profiler(&clock).begin_context();
    assert!(ctx.is_any_active());

    // The orchestrator rewrites an emptied set as an array.
    dir.control_file(
        "{\n    \"active_jobs\": [],\n    \"completed_jobs\": {\n        \"job-1\": {\"started_at\": 1700000000}\n    }\n}",
    );
    clock.advance(Duration::from_secs(1));

    assert!(!ctx.is_any_active());
    assert_eq!(ctx.record_query(&QueryEvent::new("SELECT 1")), RecordOutcome::Inactive);
    assert!(dir.jsonl("job-1").is_empty());
}

#[test]
fn garbage_control_file_means_no_jobs() {
    let dir = LogDir::empty();
    dir.control_file("not json at all");

    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    assert!(!ctx.is_any_active());
}

#[test]
fn new_context_rereads_control_file() {
    let dir = LogDir::empty();
    dir.activate(&["a"]);
    let clock = FakeClock::new();
    let profiler = dir.profiler(&clock);
    let first = profiler.begin_context();
    first.finish();

    dir.activate(&["b"]);
    let second = profiler.begin_context();

    assert_eq!(sorted_keys(&second), vec!["b".to_string()]);
}
