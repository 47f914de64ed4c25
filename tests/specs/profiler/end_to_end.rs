//! End-to-end query logging specs
//!
//! Drive a context from control file to JSONL line.

use crate::prelude::*;

const TS: u64 = 1_700_000_000_123_456;

#[test]
fn single_job_gets_exactly_one_line() {
    let dir = LogDir::empty();
    dir.control_file(r#"{"active_jobs":{"job-42":{}}}"#);
    let clock = FakeClock::new();
    clock.set_epoch_micros(TS);
    let mut ctx = dir.profiler(&clock).begin_context();

    ctx.record_query(&QueryEvent::new("SELECT 1").status(QueryStatus::Ok).duration_ms(1.5));

    similar_asserts::assert_eq!(
        dir.jsonl_text("job-42"),
        "{\"k\":\"job-42\",\"q\":\"SELECT 1\",\"s\":\"ok\",\"duration_ms\":1.500,\"ts\":1700000000.123456}\n"
    );
}

#[test]
fn pushed_tag_appears_in_line() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    ctx.tag("checkout").unwrap();
    ctx.record_query(&QueryEvent::new("SELECT 1").status(QueryStatus::Ok));

    let lines = dir.jsonl("job-42");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["tag"], "checkout");
}

#[test]
fn absent_control_file_creates_no_logs() {
    let dir = LogDir::empty();
    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    assert!(!ctx.is_any_active());
    for sql in ["SELECT 1", "UPDATE t SET x = 1", "DELETE FROM t"] {
        assert_eq!(ctx.record_query(&QueryEvent::new(sql)), RecordOutcome::Inactive);
    }

    assert!(dir.log_files().is_empty());
}

#[test]
fn every_active_job_receives_the_same_record() {
    let dir = LogDir::empty();
    dir.activate(&["import", "report", "audit"]);
    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    ctx.tag("nightly").unwrap();
    ctx.record_query(&QueryEvent::new("SELECT COUNT(*) FROM orders").params(r#"["7"]"#));

    let mut bodies = Vec::new();
    for key in ["import", "report", "audit"] {
        let mut line = dir.jsonl(key).remove(0);
        assert_eq!(line["k"], key);
        line.as_object_mut().unwrap().remove("k");
        bodies.push(line);
    }
    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(bodies[1], bodies[2]);
    assert_eq!(bodies[0]["params"], serde_json::json!(["7"]));
}

#[test]
fn profiled_client_logs_execute_with_params() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let clock = FakeClock::new();
    let mut ctx = dir.profiler(&clock).begin_context();
    let client = ScriptedExecutor::new().with_latency(clock, std::time::Duration::from_millis(3));
    let sql = "INSERT INTO payments (order_id, note) VALUES (?, ?)";
    let params = [qp_core::ParamValue::from(42i64), qp_core::ParamValue::from("paid \"in full\"")];

    let mut profiled = Profiled::new(client, &mut ctx);
    profiled.context().tag("checkout").unwrap();
    profiled.execute(&QueryCall::prepare(sql)).unwrap();
    profiled.execute(&QueryCall::execute(sql, &params)).unwrap();
    profiled.context().untag(Some("checkout"));
    profiled.execute(&QueryCall::query("COMMIT")).unwrap();

    let lines = dir.jsonl("job-42");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["q"], sql);
    assert_eq!(lines[0]["tag"], "checkout");
    assert_eq!(lines[0]["params"], serde_json::json!(["42", "paid \"in full\""]));
    assert_eq!(lines[0]["duration_ms"], 3.0);
    assert_eq!(lines[1]["q"], "COMMIT");
    assert!(lines[1].get("tag").is_none());
}

#[test]
fn disabled_profiler_ignores_active_jobs() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let config = ProfilerConfig { enabled: false, ..dir.config() };
    let mut ctx = Profiler::new(config).begin_context();

    assert_eq!(ctx.record_query(&QueryEvent::new("SELECT 1")), RecordOutcome::Disabled);
    assert!(dir.log_files().is_empty());
}
