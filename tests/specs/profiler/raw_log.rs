//! Human-readable log specs

use qp_core::{FakeStackWalker, RawFrame};

use crate::prelude::*;

/// Strip the leading `[timestamp] ` of an entry; local time varies by host.
fn without_timestamp(raw: &str) -> String {
    raw.lines()
        .map(|line| match line.strip_prefix('[') {
            Some(rest) if rest.len() > 25 && rest.as_bytes()[23] == b']' => rest[25..].to_string(),
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn raw_log_mirrors_structured_log() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let walker = FakeStackWalker::new(vec![
        RawFrame::method("OrderRepo", "save").at("src/orders/repo.rs", 88),
        RawFrame::function("handle_checkout").at("src/http/checkout.rs", 41),
    ]);
    let config = ProfilerConfig { trace_depth: 8, ..dir.config() };
    let mut ctx =
        Profiler::new(config).with_clock(FakeClock::new()).with_stack_walker(walker).begin_context();

    ctx.tag("checkout").unwrap();
    ctx.record_query(
        &QueryEvent::new("UPDATE orders SET state = 'paid' WHERE id = ?")
            .status(QueryStatus::Ok)
            .duration_ms(12.25)
            .params(r#"["42"]"#),
    );

    similar_asserts::assert_eq!(
        without_timestamp(&dir.raw_log("job-42")),
        [
            "[ok] [12.250ms] [checkout] UPDATE orders SET state = 'paid' WHERE id = ?",
            "  params: [\"42\"]",
            "  <- OrderRepo#save() src\\/orders\\/repo.rs:88",
            "  <- handle_checkout() src\\/http\\/checkout.rs:41",
        ]
        .join("\n")
    );
    let line = &dir.jsonl("job-42")[0];
    assert_eq!(line["trace"][0]["file"], "src/orders/repo.rs");
}

#[test]
fn raw_log_timestamp_has_millisecond_precision() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    ctx.record_query(&QueryEvent::new("SELECT 1"));

    let raw = dir.raw_log("job-42");
    let stamp = &raw[1..24];
    assert_eq!(raw.as_bytes()[24], b']', "{raw}");
    assert_eq!(stamp.len(), "2023-11-14 22:13:20.000".len());
    assert_eq!(&stamp[4..5], "-");
    assert_eq!(&stamp[10..11], " ");
    assert_eq!(&stamp[19..20], ".");
    assert!(raw.ends_with("] SELECT 1\n"));
}

#[test]
fn multiline_query_stays_on_one_line() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let mut ctx = dir.profiler(&FakeClock::new()).begin_context();

    ctx.record_query(&QueryEvent::new("SELECT *\nFROM t\n-- done"));

    assert_eq!(dir.raw_log("job-42").lines().count(), 1);
    assert_eq!(dir.jsonl("job-42")[0]["q"], "SELECT *\nFROM t\n-- done");
}

#[test]
fn raw_log_disabled_writes_only_jsonl() {
    let dir = LogDir::empty();
    dir.activate(&["job-42"]);
    let config = ProfilerConfig { raw_log: false, ..dir.config() };
    let mut ctx = Profiler::new(config).with_clock(FakeClock::new()).begin_context();

    ctx.record_query(&QueryEvent::new("SELECT 1"));

    assert_eq!(dir.log_files(), vec!["job-42.jsonl".to_string()]);
}
