//! Stack trace specs
//!
//! Traces start at the application frame that issued the query.

use qp_engine::ExecutionContext;

use crate::prelude::*;

#[inline(never)]
fn checkout_handler(ctx: &mut ExecutionContext<FakeClock>) -> RecordOutcome {
    ctx.record_query(&QueryEvent::new("SELECT 1"))
}

#[inline(never)]
fn load_cart(profiled: &mut Profiled<'_, ScriptedExecutor, FakeClock>) {
    profiled.execute(&QueryCall::query("SELECT * FROM carts")).unwrap();
}

fn traced_context(dir: &LogDir) -> ExecutionContext<FakeClock> {
    dir.activate(&["job-42"]);
    let config = ProfilerConfig { trace_depth: 3, ..dir.config() };
    Profiler::new(config).with_clock(FakeClock::new()).begin_context()
}

#[test]
fn direct_record_traces_from_calling_function() {
    let dir = LogDir::empty();
    let mut ctx = traced_context(&dir);

    checkout_handler(&mut ctx);

    let lines = dir.jsonl("job-42");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["trace"][0]["call"], "checkout_handler");
}

#[test]
fn profiled_call_traces_from_calling_function() {
    let dir = LogDir::empty();
    let mut ctx = traced_context(&dir);

    let mut profiled = Profiled::new(ScriptedExecutor::new(), &mut ctx);
    load_cart(&mut profiled);

    let lines = dir.jsonl("job-42");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["trace"][0]["call"], "load_cart");
}
