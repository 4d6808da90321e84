use std::time::Duration;

use screen_narrator::announce::announcement::Trigger;
use screen_narrator::engine::lifecycle::LifecyclePhase;
use screen_narrator::speech::dispatcher::{DispatchOutcome, DispatchRecord, SuppressReason};
use screen_narrator::trace::logger::TraceLogger;
use screen_narrator::trace::trace::TraceEvent;

fn record(outcome: DispatchOutcome) -> DispatchRecord {
    DispatchRecord {
        screen: "question".into(),
        text: "B, Mars".into(),
        trigger: Trigger::Edge,
        outcome,
    }
}

#[test]
fn test_trace_logger_appends_jsonl() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("trace.jsonl");
    let path = path.to_str().unwrap();

    let logger = TraceLogger::create(path).unwrap();
    assert!(logger.is_enabled());
    logger.log(
        &TraceEvent::now(3, Duration::from_millis(450), "question", LifecyclePhase::Monitored)
            .with_changed(&["focus_B".to_string()])
            .with_dispatch(&record(DispatchOutcome::Spoken)),
    );
    logger.log(&TraceEvent::now(4, Duration::from_millis(600), "question", LifecyclePhase::Exited));

    let content = std::fs::read_to_string(path).unwrap();
    let lines: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["clock_ms"], 450);
    assert_eq!(lines[0]["changed"][0], "focus_B");
    assert_eq!(lines[0]["trigger"], "edge");
    assert_eq!(lines[0]["outcome"], "spoken");
    assert!(lines[0]["suppression_reason"].is_null());
    assert_eq!(lines[1]["phase"], "exited");
}

#[test]
fn test_trace_suppression_reasons() {
    let event = TraceEvent::now(1, Duration::ZERO, "menu", LifecyclePhase::Monitored)
        .with_dispatch(&record(DispatchOutcome::Suppressed(SuppressReason::Duplicate)));
    assert_eq!(event.outcome.as_deref(), Some("suppressed"));
    assert_eq!(event.suppression_reason.as_deref(), Some("duplicate"));

    let event = TraceEvent::now(1, Duration::ZERO, "menu", LifecyclePhase::Monitored)
        .with_dispatch(&record(DispatchOutcome::Failed(7)));
    assert_eq!(event.suppression_reason.as_deref(), Some("bridge code 7"));
}

#[test]
fn test_trace_unwritable_path_disables() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("missing_dir").join("trace.jsonl");

    assert!(TraceLogger::create(path.to_str().unwrap()).is_err());

    let logger = TraceLogger::open_or_disabled(path.to_str().unwrap());
    assert!(!logger.is_enabled());
    logger.log(&TraceEvent::now(1, Duration::ZERO, "menu", LifecyclePhase::Entered));
}
