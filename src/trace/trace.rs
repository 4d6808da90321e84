use serde::Serialize;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::engine::lifecycle::LifecyclePhase;
use crate::speech::dispatcher::{DispatchOutcome, DispatchRecord};

/// One line of the JSONL narration trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,

    /// Narration clock, i.e. accumulated host tick time
    pub clock_ms: u128,
    pub pass: u64,

    pub screen: String,
    pub phase: LifecyclePhase,

    pub fingerprint: Option<String>,
    pub changed: Vec<String>,

    pub announcement: Option<String>,
    pub trigger: Option<String>,
    pub outcome: Option<String>,
    pub suppression_reason: Option<String>,
}

impl TraceEvent {
    pub fn now(pass: u64, clock: Duration, screen: &str, phase: LifecyclePhase) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis(),
            clock_ms: clock.as_millis(),
            pass,
            screen: screen.to_string(),
            phase,
            fingerprint: None,
            changed: vec![],
            announcement: None,
            trigger: None,
            outcome: None,
            suppression_reason: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.fingerprint = fingerprint;
        self
    }

    pub fn with_changed(mut self, changed: &[String]) -> Self {
        self.changed = changed.to_vec();
        self
    }

    pub fn with_dispatch(mut self, record: &DispatchRecord) -> Self {
        self.announcement = Some(record.text.clone());
        self.trigger = Some(record.trigger.as_str().to_string());
        self.outcome = Some(record.outcome.as_str().to_string());
        match record.outcome {
            DispatchOutcome::Suppressed(reason) => {
                self = self.with_suppression(format!("{:?}", reason).to_lowercase());
            }
            DispatchOutcome::Failed(code) => {
                self = self.with_suppression(format!("bridge code {}", code));
            }
            DispatchOutcome::Spoken | DispatchOutcome::Logged => {}
        }
        self
    }

    pub fn with_suppression(mut self, reason: impl ToString) -> Self {
        self.suppression_reason = Some(reason.to_string());
        self
    }
}
