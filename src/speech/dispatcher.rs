use serde::Serialize;
use tracing::{debug, info, warn};

use crate::announce::announcement::{AnnouncementEvent, Trigger};
use crate::speech::bridge::{SpeechBridge, SpeechStatus};

pub const DEFAULT_FAILURE_LIMIT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressReason {
    Empty,
    Duplicate,
}

/// What happened to one announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Handed to the screen reader successfully
    Spoken,
    /// Bridge unavailable; written to the log instead
    Logged,
    /// Bridge returned a non-success code
    Failed(i32),
    Suppressed(SuppressReason),
}

impl DispatchOutcome {
    pub fn is_delivered(self) -> bool {
        matches!(self, DispatchOutcome::Spoken | DispatchOutcome::Logged)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DispatchOutcome::Spoken => "spoken",
            DispatchOutcome::Logged => "logged",
            DispatchOutcome::Failed(_) => "failed",
            DispatchOutcome::Suppressed(_) => "suppressed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRecord {
    pub screen: String,
    pub text: String,
    pub trigger: Trigger,
    pub outcome: DispatchOutcome,
}

/// Forwards announcements to the speech bridge.
///
/// Readiness is probed once at construction. After `failure_limit`
/// consecutive failed speak calls the dispatcher stops calling the bridge
/// and only logs for the rest of the session.
pub struct SpeechDispatcher<B: SpeechBridge> {
    bridge: B,
    available: bool,
    consecutive_failures: u32,
    failure_limit: u32,
}

impl<B: SpeechBridge> SpeechDispatcher<B> {
    pub fn new(bridge: B, failure_limit: u32) -> Self {
        let available = bridge.is_ready();
        if available {
            info!("speech bridge ready");
        } else {
            warn!("speech bridge not available, announcements will be logged only");
        }

        Self {
            bridge,
            available,
            consecutive_failures: 0,
            failure_limit,
        }
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    /// Deliver one announcement, deduplicating against `last_announced`.
    ///
    /// The caller owns `last_announced` (one per screen session); it is
    /// updated whenever the text gets past the filters, even if the bridge
    /// then fails.
    pub fn dispatch(
        &mut self,
        event: &AnnouncementEvent,
        last_announced: &mut Option<String>,
    ) -> DispatchRecord {
        let text = event.text.trim();
        let outcome = if text.is_empty() {
            DispatchOutcome::Suppressed(SuppressReason::Empty)
        } else if !event.trigger.bypasses_dedupe() && last_announced.as_deref() == Some(text) {
            debug!(screen = %event.screen, text, "duplicate announcement suppressed");
            DispatchOutcome::Suppressed(SuppressReason::Duplicate)
        } else {
            *last_announced = Some(text.to_string());
            self.deliver(&event.screen, text)
        };

        DispatchRecord {
            screen: event.screen.clone(),
            text: text.to_string(),
            trigger: event.trigger,
            outcome,
        }
    }

    fn deliver(&mut self, screen: &str, text: &str) -> DispatchOutcome {
        if !self.available {
            info!(screen, text, "speech unavailable, would speak");
            return DispatchOutcome::Logged;
        }

        // Newest announcement wins; the result of cancel is not significant
        let _ = self.bridge.cancel();

        match self.bridge.speak(text) {
            SpeechStatus::Ok => {
                self.consecutive_failures = 0;
                info!(screen, text, "spoke");
                DispatchOutcome::Spoken
            }
            SpeechStatus::Failed(code) => {
                self.consecutive_failures += 1;
                warn!(screen, text, code, "speech bridge failed to speak");
                if self.failure_limit > 0 && self.consecutive_failures >= self.failure_limit {
                    warn!(
                        failures = self.consecutive_failures,
                        "speech bridge keeps failing, switching to log-only"
                    );
                    self.available = false;
                }
                DispatchOutcome::Failed(code)
            }
        }
    }
}
