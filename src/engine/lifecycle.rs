use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::announce::announcement::{AnnouncementEvent, Trigger};
use crate::announce::template::build;
use crate::scene::scene_model::{SceneError, SceneQuery};
use crate::screen::activation::is_active;
use crate::screen::screen_model::ScreenDescriptor;
use crate::state::diff::diff;
use crate::state::normalize::snapshot_fingerprint;
use crate::state::sampler::sample;
use crate::state::state_model::{ElementSnapshot, ScreenSession};

/// What a screen did during one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// Inactive and still inactive
    Idle,
    /// Inactive to active; Enter hook ran
    Entered,
    /// Active and still active; Monitor hook ran
    Monitored,
    /// Active to inactive; session was reset
    Exited,
}

/// Timing inputs for one screen step.
#[derive(Debug, Clone, Copy)]
pub struct PassContext {
    /// Narration clock at this pass
    pub now: Duration,
    /// Time covered since this screen last ran
    pub elapsed: Duration,
    pub auto_repeat: bool,
}

#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub phase: LifecyclePhase,
    pub events: Vec<AnnouncementEvent>,
    /// Narratable keys detected by the differ
    pub changed: Vec<String>,
    pub fingerprint: Option<String>,
    /// Scene error swallowed at this screen's boundary
    pub error: Option<SceneError>,
}

impl StepOutcome {
    fn new(phase: LifecyclePhase) -> Self {
        Self {
            phase,
            events: Vec::new(),
            changed: Vec::new(),
            fingerprint: None,
            error: None,
        }
    }
}

/// Advance one screen's state machine by one pass.
///
/// Never fails: scene errors while evaluating the activation predicate make
/// the screen inactive for this pass, and errors while sampling skip the
/// pass without touching the session.
pub fn step_screen(
    descriptor: &ScreenDescriptor,
    session: &mut ScreenSession,
    scene: &dyn SceneQuery,
    ctx: PassContext,
) -> StepOutcome {
    let mut error = None;
    let active = match is_active(descriptor, scene) {
        Ok(active) => active,
        Err(e) => {
            warn!(screen = %descriptor.id, error = %e, "activation check failed, treating as inactive");
            error = Some(e);
            false
        }
    };

    let mut outcome = match (session.is_active(), active) {
        (false, false) => StepOutcome::new(LifecyclePhase::Idle),
        (false, true) => enter(descriptor, session, scene, ctx),
        (true, true) => monitor(descriptor, session, scene, ctx),
        (true, false) => {
            debug!(screen = %descriptor.id, "exited");
            session.reset();
            StepOutcome::new(LifecyclePhase::Exited)
        }
    };

    if outcome.error.is_none() {
        outcome.error = error;
    }
    outcome
}

fn enter(
    descriptor: &ScreenDescriptor,
    session: &mut ScreenSession,
    scene: &dyn SceneQuery,
    ctx: PassContext,
) -> StepOutcome {
    debug!(screen = %descriptor.id, "entered");
    let mut outcome = StepOutcome::new(LifecyclePhase::Entered);

    session.begin(ctx.now);
    if descriptor.entry_template().is_none() {
        session.entry_announced = true;
    }

    let snapshot = match sample(descriptor, scene) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(screen = %descriptor.id, error = %e, "sampling failed on entry");
            outcome.error = Some(e);
            return outcome;
        }
    };

    if descriptor.entry_delay_duration().is_zero() {
        if let Some(event) = try_entry(descriptor, session, &snapshot, Trigger::Entry) {
            outcome.events.push(event);
        }
    }

    outcome.fingerprint = Some(snapshot_fingerprint(&snapshot));
    session.previous = Some(snapshot);
    outcome
}

fn monitor(
    descriptor: &ScreenDescriptor,
    session: &mut ScreenSession,
    scene: &dyn SceneQuery,
    ctx: PassContext,
) -> StepOutcome {
    let mut outcome = StepOutcome::new(LifecyclePhase::Monitored);

    let mut current = match sample(descriptor, scene) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(screen = %descriptor.id, error = %e, "sampling failed, skipping pass");
            outcome.error = Some(e);
            return outcome;
        }
    };

    let changes = diff(descriptor, session.previous.as_ref(), &current);
    outcome.changed = changes
        .rising
        .iter()
        .chain(changes.text_changed.iter())
        .cloned()
        .collect();

    let delay = descriptor.entry_delay_duration();
    if session.entry_due(ctx.now, delay) {
        let trigger = if delay.is_zero() {
            Trigger::Entry
        } else {
            Trigger::Delayed
        };
        if let Some(event) = try_entry(descriptor, session, &current, trigger) {
            outcome.events.push(event);
        }
    } else if session.entry_announced && changes.is_narratable() {
        let text = descriptor
            .on_change
            .as_ref()
            .and_then(|template| build(template, descriptor, &current, &changes.rising));
        if let Some(text) = text {
            let trigger = if changes.rising.is_empty() {
                Trigger::TextChange
            } else {
                Trigger::Edge
            };
            outcome
                .events
                .push(AnnouncementEvent::new(&descriptor.id, text, trigger));
        }
    }

    if let Some(repeat) = descriptor.repeat.as_ref().filter(|_| ctx.auto_repeat) {
        session.since_repeat += ctx.elapsed;
        let every = Duration::from_millis(repeat.every_ms);
        if session.entry_announced && session.since_repeat >= every {
            session.since_repeat = Duration::ZERO;
            if outcome.events.is_empty() {
                if let Some(text) = build(&repeat.template, descriptor, &current, &[]) {
                    outcome
                        .events
                        .push(AnnouncementEvent::new(&descriptor.id, text, Trigger::Repeat));
                }
            }
        }
    }

    outcome.fingerprint = Some(snapshot_fingerprint(&current));
    if let Some(previous) = session.previous.as_ref() {
        current.carry_text_from(previous);
    }
    session.previous = Some(current);
    outcome
}

/// Build the entry announcement; marks the session only when text came out.
fn try_entry(
    descriptor: &ScreenDescriptor,
    session: &mut ScreenSession,
    snapshot: &ElementSnapshot,
    trigger: Trigger,
) -> Option<AnnouncementEvent> {
    let template = descriptor.entry_template()?;
    let text = build(template, descriptor, snapshot, &[])?;
    session.entry_announced = true;
    Some(AnnouncementEvent::new(&descriptor.id, text, trigger))
}
