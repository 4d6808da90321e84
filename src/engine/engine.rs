use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::announce::announcement::{AnnouncementEvent, Trigger};
use crate::announce::template::build;
use crate::engine::error::NarrationError;
use crate::engine::lifecycle::{LifecyclePhase, PassContext, StepOutcome, step_screen};
use crate::engine::scheduler::{DEFAULT_SCAN_INTERVAL, ScanScheduler};
use crate::engine::visibility;
use crate::scene::scene_model::{SceneOverride, SceneQuery};
use crate::screen::screen_model::ScreenDescriptor;
use crate::speech::bridge::SpeechBridge;
use crate::speech::dispatcher::{DEFAULT_FAILURE_LIMIT, DispatchRecord, SpeechDispatcher};
use crate::state::normalize::snapshot_fingerprint;
use crate::state::sampler::sample;
use crate::state::state_model::ScreenSession;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub scan_interval: Duration,
    pub failure_limit: u32,
    pub auto_repeat: bool,
    pub visibility_override: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_interval: DEFAULT_SCAN_INTERVAL,
            failure_limit: DEFAULT_FAILURE_LIMIT,
            auto_repeat: false,
            visibility_override: true,
        }
    }
}

/// Requests the host forwards from key bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum HostAction {
    /// Speak the screen's current state now
    Announce { screen: String },

    /// Flip the screen's visibility override
    ToggleVisibility { screen: String },
}

/// Host key mapped to an action, e.g. `T` to announce the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    pub key: String,
    #[serde(flatten)]
    pub action: HostAction,
}

impl KeyBinding {
    pub fn new(key: &str, action: HostAction) -> Self {
        Self {
            key: key.to_string(),
            action,
        }
    }
}

/// Action bound to a key; keys compare case-insensitively.
pub fn resolve_binding<'a>(bindings: &'a [KeyBinding], key: &str) -> Result<&'a HostAction, NarrationError> {
    bindings
        .iter()
        .find(|b| b.key.eq_ignore_ascii_case(key))
        .map(|b| &b.action)
        .ok_or_else(|| NarrationError::UnknownBinding(key.to_string()))
}

struct ScreenSlot {
    descriptor: ScreenDescriptor,
    session: ScreenSession,
    throttle: Option<ScanScheduler>,
    visibility_on: bool,
}

/// Result of one host tick.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Pass number, when the scheduler allowed a pass
    pub pass: Option<u64>,
    pub transitions: Vec<(String, LifecyclePhase)>,
    pub records: Vec<DispatchRecord>,
}

impl TickReport {
    pub fn ran(&self) -> bool {
        self.pass.is_some()
    }

    pub fn spoken(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| r.outcome.is_delivered())
            .map(|r| r.text.as_str())
            .collect()
    }
}

/// Registry of screens plus the shared scheduler and dispatcher.
///
/// Screens run in registration order within a pass. Each owns its session;
/// nothing is shared between them except the read-only scene.
pub struct NarrationEngine<B: SpeechBridge> {
    config: EngineConfig,
    scheduler: ScanScheduler,
    clock: Duration,
    pass: u64,
    screens: Vec<ScreenSlot>,
    dispatcher: SpeechDispatcher<B>,
    tracer: TraceLogger,
}

impl<B: SpeechBridge> NarrationEngine<B> {
    pub fn new(config: EngineConfig, bridge: B) -> Self {
        Self {
            scheduler: ScanScheduler::new(config.scan_interval),
            dispatcher: SpeechDispatcher::new(bridge, config.failure_limit),
            clock: Duration::ZERO,
            pass: 0,
            screens: Vec::new(),
            tracer: TraceLogger::disabled(),
            config,
        }
    }

    pub fn with_tracer(mut self, tracer: TraceLogger) -> Self {
        self.tracer = tracer;
        self
    }

    /// Validate and add a screen. Loops in the descriptor are expanded here.
    pub fn register(&mut self, descriptor: ScreenDescriptor) -> Result<(), NarrationError> {
        let descriptor = descriptor.expanded();
        descriptor.validate()?;

        if self.slot(&descriptor.id).is_some() {
            return Err(NarrationError::DuplicateScreen(descriptor.id));
        }

        debug!(screen = %descriptor.id, elements = descriptor.elements.len(), "registered");
        self.screens.push(ScreenSlot {
            throttle: descriptor
                .scan_interval_ms
                .map(|ms| ScanScheduler::new(Duration::from_millis(ms))),
            descriptor,
            session: ScreenSession::default(),
            visibility_on: true,
        });
        Ok(())
    }

    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = ScreenDescriptor>,
    ) -> Result<(), NarrationError> {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(())
    }

    /// Host frame callback: accumulate time and run a pass when one is due.
    pub fn tick(&mut self, elapsed: Duration, scene: &dyn SceneQuery) -> TickReport {
        self.clock += elapsed;
        match self.scheduler.advance(elapsed) {
            Some(covered) => self.run_pass(covered, scene),
            None => TickReport::default(),
        }
    }

    /// Run every screen once, regardless of the engine scheduler.
    pub fn run_pass(&mut self, covered: Duration, scene: &dyn SceneQuery) -> TickReport {
        self.pass += 1;
        let mut report = TickReport {
            pass: Some(self.pass),
            ..TickReport::default()
        };

        for slot in self.screens.iter_mut() {
            let elapsed = match slot.throttle.as_mut() {
                Some(throttle) => match throttle.advance(covered) {
                    Some(elapsed) => elapsed,
                    None => continue,
                },
                None => covered,
            };

            let ctx = PassContext {
                now: self.clock,
                elapsed,
                auto_repeat: self.config.auto_repeat,
            };
            let step = step_screen(&slot.descriptor, &mut slot.session, scene, ctx);

            if step.phase != LifecyclePhase::Idle && step.phase != LifecyclePhase::Monitored {
                report.transitions.push((slot.descriptor.id.clone(), step.phase));
            }

            let records: Vec<DispatchRecord> = step
                .events
                .iter()
                .map(|event| self.dispatcher.dispatch(event, &mut slot.session.last_announced))
                .collect();

            trace_step(&self.tracer, self.pass, self.clock, &slot.descriptor.id, &step, &records);
            report.records.extend(records);
        }

        let mut announcing: Vec<&str> = report
            .records
            .iter()
            .filter(|r| r.outcome.is_delivered())
            .map(|r| r.screen.as_str())
            .collect();
        announcing.dedup();
        if announcing.len() > 1 {
            warn!(pass = self.pass, screens = ?announcing, "several screens announced in one pass");
        }

        report
    }

    /// Speak a screen's current state on request, bypassing deduplication.
    ///
    /// Returns `Ok(None)` when the screen is inactive or has nothing to say.
    pub fn announce_now(
        &mut self,
        screen: &str,
        scene: &dyn SceneQuery,
    ) -> Result<Option<DispatchRecord>, NarrationError> {
        let index = self
            .index_of(screen)
            .ok_or_else(|| NarrationError::UnknownScreen(screen.to_string()))?;
        let slot = &mut self.screens[index];

        if !slot.session.is_active() {
            debug!(screen, "announce requested for inactive screen");
            return Ok(None);
        }

        let snapshot = match sample(&slot.descriptor, scene) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(screen, error = %e, "sampling failed for manual announce");
                return Ok(None);
            }
        };

        let text = slot
            .descriptor
            .manual_template()
            .and_then(|template| build(template, &slot.descriptor, &snapshot, &[]));
        let Some(text) = text else {
            return Ok(None);
        };

        let event = AnnouncementEvent::new(screen, text, Trigger::Manual);
        let record = self
            .dispatcher
            .dispatch(&event, &mut slot.session.last_announced);
        self.tracer.log(
            &TraceEvent::now(self.pass, self.clock, screen, LifecyclePhase::Monitored)
                .with_fingerprint(Some(snapshot_fingerprint(&snapshot)))
                .with_dispatch(&record),
        );
        Ok(Some(record))
    }

    /// Apply a host action from a key binding.
    pub fn handle_action<S: SceneQuery + SceneOverride>(
        &mut self,
        action: &HostAction,
        scene: &mut S,
    ) -> Result<Option<DispatchRecord>, NarrationError> {
        match action {
            HostAction::Announce { screen } => self.announce_now(screen, &*scene),
            HostAction::ToggleVisibility { screen } => self.toggle_visibility(screen, scene),
        }
    }

    fn toggle_visibility(
        &mut self,
        screen: &str,
        scene: &mut dyn SceneOverride,
    ) -> Result<Option<DispatchRecord>, NarrationError> {
        let index = self
            .index_of(screen)
            .ok_or_else(|| NarrationError::UnknownScreen(screen.to_string()))?;

        if !self.config.visibility_override {
            debug!(screen, "visibility override disabled");
            return Ok(None);
        }

        let slot = &mut self.screens[index];
        let Some(spec) = slot.descriptor.visibility.as_ref() else {
            warn!(screen, "screen has no visibility override");
            return Ok(None);
        };

        slot.visibility_on = !slot.visibility_on;
        let text = if slot.visibility_on {
            visibility::enforce(spec, scene);
            format!("{} visible", spec.label)
        } else {
            visibility::hide(spec, scene);
            format!("{} hidden", spec.label)
        };
        info!(screen, visible = slot.visibility_on, "visibility override toggled");

        let event = AnnouncementEvent::new(screen, text, Trigger::Manual);
        Ok(Some(
            self.dispatcher
                .dispatch(&event, &mut slot.session.last_announced),
        ))
    }

    /// Raise faded graphics of active screens that have the override on.
    pub fn enforce_visibility(&self, scene: &mut dyn SceneOverride) -> usize {
        if !self.config.visibility_override {
            return 0;
        }
        self.screens
            .iter()
            .filter(|slot| slot.session.is_active() && slot.visibility_on)
            .filter_map(|slot| slot.descriptor.visibility.as_ref())
            .map(|spec| visibility::enforce(spec, &mut *scene))
            .sum()
    }

    pub fn session(&self, screen: &str) -> Option<&ScreenSession> {
        self.slot(screen).map(|slot| &slot.session)
    }

    pub fn descriptor(&self, screen: &str) -> Option<&ScreenDescriptor> {
        self.slot(screen).map(|slot| &slot.descriptor)
    }

    pub fn screen_ids(&self) -> Vec<&str> {
        self.screens.iter().map(|s| s.descriptor.id.as_str()).collect()
    }

    pub fn active_screens(&self) -> Vec<&str> {
        self.screens
            .iter()
            .filter(|s| s.session.is_active())
            .map(|s| s.descriptor.id.as_str())
            .collect()
    }

    pub fn bridge(&self) -> &B {
        self.dispatcher.bridge()
    }

    pub fn speech_available(&self) -> bool {
        self.dispatcher.is_available()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn pass_count(&self) -> u64 {
        self.pass
    }

    fn slot(&self, screen: &str) -> Option<&ScreenSlot> {
        self.screens.iter().find(|s| s.descriptor.id == screen)
    }

    fn index_of(&self, screen: &str) -> Option<usize> {
        self.screens.iter().position(|s| s.descriptor.id == screen)
    }
}

fn trace_step(
    tracer: &TraceLogger,
    pass: u64,
    clock: Duration,
    screen: &str,
    step: &StepOutcome,
    records: &[DispatchRecord],
) {
    if !tracer.is_enabled() || (step.phase == LifecyclePhase::Idle && step.error.is_none()) {
        return;
    }

    let base = || {
        TraceEvent::now(pass, clock, screen, step.phase)
            .with_fingerprint(step.fingerprint.clone())
            .with_changed(&step.changed)
    };

    if records.is_empty() {
        let mut event = base();
        if let Some(error) = &step.error {
            event = event.with_suppression(error);
        }
        tracer.log(&event);
        return;
    }

    for record in records {
        tracer.log(&base().with_dispatch(record));
    }
}
