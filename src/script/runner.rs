use std::time::Duration;

use tracing::debug;

use crate::engine::engine::{EngineConfig, KeyBinding, NarrationEngine, resolve_binding};
use crate::engine::error::NarrationError;
use crate::scene::memory::{MemoryScene, SceneNodeSpec};
use crate::scene::scene_model::SceneOverride;
use crate::screen::screen_model::ScreenDescriptor;
use crate::script::context::ScenarioContext;
use crate::script::scenario_model::{ExpectationResult, Scenario, ScenarioResult, ScenarioStep};
use crate::speech::bridge::RecordingBridge;
use crate::trace::logger::TraceLogger;

/// Drives the engine through a [`Scenario`] with an in-memory scene and a
/// recording speech bridge.
pub struct ScenarioRunner<'a> {
    descriptors: &'a [ScreenDescriptor],
    config: EngineConfig,
    bindings: &'a [KeyBinding],
    trace_path: Option<String>,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(descriptors: &'a [ScreenDescriptor], config: EngineConfig, bindings: &'a [KeyBinding]) -> Self {
        Self {
            descriptors,
            config,
            bindings,
            trace_path: None,
        }
    }

    /// Append every scenario's narration trace to a JSONL file.
    pub fn with_trace(mut self, path: &str) -> Self {
        self.trace_path = Some(path.to_string());
        self
    }

    /// Run a scenario to completion.
    ///
    /// A step that cannot be executed (unknown screen, unbound key) stops
    /// the run and is reported as the result's error.
    pub fn run(&self, scenario: &Scenario) -> ScenarioResult {
        let mut ctx = ScenarioContext::new();

        let mut engine = match self.build_engine(scenario) {
            Ok(engine) => engine,
            Err(e) => {
                return ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: 0,
                    expectation_results: ctx.expectation_results,
                    spoken: ctx.spoken,
                    error: Some(format!("Failed to set up engine: {}", e)),
                };
            }
        };
        let mut scene = MemoryScene::from_specs(&scenario.scene);
        let frame = Duration::from_millis(scenario.frame_ms.max(1));

        for (i, step) in scenario.steps.iter().enumerate() {
            ctx.current_step = i;

            if let Err(e) = Self::execute_step(step, i, frame, &mut engine, &mut scene, self.bindings, &mut ctx) {
                return ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: i + 1,
                    expectation_results: ctx.expectation_results,
                    spoken: ctx.spoken,
                    error: Some(format!("Step {} failed: {}", i, e)),
                };
            }
        }

        ScenarioResult {
            name: scenario.name.clone(),
            passed: ctx.all_passed(),
            steps_run: scenario.steps.len(),
            expectation_results: ctx.expectation_results,
            spoken: ctx.spoken,
            error: None,
        }
    }

    fn build_engine(&self, scenario: &Scenario) -> Result<NarrationEngine<RecordingBridge>, NarrationError> {
        let mut config = self.config.clone();
        if let Some(auto_repeat) = scenario.auto_repeat {
            config.auto_repeat = auto_repeat;
        }

        let tracer = match self.trace_path.as_deref() {
            Some(path) => TraceLogger::open_or_disabled(path),
            None => TraceLogger::disabled(),
        };
        let mut engine = NarrationEngine::new(config, RecordingBridge::ready()).with_tracer(tracer);
        if scenario.screens.is_empty() {
            engine.register_all(self.descriptors.iter().cloned())?;
            return Ok(engine);
        }

        for id in &scenario.screens {
            let descriptor = self
                .descriptors
                .iter()
                .find(|d| &d.id == id)
                .ok_or_else(|| NarrationError::UnknownScreen(id.clone()))?;
            engine.register(descriptor.clone())?;
        }
        Ok(engine)
    }

    fn execute_step(
        step: &ScenarioStep,
        step_index: usize,
        frame: Duration,
        engine: &mut NarrationEngine<RecordingBridge>,
        scene: &mut MemoryScene,
        bindings: &[KeyBinding],
        ctx: &mut ScenarioContext,
    ) -> Result<(), NarrationError> {
        match step {
            ScenarioStep::Set {
                path,
                active,
                enabled,
                text,
                opacity,
            } => {
                scene.apply(&SceneNodeSpec {
                    path: path.clone(),
                    active: active.unwrap_or(true),
                    enabled: *enabled,
                    text: text.clone(),
                    opacity: *opacity,
                });
                Ok(())
            }

            ScenarioStep::Remove { path } => {
                scene.remove(path);
                Ok(())
            }

            ScenarioStep::Fail { path } => {
                scene.fail(path);
                Ok(())
            }

            ScenarioStep::Recover { path } => {
                scene.recover(path);
                Ok(())
            }

            ScenarioStep::Advance { ms } => {
                let mut remaining = Duration::from_millis(*ms);
                while !remaining.is_zero() {
                    let elapsed = remaining.min(frame);
                    remaining -= elapsed;

                    let report = engine.tick(elapsed, &*scene);
                    for text in report.spoken() {
                        ctx.record_spoken(text);
                    }
                    engine.enforce_visibility(scene);
                }
                Ok(())
            }

            ScenarioStep::Press { key } => {
                let action = resolve_binding(bindings, key)?;
                debug!(key = %key, ?action, "key pressed");
                if let Some(record) = engine.handle_action(action, scene)? {
                    if record.outcome.is_delivered() {
                        ctx.record_spoken(&record.text);
                    }
                }
                Ok(())
            }

            ScenarioStep::ExpectSpoken { text } => {
                let pending = ctx.take_pending();
                let passed = pending.iter().any(|t| t == text);
                ctx.record(ExpectationResult {
                    step_index,
                    expectation: step.clone(),
                    passed,
                    actual: Some(pending.join(" | ")),
                    message: if passed {
                        None
                    } else {
                        Some(format!("'{}' was not spoken", text))
                    },
                });
                Ok(())
            }

            ScenarioStep::ExpectSilent => {
                let pending = ctx.take_pending();
                let passed = pending.is_empty();
                ctx.record(ExpectationResult {
                    step_index,
                    expectation: step.clone(),
                    passed,
                    actual: Some(pending.join(" | ")),
                    message: if passed {
                        None
                    } else {
                        Some(format!("expected silence, heard {} announcement(s)", pending.len()))
                    },
                });
                Ok(())
            }

            ScenarioStep::ExpectActive { screen, active } => {
                let session = engine
                    .session(screen)
                    .ok_or_else(|| NarrationError::UnknownScreen(screen.clone()))?;
                let actual = session.is_active();
                let passed = actual == *active;
                ctx.record(ExpectationResult {
                    step_index,
                    expectation: step.clone(),
                    passed,
                    actual: Some(actual.to_string()),
                    message: if passed {
                        None
                    } else {
                        Some(format!("screen '{}' active = {}", screen, actual))
                    },
                });
                Ok(())
            }

            ScenarioStep::ExpectOpacity { path, at_least } => {
                let actual = scene.opacity(path);
                let passed = actual.map_or(false, |o| o >= *at_least);
                ctx.record(ExpectationResult {
                    step_index,
                    expectation: step.clone(),
                    passed,
                    actual: actual.map(|o| o.to_string()),
                    message: if passed {
                        None
                    } else {
                        Some(format!("opacity of '{}' below {}", path, at_least))
                    },
                });
                Ok(())
            }
        }
    }
}
