mod common;

use screen_narrator::announce::announcement::Trigger;
use screen_narrator::announce::template::Template;
use screen_narrator::engine::engine::{
    EngineConfig, HostAction, KeyBinding, NarrationEngine, resolve_binding,
};
use screen_narrator::engine::error::NarrationError;
use screen_narrator::engine::lifecycle::LifecyclePhase;
use screen_narrator::scene::memory::{MemoryScene, SceneNode};
use screen_narrator::scene::scene_model::SceneOverride;
use screen_narrator::screen::screen_model::{
    ActivationCondition, ElementSpec, OpacityTarget, ScreenDescriptor, VisibilitySpec,
};
use screen_narrator::speech::bridge::RecordingBridge;
use screen_narrator::speech::dispatcher::DispatchOutcome;
use screen_narrator::state::state_model::ScreenSession;

use crate::common::fixtures::{
    audience_scene, audience_screen, config, engine_with, focus, menu_scene, menu_screen, ms,
    question_screen, result_screen, run_ticks,
};

// =========================================================================
// Helpers
// =========================================================================

fn timer_screen() -> ScreenDescriptor {
    ScreenDescriptor::new("timer")
        .require(ActivationCondition::active("Timer"))
        .require(ActivationCondition::NumberAbove {
            path: "Timer/Text".into(),
            min: 0,
        })
        .element(ElementSpec::text("seconds", "Timer/Text").context())
        .on_enter(Template::format("Timer started, {seconds} seconds"))
        .repeat(ms(5000), Template::format("{seconds} seconds"))
        .visibility(VisibilitySpec {
            label: "Timer".into(),
            min_opacity: 0.5,
            targets: vec![OpacityTarget {
                path: "Timer/Fill".into(),
                opacity: 1.0,
            }],
        })
}

fn timer_scene(seconds: &str) -> MemoryScene {
    let mut scene = MemoryScene::new()
        .with_active("Timer")
        .with_text("Timer/Text", seconds);
    scene.insert(
        "Timer/Fill",
        SceneNode {
            active: true,
            opacity: Some(0.2),
            ..SceneNode::default()
        },
    );
    scene
}

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn test_entry_then_focus_change() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let mut scene = menu_scene("Play");

    let report = engine.tick(ms(100), &scene);
    assert!(report.ran());
    assert_eq!(report.transitions, vec![("menu".to_string(), LifecyclePhase::Entered)]);
    assert_eq!(report.spoken(), vec!["Play, 3 items"]);
    assert_eq!(report.records[0].trigger, Trigger::Entry);

    focus(&mut scene, "Shop");
    let report = engine.tick(ms(100), &scene);
    assert_eq!(report.spoken(), vec!["Shop"]);
    assert_eq!(report.records[0].trigger, Trigger::Edge);
}

#[test]
fn test_no_pass_before_interval() {
    let mut engine = engine_with(config(150), vec![menu_screen()]);
    let scene = menu_scene("Play");

    assert!(!engine.tick(ms(50), &scene).ran());
    assert!(!engine.tick(ms(50), &scene).ran());
    assert!(engine.tick(ms(50), &scene).ran());
    assert_eq!(engine.pass_count(), 1);
    assert_eq!(engine.clock(), ms(150));
}

#[test]
fn test_identical_snapshots_dispatch_at_most_once() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let scene = menu_scene("Play");

    let spoken = run_ticks(&mut engine, &scene, 20, 100);

    assert_eq!(spoken, vec!["Play, 3 items".to_string()]);
    assert_eq!(engine.bridge().spoken().len(), 1);
}

#[test]
fn test_only_rising_toggles_announce() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let mut scene = menu_scene("Play");
    run_ticks(&mut engine, &scene, 1, 100);

    focus(&mut scene, "Shop");
    assert_eq!(run_ticks(&mut engine, &scene, 1, 100), vec!["Shop".to_string()]);

    // Highlight leaves: true -> false only
    focus(&mut scene, "");
    assert!(run_ticks(&mut engine, &scene, 3, 100).is_empty());

    // Same item again is a new edge, spoken despite matching the last text
    focus(&mut scene, "Shop");
    assert_eq!(run_ticks(&mut engine, &scene, 1, 100), vec!["Shop".to_string()]);
}

#[test]
fn test_exit_resets_session() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let mut scene = menu_scene("Play");

    run_ticks(&mut engine, &scene, 5, 100);
    assert!(engine.session("menu").unwrap().is_active());
    assert_eq!(engine.active_screens(), vec!["menu"]);

    scene.set_active("Menu", false);
    let report = engine.tick(ms(100), &scene);

    assert_eq!(report.transitions, vec![("menu".to_string(), LifecyclePhase::Exited)]);
    assert_eq!(engine.session("menu"), Some(&ScreenSession::default()));
    assert!(engine.active_screens().is_empty());

    // Coming back is a fresh entry
    scene.set_active("Menu", true);
    assert_eq!(run_ticks(&mut engine, &scene, 1, 100), vec!["Play, 3 items".to_string()]);
}

#[test]
fn test_activation_error_exits_screen() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let mut scene = menu_scene("Play");
    run_ticks(&mut engine, &scene, 2, 100);

    scene.fail("Menu");
    let report = engine.tick(ms(100), &scene);
    assert_eq!(report.transitions, vec![("menu".to_string(), LifecyclePhase::Exited)]);
    assert_eq!(engine.session("menu"), Some(&ScreenSession::default()));

    scene.recover("Menu");
    assert_eq!(run_ticks(&mut engine, &scene, 1, 100), vec!["Play, 3 items".to_string()]);
}

#[test]
fn test_sampling_error_skips_pass() {
    let mut engine = engine_with(config(100), vec![menu_screen()]);
    let mut scene = menu_scene("Play");
    run_ticks(&mut engine, &scene, 1, 100);
    let before = engine.session("menu").unwrap().clone();

    scene.fail("Menu/Exit");
    focus(&mut scene, "Shop");
    assert!(run_ticks(&mut engine, &scene, 2, 100).is_empty());
    assert_eq!(engine.session("menu"), Some(&before));

    scene.recover("Menu/Exit");
    assert_eq!(run_ticks(&mut engine, &scene, 1, 100), vec!["Shop".to_string()]);
}

// =========================================================================
// Entry announcements
// =========================================================================

#[test]
fn test_audience_entry_announces_highest() {
    let mut engine = engine_with(config(150), vec![audience_screen()]);
    let scene = audience_scene(["10%", "15%", "60%", "15%"]);

    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 150),
        vec!["Audience says: C, 60 percent".to_string()]
    );
}

#[test]
fn test_audience_placeholder_values_wait_for_results() {
    let mut engine = engine_with(config(150), vec![audience_screen()]);
    let mut scene = audience_scene(["100%", "100%", "100%", "100%"]);

    assert!(run_ticks(&mut engine, &scene, 4, 150).is_empty());
    assert!(engine.session("audience").unwrap().is_active());

    for (letter, vote) in ["A", "B", "C", "D"].iter().zip(["10%", "15%", "60%", "15%"]) {
        scene.set_text(&format!("Poll/Column_{}/Value", letter), vote);
    }
    let report = engine.tick(ms(150), &scene);
    assert_eq!(report.spoken(), vec!["Audience says: C, 60 percent"]);
    assert_eq!(report.records[0].trigger, Trigger::Entry);
}

#[test]
fn test_delayed_entry_fires_once_after_delay() {
    let mut engine = engine_with(config(500), vec![result_screen(2000)]);
    let scene = MemoryScene::new()
        .with_active("Gain")
        .with_text("Gain/Amount", "32 000");

    // Activated at 0.5s; nothing before 2s have passed since
    for _ in 0..4 {
        let report = engine.tick(ms(500), &scene);
        assert!(report.records.is_empty(), "early dispatch at {:?}", engine.clock());
    }

    let report = engine.tick(ms(500), &scene);
    assert_eq!(engine.clock(), ms(2500));
    assert_eq!(report.spoken(), vec!["Total earnings: 32 000"]);
    assert_eq!(report.records[0].trigger, Trigger::Delayed);

    assert!(run_ticks(&mut engine, &scene, 10, 500).is_empty());
}

#[test]
fn test_delayed_entry_cancelled_by_exit() {
    let mut engine = engine_with(config(500), vec![result_screen(2000)]);
    let mut scene = MemoryScene::new()
        .with_active("Gain")
        .with_text("Gain/Amount", "32 000");

    run_ticks(&mut engine, &scene, 2, 500);
    scene.set_active("Gain", false);
    run_ticks(&mut engine, &scene, 1, 500);
    scene.set_active("Gain", true);

    // Re-entered at 2.0s: the delay starts over
    assert!(run_ticks(&mut engine, &scene, 4, 500).is_empty());
    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 500),
        vec!["Total earnings: 32 000".to_string()]
    );
}

#[test]
fn test_text_flicker_is_not_a_change() {
    let quiz = ScreenDescriptor::new("quiz")
        .require(ActivationCondition::active("Q"))
        .element(ElementSpec::text("q", "Q/Text"))
        .on_enter(Template::format("Question: {q}"))
        .on_change(Template::format("{q}"));
    let mut engine = engine_with(config(100), vec![quiz]);
    let mut scene = MemoryScene::new()
        .with_active("Q")
        .with_text("Q/Text", "Capital of France?");

    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 100),
        vec!["Question: Capital of France?".to_string()]
    );

    // Text drops out for a pass, then returns unchanged
    scene.set_active("Q/Text", false);
    assert!(run_ticks(&mut engine, &scene, 1, 100).is_empty());
    scene.set_active("Q/Text", true);
    assert!(run_ticks(&mut engine, &scene, 3, 100).is_empty());

    // A real change after the gap is still spoken
    scene.set_active("Q/Text", false);
    run_ticks(&mut engine, &scene, 1, 100);
    scene.set_text("Q/Text", "Capital of Spain?");
    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 100),
        vec!["Capital of Spain?".to_string()]
    );
}

#[test]
fn test_placeholder_text_never_announced() {
    let mut engine = engine_with(config(100), vec![question_screen()]);
    let mut scene = MemoryScene::new()
        .with_active("Quiz")
        .with_text("Quiz/Question", "Question");

    let mut spoken = run_ticks(&mut engine, &scene, 3, 100);
    assert!(spoken.is_empty());

    scene.set_text("Quiz/Category", "Science");
    spoken.extend(run_ticks(&mut engine, &scene, 2, 100));
    assert!(spoken.is_empty());

    scene.set_text("Quiz/Question", "What is 2+2?");
    spoken.extend(run_ticks(&mut engine, &scene, 1, 100));
    assert_eq!(spoken, vec!["What is 2+2?".to_string()]);

    scene.set_text("Quiz/Question", "Question");
    scene.set_text("Quiz/Category", "History");
    spoken.extend(run_ticks(&mut engine, &scene, 3, 100));

    assert!(!spoken.iter().any(|text| text.contains("Question")));
    assert_eq!(spoken.len(), 1);
}

// =========================================================================
// Repeat, manual announce and visibility
// =========================================================================

#[test]
fn test_auto_repeat_after_interval() {
    let config = EngineConfig {
        auto_repeat: true,
        ..config(500)
    };
    let mut engine = engine_with(config, vec![timer_screen()]);
    let mut scene = timer_scene("30");

    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 500),
        vec!["Timer started, 30 seconds".to_string()]
    );

    // Context-only element: countdown itself is silent
    scene.set_text("Timer/Text", "25");
    assert!(run_ticks(&mut engine, &scene, 9, 500).is_empty());

    let report = engine.tick(ms(500), &scene);
    assert_eq!(report.spoken(), vec!["25 seconds"]);
    assert_eq!(report.records[0].trigger, Trigger::Repeat);
}

#[test]
fn test_no_repeat_when_disabled() {
    let mut engine = engine_with(config(500), vec![timer_screen()]);
    let scene = timer_scene("30");

    let spoken = run_ticks(&mut engine, &scene, 30, 500);
    assert_eq!(spoken, vec!["Timer started, 30 seconds".to_string()]);
}

#[test]
fn test_manual_announce_bypasses_dedupe() {
    let mut engine = engine_with(config(500), vec![timer_screen(), menu_screen()]);
    let scene = timer_scene("12");
    run_ticks(&mut engine, &scene, 1, 500);

    for _ in 0..2 {
        let record = engine.announce_now("timer", &scene).unwrap().unwrap();
        assert_eq!(record.text, "12 seconds");
        assert_eq!(record.trigger, Trigger::Manual);
        assert_eq!(record.outcome, DispatchOutcome::Spoken);
    }

    // Inactive screen has nothing to say
    assert!(engine.announce_now("menu", &scene).unwrap().is_none());

    assert!(matches!(
        engine.announce_now("nope", &scene),
        Err(NarrationError::UnknownScreen(_))
    ));
}

#[test]
fn test_visibility_override() {
    let mut engine = engine_with(config(500), vec![timer_screen()]);
    let mut scene = timer_scene("30");

    // Inactive screens are left alone
    assert_eq!(engine.enforce_visibility(&mut scene), 0);

    run_ticks(&mut engine, &scene, 1, 500);
    assert_eq!(engine.enforce_visibility(&mut scene), 1);
    assert_eq!(scene.opacity("Timer/Fill"), Some(1.0));

    let toggle = HostAction::ToggleVisibility {
        screen: "timer".into(),
    };
    let record = engine.handle_action(&toggle, &mut scene).unwrap().unwrap();
    assert_eq!(record.text, "Timer hidden");
    assert_eq!(scene.opacity("Timer/Fill"), Some(0.0));
    assert_eq!(engine.enforce_visibility(&mut scene), 0);

    let record = engine.handle_action(&toggle, &mut scene).unwrap().unwrap();
    assert_eq!(record.text, "Timer visible");
    assert_eq!(scene.opacity("Timer/Fill"), Some(1.0));
}

#[test]
fn test_visibility_override_disabled() {
    let config = EngineConfig {
        visibility_override: false,
        ..config(500)
    };
    let mut engine = engine_with(config, vec![timer_screen()]);
    let mut scene = timer_scene("30");
    run_ticks(&mut engine, &scene, 1, 500);

    assert_eq!(engine.enforce_visibility(&mut scene), 0);
    let toggle = HostAction::ToggleVisibility {
        screen: "timer".into(),
    };
    assert!(engine.handle_action(&toggle, &mut scene).unwrap().is_none());
    assert_eq!(scene.opacity("Timer/Fill"), Some(0.2));
}

#[test]
fn test_resolve_binding() {
    let bindings = vec![
        KeyBinding::new(
            "T",
            HostAction::Announce {
                screen: "timer".into(),
            },
        ),
        KeyBinding::new(
            "V",
            HostAction::ToggleVisibility {
                screen: "timer".into(),
            },
        ),
    ];

    assert_eq!(
        resolve_binding(&bindings, "t").unwrap(),
        &HostAction::Announce {
            screen: "timer".into()
        }
    );
    assert!(matches!(
        resolve_binding(&bindings, "X"),
        Err(NarrationError::UnknownBinding(_))
    ));
}

// =========================================================================
// Registry and dispatch wiring
// =========================================================================

#[test]
fn test_register_rejects_duplicates_and_invalid() {
    let mut engine = NarrationEngine::new(EngineConfig::default(), RecordingBridge::ready());
    engine.register(menu_screen()).unwrap();

    assert!(matches!(
        engine.register(menu_screen()),
        Err(NarrationError::DuplicateScreen(_))
    ));

    let no_activation = ScreenDescriptor::new("broken").on_enter(Template::format("hello"));
    assert!(matches!(
        engine.register(no_activation),
        Err(NarrationError::InvalidDescriptor { .. })
    ));

    let unknown_key = ScreenDescriptor::new("broken")
        .require(ActivationCondition::active("X"))
        .on_enter(Template::format("{missing}"));
    assert!(engine.register(unknown_key).is_err());

    let zero_interval = ScreenDescriptor::new("broken")
        .require(ActivationCondition::active("X"))
        .on_enter(Template::format("hello"))
        .scan_interval(ms(0));
    assert!(matches!(
        engine.register(zero_interval),
        Err(NarrationError::InvalidDescriptor { .. })
    ));

    assert_eq!(engine.screen_ids(), vec!["menu"]);
}

#[test]
fn test_overlapping_screens_both_dispatch() {
    let mut engine = engine_with(config(150), vec![menu_screen(), audience_screen()]);
    let mut scene = menu_scene("Play");
    scene.set_active("Poll", true);
    for (letter, vote) in ["A", "B", "C", "D"].iter().zip(["10%", "15%", "60%", "15%"]) {
        scene.set_text(&format!("Poll/Column_{}/Value", letter), vote);
    }

    let report = engine.tick(ms(150), &scene);
    assert_eq!(
        report.spoken(),
        vec!["Play, 3 items", "Audience says: C, 60 percent"]
    );
    assert_eq!(engine.bridge().spoken().len(), 2);
}

#[test]
fn test_unavailable_bridge_still_narrates_to_log() {
    let mut engine = NarrationEngine::new(config(100), RecordingBridge::unavailable());
    engine.register(menu_screen()).unwrap();
    let scene = menu_scene("Play");

    let report = engine.tick(ms(100), &scene);
    assert!(!engine.speech_available());
    assert_eq!(report.records[0].outcome, DispatchOutcome::Logged);
    assert!(engine.bridge().calls().is_empty());
}

#[test]
fn test_screen_scan_interval_throttles() {
    let slow = audience_screen().scan_interval(ms(500));
    let mut engine = engine_with(config(100), vec![slow]);
    let scene = audience_scene(["10%", "15%", "60%", "15%"]);

    assert!(run_ticks(&mut engine, &scene, 4, 100).is_empty());
    assert!(!engine.session("audience").unwrap().is_active());

    assert_eq!(
        run_ticks(&mut engine, &scene, 1, 100),
        vec!["Audience says: C, 60 percent".to_string()]
    );
}
