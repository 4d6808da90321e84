use std::time::Duration;

use screen_narrator::announce::template::{Detail, FocusOption, Template};
use screen_narrator::engine::engine::{EngineConfig, NarrationEngine};
use screen_narrator::scene::memory::MemoryScene;
use screen_narrator::screen::screen_model::{ActivationCondition, ElementSpec, ScreenDescriptor};
use screen_narrator::speech::bridge::RecordingBridge;

pub const MENU_ITEMS: [&str; 3] = ["Play", "Shop", "Exit"];

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

pub fn config(scan_interval_ms: u64) -> EngineConfig {
    EngineConfig {
        scan_interval: ms(scan_interval_ms),
        ..EngineConfig::default()
    }
}

/// Engine with a ready recording bridge and the given screens registered.
pub fn engine_with(config: EngineConfig, screens: Vec<ScreenDescriptor>) -> NarrationEngine<RecordingBridge> {
    let mut engine = NarrationEngine::new(config, RecordingBridge::ready());
    engine.register_all(screens).unwrap();
    engine
}

/// Three-item menu: "{item}, {n} items" on entry, "{item}" on focus change.
pub fn menu_screen() -> ScreenDescriptor {
    let options: Vec<FocusOption> = MENU_ITEMS
        .iter()
        .map(|item| FocusOption::labeled(&format!("focus_{}", item), item))
        .collect();

    ScreenDescriptor::new("menu")
        .require(ActivationCondition::active("Menu"))
        .element(ElementSpec::toggle("focus_{item}", "Menu/{item}/Orange").each(&MENU_ITEMS))
        .element(ElementSpec::count("items", &["Menu/Play", "Menu/Shop", "Menu/Exit"]))
        .on_enter(Template::Focus {
            options: options.clone(),
            shared: vec![Detail::Text {
                key: "items".into(),
                optional: false,
                format: Some("{value} items".into()),
            }],
            separator: ", ".into(),
            prefix: None,
        })
        .on_change(Template::focus(options))
}

/// Menu scene with `focused` highlighted.
pub fn menu_scene(focused: &str) -> MemoryScene {
    let mut scene = MemoryScene::new().with_active("Menu");
    for item in MENU_ITEMS {
        scene = scene
            .with_active(&format!("Menu/{}", item))
            .with_toggle(&format!("Menu/{}/Orange", item), item == focused);
    }
    scene
}

/// Move the menu highlight to `item`.
pub fn focus(scene: &mut MemoryScene, item: &str) {
    for other in MENU_ITEMS {
        scene.set_enabled(&format!("Menu/{}/Orange", other), other == item);
    }
}

pub fn audience_screen() -> ScreenDescriptor {
    ScreenDescriptor::new("audience")
        .require(ActivationCondition::active("Poll"))
        .element(
            ElementSpec::text("vote_{item}", "Poll/Column_{item}/Value")
                .labeled("{item}")
                .each(&["A", "B", "C", "D"]),
        )
        .on_enter(Template::Highest {
            keys: vec!["vote_{item}".into()],
            each: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            text: "Audience says: {label}, {value} percent".into(),
            ignore_all: Some("100%".into()),
        })
}

pub fn audience_scene(votes: [&str; 4]) -> MemoryScene {
    let mut scene = MemoryScene::new().with_active("Poll");
    for (letter, vote) in ["A", "B", "C", "D"].iter().zip(votes) {
        scene = scene.with_text(&format!("Poll/Column_{}/Value", letter), vote);
    }
    scene
}

/// Result screen announced after a delay.
pub fn result_screen(delay_ms: u64) -> ScreenDescriptor {
    ScreenDescriptor::new("result")
        .require(ActivationCondition::active("Gain"))
        .element(ElementSpec::text("gain", "Gain/Amount").context())
        .on_enter(Template::format("Total earnings: {gain}"))
        .entry_delay(ms(delay_ms))
}

/// Question text with a "Question" placeholder, announced on entry and change.
pub fn question_screen() -> ScreenDescriptor {
    ScreenDescriptor::new("question")
        .require(ActivationCondition::active("Quiz"))
        .element(ElementSpec::text("question", "Quiz/Question").placeholder("Question"))
        .element(ElementSpec::text("category", "Quiz/Category"))
        .on_change(Template::format("{question}"))
}

/// Feed `n` host ticks of `step_ms` each; collect everything delivered.
pub fn run_ticks(
    engine: &mut NarrationEngine<RecordingBridge>,
    scene: &MemoryScene,
    n: usize,
    step_ms: u64,
) -> Vec<String> {
    let mut spoken = Vec::new();
    for _ in 0..n {
        let report = engine.tick(ms(step_ms), scene);
        spoken.extend(report.spoken().into_iter().map(String::from));
    }
    spoken
}
