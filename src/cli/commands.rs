use std::collections::HashSet;

use tracing::info;

use crate::cli::config::AppConfig;
use crate::engine::error::NarrationError;
use crate::report::console::format_console_report;
use crate::report::junit::generate_junit_xml;
use crate::report::report_model::SuiteReport;
use crate::screen::catalog::{builtin, load_descriptors};
use crate::screen::screen_model::{ScreenCatalog, ScreenDescriptor};
use crate::script::runner::ScenarioRunner;
use crate::script::scenario_model::Scenario;

/// Descriptors from `--catalog`, or the built-in catalog.
pub fn resolve_catalog(catalog: Option<&str>) -> Result<Vec<ScreenDescriptor>, NarrationError> {
    match catalog {
        Some(path) => load_descriptors(path),
        None => builtin(),
    }
}

// ============================================================================
// run subcommand
// ============================================================================

/// Run scenarios and return whether all passed.
pub fn cmd_run(
    scenario_path: &str,
    format: &str,
    output: Option<&str>,
    catalog: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let scenarios = load_scenarios(scenario_path)?;

    if scenarios.is_empty() {
        eprintln!("No scenarios found at: {}", scenario_path);
        return Ok(true);
    }

    let descriptors = resolve_catalog(catalog)?;
    info!(scenarios = scenarios.len(), screens = descriptors.len(), "running scenarios");

    let mut runner = ScenarioRunner::new(&descriptors, config.to_engine_config(), &config.bindings);
    if let Some(trace_path) = config.trace.path.as_deref() {
        runner = runner.with_trace(trace_path);
    }
    let start = std::time::Instant::now();

    let mut results = Vec::new();
    for scenario in &scenarios {
        info!(scenario = %scenario.name, "running");
        results.push(runner.run(scenario));
    }

    let duration = start.elapsed().as_millis();
    let report = SuiteReport::from_results("CLI Run", results).with_duration(duration);
    let all_passed = report.all_passed();

    let output_content = match format {
        "junit" => generate_junit_xml(&report),
        _ => format_console_report(&report),
    };

    match output {
        Some(path) => std::fs::write(path, &output_content)?,
        None => print!("{}", output_content),
    }

    Ok(all_passed)
}

/// Load scenarios from a single YAML file or a directory of YAML files.
pub fn load_scenarios(path: &str) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        let mut scenarios = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let p = entry.path();
            if p.extension().map_or(false, |e| e == "yaml" || e == "yml") {
                let content = std::fs::read_to_string(&p)?;
                let scenario: Scenario = serde_yaml::from_str(&content)?;
                scenarios.push(scenario);
            }
        }
        // Sort by name for deterministic order
        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    } else {
        let content = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_yaml::from_str(&content)?;
        Ok(vec![scenario])
    }
}

// ============================================================================
// screens subcommand
// ============================================================================

pub fn cmd_screens(catalog: Option<&str>, yaml: bool) -> Result<(), Box<dyn std::error::Error>> {
    let screens = resolve_catalog(catalog)?;

    if yaml {
        print!("{}", serde_yaml::to_string(&ScreenCatalog { screens })?);
        return Ok(());
    }

    for screen in &screens {
        let expanded = screen.expanded();
        let mut notes = Vec::new();
        if let Some(delay) = screen.entry_delay_ms {
            notes.push(format!("entry delay {}ms", delay));
        }
        if let Some(interval) = screen.scan_interval_ms {
            notes.push(format!("every {}ms", interval));
        }
        if screen.repeat.is_some() {
            notes.push("repeats".to_string());
        }
        if screen.visibility.is_some() {
            notes.push("visibility override".to_string());
        }

        println!(
            "{:<20} {:>2} elements  {}",
            screen.id,
            expanded.elements.len(),
            notes.join(", ")
        );
    }
    Ok(())
}

// ============================================================================
// validate subcommand
// ============================================================================

/// Check every descriptor the way registration would.
pub fn cmd_validate(path: &str) -> Result<usize, NarrationError> {
    let screens = load_descriptors(path)?;

    let mut seen = HashSet::new();
    for screen in &screens {
        screen.expanded().validate()?;
        if !seen.insert(screen.id.as_str()) {
            return Err(NarrationError::DuplicateScreen(screen.id.clone()));
        }
    }

    println!("{} screen(s) valid in {}", screens.len(), path);
    Ok(screens.len())
}
