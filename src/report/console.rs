use crate::report::report_model::SuiteReport;
use crate::script::scenario_model::ScenarioStep;

// ============================================================================
// Console reporter
// ============================================================================

/// Format a suite report for the terminal.
///
/// ```text
/// === Scenarios: quiz show ===
///
/// ✓ PASS  main menu (6 steps, 2 expectations, 3 spoken)
/// ✗ FAIL  answers (8 steps, 3 expectations, 2 spoken)
///     [FAIL] Step 4: ExpectSpoken: 'B, Paris' was not spoken
///
/// === Results: 1 passed, 1 failed (2 total) ===
/// ```
pub fn format_console_report(report: &SuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Scenarios: {} ===\n\n", report.suite_name));

    for result in &report.results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!(
            "{}  {} ({} steps, {} expectations, {} spoken)\n",
            marker,
            result.name,
            result.steps_run,
            result.expectation_results.len(),
            result.spoken.len()
        ));

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        if !result.passed {
            for er in result.expectation_results.iter().filter(|er| !er.passed) {
                let detail = er.message.as_deref().unwrap_or("expectation failed");
                out.push_str(&format!(
                    "    [FAIL] Step {}: {}: {}\n",
                    er.step_index,
                    expectation_name(&er.expectation),
                    detail
                ));
                if let Some(actual) = er.actual.as_deref().filter(|a| !a.is_empty()) {
                    out.push_str(&format!("           heard: {}\n", actual));
                }
            }
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total)",
        report.passed, report.failed, report.total
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");

    out
}

fn expectation_name(step: &ScenarioStep) -> &'static str {
    match step {
        ScenarioStep::ExpectSpoken { .. } => "ExpectSpoken",
        ScenarioStep::ExpectSilent => "ExpectSilent",
        ScenarioStep::ExpectActive { .. } => "ExpectActive",
        ScenarioStep::ExpectOpacity { .. } => "ExpectOpacity",
        _ => "Step",
    }
}
