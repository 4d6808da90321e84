use crate::script::scenario_model::ExpectationResult;

/// Execution state of a running scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioContext {
    pub current_step: usize,

    /// Announcements delivered since the last speech expectation
    pub pending: Vec<String>,

    /// Every announcement delivered so far
    pub spoken: Vec<String>,

    pub expectation_results: Vec<ExpectationResult>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_spoken(&mut self, text: &str) {
        self.pending.push(text.to_string());
        self.spoken.push(text.to_string());
    }

    /// Hand over and clear the pending announcements.
    pub fn take_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    pub fn record(&mut self, result: ExpectationResult) {
        self.expectation_results.push(result);
    }

    pub fn all_passed(&self) -> bool {
        self.expectation_results.iter().all(|r| r.passed)
    }

    pub fn pass_count(&self) -> usize {
        self.expectation_results.iter().filter(|r| r.passed).count()
    }

    pub fn fail_count(&self) -> usize {
        self.expectation_results.iter().filter(|r| !r.passed).count()
    }
}
