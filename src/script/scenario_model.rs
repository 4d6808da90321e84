use serde::{Deserialize, Serialize};

use crate::scene::memory::SceneNodeSpec;

/// A scripted run of the narrator against an in-memory scene.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,

    /// Screens to register; empty means the whole catalog
    #[serde(default)]
    pub screens: Vec<String>,

    /// Host frame length used by `advance`
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u64,

    /// Overrides the configured auto-repeat feature flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_repeat: Option<bool>,

    /// Initial scene graph
    #[serde(default)]
    pub scene: Vec<SceneNodeSpec>,

    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Create or update a scene node
    Set {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        active: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        enabled: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f32>,
    },

    /// Delete a node and its subtree
    Remove { path: String },

    /// Make queries under a path fail
    Fail { path: String },

    Recover { path: String },

    /// Feed host frames totalling `ms`
    Advance { ms: u64 },

    /// Press a bound key
    Press { key: String },

    /// Text was delivered since the previous expectation
    ExpectSpoken { text: String },

    /// Nothing was delivered since the previous expectation
    ExpectSilent,

    ExpectActive { screen: String, active: bool },

    ExpectOpacity { path: String, at_least: f32 },
}

impl ScenarioStep {
    pub fn is_expectation(&self) -> bool {
        matches!(
            self,
            ScenarioStep::ExpectSpoken { .. }
                | ScenarioStep::ExpectSilent
                | ScenarioStep::ExpectActive { .. }
                | ScenarioStep::ExpectOpacity { .. }
        )
    }
}

/// Result of evaluating one expectation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpectationResult {
    pub step_index: usize,
    pub expectation: ScenarioStep,
    pub passed: bool,

    /// What was observed, for failed expectations
    pub actual: Option<String>,
    pub message: Option<String>,
}

/// Result of running a complete scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub expectation_results: Vec<ExpectationResult>,

    /// Every delivered announcement, in order
    pub spoken: Vec<String>,

    /// Error that stopped the run early
    pub error: Option<String>,
}

fn default_frame_ms() -> u64 {
    50
}
