use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::engine::{EngineConfig, HostAction, KeyBinding};

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "screen-narrator",
    version,
    about = "Narrates a live game UI through a screen reader"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: narrator.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Screen catalog file or directory (default: built-in catalog)
    #[arg(long, global = true)]
    pub catalog: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run narration scenarios from YAML files
    Run {
        /// Path to a scenario YAML file or a directory of them
        #[arg(long)]
        scenario: String,

        /// Output format: console, junit
        #[arg(long, default_value = "console")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List the screens of the catalog
    Screens {
        /// Print the full descriptors as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Load and validate screen descriptor files
    Validate {
        /// Descriptor YAML file or directory
        path: String,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `narrator.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub trace: TraceSettings,
    #[serde(default = "default_bindings")]
    pub bindings: Vec<KeyBinding>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            features: FeatureFlags::default(),
            trace: TraceSettings::default(),
            bindings: default_bindings(),
        }
    }
}

impl AppConfig {
    /// Engine settings; a zero scan interval falls back to the default.
    pub fn to_engine_config(&self) -> EngineConfig {
        let scan_interval_ms = match self.engine.scan_interval_ms {
            0 => {
                warn!(default = default_scan_interval_ms(), "scan_interval_ms is 0, using default");
                default_scan_interval_ms()
            }
            ms => ms,
        };
        EngineConfig {
            scan_interval: Duration::from_millis(scan_interval_ms),
            failure_limit: self.engine.failure_limit,
            auto_repeat: self.features.auto_repeat,
            visibility_override: self.features.visibility_override,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default = "default_scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// Consecutive speech failures before falling back to log-only
    #[serde(default = "default_failure_limit")]
    pub failure_limit: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            scan_interval_ms: 150,
            failure_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default)]
    pub auto_repeat: bool,

    #[serde(default = "default_true")]
    pub visibility_override: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            auto_repeat: false,
            visibility_override: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TraceSettings {
    /// JSONL trace file; tracing is off when unset
    pub path: Option<String>,
}

// Serde default helpers
fn default_scan_interval_ms() -> u64 { 150 }
fn default_failure_limit() -> u32 { 3 }
fn default_true() -> bool { true }

fn default_bindings() -> Vec<KeyBinding> {
    vec![
        KeyBinding::new(
            "T",
            HostAction::Announce {
                screen: "timer".to_string(),
            },
        ),
        KeyBinding::new(
            "V",
            HostAction::ToggleVisibility {
                screen: "timer".to_string(),
            },
        ),
    ]
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if the file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("narrator.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = config_path, error = %e, "malformed config, using defaults");
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}
