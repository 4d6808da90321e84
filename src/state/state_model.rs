use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

/// Value read for one declared element during a sample.
///
/// An element with no value this pass is simply missing from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampledValue {
    Text(String),
    Toggle(bool),
    Count(usize),
}

impl SampledValue {
    /// Spoken form used when a template interpolates the value.
    pub fn display(&self) -> Option<String> {
        match self {
            SampledValue::Text(text) => Some(text.clone()),
            SampledValue::Count(n) => Some(n.to_string()),
            SampledValue::Toggle(_) => None,
        }
    }
}

/// Values of one screen's declared elements at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ElementSnapshot {
    values: HashMap<String, SampledValue>,
}

impl ElementSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: SampledValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Builder form of [`insert`](Self::insert), handy in tests.
    pub fn with(mut self, key: &str, value: SampledValue) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SampledValue> {
        self.values.get(key)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SampledValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Absent toggles read as false.
    pub fn toggle(&self, key: &str) -> bool {
        matches!(self.values.get(key), Some(SampledValue::Toggle(true)))
    }

    pub fn count(&self, key: &str) -> Option<usize> {
        match self.values.get(key) {
            Some(SampledValue::Count(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn display(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(SampledValue::display)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys in sorted order, for stable output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Keep text values from `earlier` for text keys missing here.
    ///
    /// A text element that drops out for a pass and comes back unchanged
    /// then compares equal to what was last seen.
    pub fn carry_text_from(&mut self, earlier: &ElementSnapshot) {
        for (key, value) in &earlier.values {
            if matches!(value, SampledValue::Text(_)) && !self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Inactive,
    Active,
}

/// Per-screen mutable state, owned by the engine's registry slot.
///
/// `Default` is the reset state; every activation starts from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScreenSession {
    pub state: SessionState,

    /// Last sample, with text values carried over passes where they were absent
    pub previous: Option<ElementSnapshot>,
    pub last_announced: Option<String>,

    /// Narration clock reading when the screen became active
    pub entered_at: Option<Duration>,

    /// Entry announcement has been dispatched for this activation
    pub entry_announced: bool,

    /// Narration time accumulated towards the next auto-repeat
    pub since_repeat: Duration,
}

impl ScreenSession {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reset and mark active, stamping the entry time.
    pub fn begin(&mut self, now: Duration) {
        self.reset();
        self.state = SessionState::Active;
        self.entered_at = Some(now);
    }

    /// Entry announcement still owed and the entry delay has elapsed.
    pub fn entry_due(&self, now: Duration, delay: Duration) -> bool {
        if self.entry_announced {
            return false;
        }
        self.entered_at
            .map(|at| now.saturating_sub(at) >= delay)
            .unwrap_or(false)
    }
}
