use serde::Serialize;

/// Why an announcement was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Screen just became active
    Entry,
    /// Entry announcement held back by the screen's entry delay
    Delayed,
    /// A watched toggle turned on
    Edge,
    /// A watched text value appeared or changed
    TextChange,
    /// Periodic re-announcement
    Repeat,
    /// Requested through a key binding
    Manual,
}

impl Trigger {
    /// Triggers that speak even when the text matches the last announcement.
    pub fn bypasses_dedupe(self) -> bool {
        matches!(
            self,
            Trigger::Entry | Trigger::Delayed | Trigger::Edge | Trigger::Manual
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Trigger::Entry => "entry",
            Trigger::Delayed => "delayed",
            Trigger::Edge => "edge",
            Trigger::TextChange => "text_change",
            Trigger::Repeat => "repeat",
            Trigger::Manual => "manual",
        }
    }
}

/// Text ready to be handed to the speech dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnouncementEvent {
    pub screen: String,
    pub text: String,
    pub trigger: Trigger,
}

impl AnnouncementEvent {
    pub fn new(screen: &str, text: impl Into<String>, trigger: Trigger) -> Self {
        Self {
            screen: screen.to_string(),
            text: text.into(),
            trigger,
        }
    }
}
