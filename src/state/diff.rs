use crate::screen::screen_model::{ElementKind, ScreenDescriptor};
use crate::state::state_model::ElementSnapshot;

/// Narration-relevant changes between two snapshots of the same screen.
///
/// Keys are listed in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotDiff {
    /// Toggles that went from false to true
    pub rising: Vec<String>,
    /// Text values that differ from the last value seen
    pub text_changed: Vec<String>,
    /// Counts that differ; recorded but never narrated on their own
    pub count_changed: Vec<String>,
}

impl SnapshotDiff {
    /// Whether this diff warrants a change announcement.
    pub fn is_narratable(&self) -> bool {
        !self.rising.is_empty() || !self.text_changed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.rising.is_empty() && self.text_changed.is_empty() && self.count_changed.is_empty()
    }
}

/// Compare the current snapshot against the previous one.
///
/// Only watched elements are considered. Falling toggles and text that
/// disappears are not changes. `previous` keeps the last seen value of
/// text that has since gone missing, so text that flickers out and back
/// with the same value is not a change either.
pub fn diff(
    descriptor: &ScreenDescriptor,
    previous: Option<&ElementSnapshot>,
    current: &ElementSnapshot,
) -> SnapshotDiff {
    let mut out = SnapshotDiff::default();

    for element in descriptor.elements.iter().filter(|e| e.watch) {
        let key = &element.key;
        match element.kind {
            ElementKind::Toggle => {
                let was = previous.map(|p| p.toggle(key)).unwrap_or(false);
                if !was && current.toggle(key) {
                    out.rising.push(key.clone());
                }
            }
            ElementKind::Text => {
                if let Some(now) = current.text(key) {
                    let before = previous.and_then(|p| p.text(key));
                    if before != Some(now) {
                        out.text_changed.push(key.clone());
                    }
                }
            }
            ElementKind::Count => {
                let before = previous.and_then(|p| p.count(key));
                if before != current.count(key) {
                    out.count_changed.push(key.clone());
                }
            }
        }
    }

    out
}
