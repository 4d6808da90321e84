use thiserror::Error;

/// Failure while resolving or reading a scene element.
///
/// Absence is never an error: a missing or inactive element is reported as
/// `Ok(false)` / `Ok(None)`. These variants cover a scene that cannot answer
/// at all right now.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    /// The path is not a well-formed '/'-delimited hierarchy name
    #[error("malformed scene path '{0}'")]
    MalformedPath(String),

    /// The scene could not be queried (e.g. mid-transition)
    #[error("scene unavailable at '{path}': {reason}")]
    Unavailable { path: String, reason: String },
}

/// Read-only view of the host's live scene graph.
pub trait SceneQuery {
    /// Element exists and is active in the hierarchy.
    fn exists_active(&self, path: &str) -> Result<bool, SceneError>;

    /// Raw text value of an element, if it exists and carries text.
    fn read_text(&self, path: &str) -> Result<Option<String>, SceneError>;

    /// Enabled/visibility flag of an element, if it exists.
    fn read_toggle(&self, path: &str) -> Result<Option<bool>, SceneError>;

    /// How many of the given paths are currently active.
    fn count_active(&self, paths: &[String]) -> Result<usize, SceneError> {
        let mut count = 0;
        for path in paths {
            if self.exists_active(path)? {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// The one write capability the narrator may use: element opacity.
///
/// Kept apart from [`SceneQuery`] so that narration itself can only ever
/// read the scene.
pub trait SceneOverride {
    fn opacity(&self, path: &str) -> Option<f32>;

    /// Returns false when the element does not exist.
    fn set_opacity(&mut self, path: &str, opacity: f32) -> bool;
}

/// Scene with no elements at all.
pub struct EmptyScene;

impl SceneQuery for EmptyScene {
    fn exists_active(&self, path: &str) -> Result<bool, SceneError> {
        validate_path(path)?;
        Ok(false)
    }

    fn read_text(&self, path: &str) -> Result<Option<String>, SceneError> {
        validate_path(path)?;
        Ok(None)
    }

    fn read_toggle(&self, path: &str) -> Result<Option<bool>, SceneError> {
        validate_path(path)?;
        Ok(None)
    }
}

/// Reject empty paths, empty segments and leading/trailing separators.
pub fn validate_path(path: &str) -> Result<(), SceneError> {
    if path.is_empty() || path.split('/').any(|segment| segment.trim().is_empty()) {
        return Err(SceneError::MalformedPath(path.to_string()));
    }
    Ok(())
}

/// Substitute the loop variable `{item}` in a path, key or label template.
pub fn expand_template(template: &str, item: &str) -> String {
    template.replace("{item}", item)
}

/// All proper ancestors of a path, nearest last.
///
/// `"A/B/C"` yields `["A", "A/B"]`.
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices('/').map(|(idx, _)| &path[..idx]).collect()
}
