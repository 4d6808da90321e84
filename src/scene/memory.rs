use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::scene::scene_model::{SceneError, SceneOverride, SceneQuery, ancestors, validate_path};

/// State of a single element in a [`MemoryScene`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneNode {
    pub active: bool,
    pub enabled: Option<bool>,
    pub text: Option<String>,
    pub opacity: Option<f32>,
}

/// Serializable description of one scene node, as written in scenario files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNodeSpec {
    pub path: String,

    #[serde(default = "default_true")]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,
}

fn default_true() -> bool {
    true
}

/// In-memory scene graph keyed by full path.
///
/// Activity follows hierarchy rules: a node counts as active only if it and
/// every ancestor present in the map are active. Ancestors that were never
/// declared are treated as active containers.
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    nodes: HashMap<String, SceneNode>,
    failing: HashSet<String>,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_specs(specs: &[SceneNodeSpec]) -> Self {
        let mut scene = Self::new();
        for spec in specs {
            scene.apply(spec);
        }
        scene
    }

    /// Insert or replace a node.
    pub fn insert(&mut self, path: &str, node: SceneNode) {
        self.nodes.insert(path.to_string(), node);
    }

    /// Upsert from a spec; absent optional fields keep their previous value.
    pub fn apply(&mut self, spec: &SceneNodeSpec) {
        let node = self.nodes.entry(spec.path.clone()).or_default();
        node.active = spec.active;
        if spec.enabled.is_some() {
            node.enabled = spec.enabled;
        }
        if spec.text.is_some() {
            node.text = spec.text.clone();
        }
        if spec.opacity.is_some() {
            node.opacity = spec.opacity;
        }
    }

    /// Active container node with no payload.
    pub fn with_active(mut self, path: &str) -> Self {
        self.insert(path, SceneNode { active: true, ..SceneNode::default() });
        self
    }

    /// Active node carrying text.
    pub fn with_text(mut self, path: &str, text: &str) -> Self {
        self.insert(
            path,
            SceneNode {
                active: true,
                text: Some(text.to_string()),
                ..SceneNode::default()
            },
        );
        self
    }

    /// Active node with an enabled flag (highlight, underline, ...).
    pub fn with_toggle(mut self, path: &str, enabled: bool) -> Self {
        self.insert(
            path,
            SceneNode {
                active: true,
                enabled: Some(enabled),
                ..SceneNode::default()
            },
        );
        self
    }

    pub fn set_active(&mut self, path: &str, active: bool) {
        self.nodes.entry(path.to_string()).or_default().active = active;
    }

    pub fn set_enabled(&mut self, path: &str, enabled: bool) {
        let node = self.nodes.entry(path.to_string()).or_default();
        node.active = true;
        node.enabled = Some(enabled);
    }

    pub fn set_text(&mut self, path: &str, text: &str) {
        let node = self.nodes.entry(path.to_string()).or_default();
        node.active = true;
        node.text = Some(text.to_string());
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, path: &str) {
        let prefix = format!("{}/", path);
        self.nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    /// Make every query touching `path` (or its subtree) fail.
    pub fn fail(&mut self, path: &str) {
        self.failing.insert(path.to_string());
    }

    pub fn recover(&mut self, path: &str) {
        self.failing.remove(path);
    }

    pub fn node(&self, path: &str) -> Option<&SceneNode> {
        self.nodes.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check(&self, path: &str) -> Result<(), SceneError> {
        validate_path(path)?;

        let failing = self.failing.iter().find(|f| {
            path == f.as_str() || path.starts_with(&format!("{}/", f))
        });
        if let Some(f) = failing {
            return Err(SceneError::Unavailable {
                path: path.to_string(),
                reason: format!("subtree '{}' is unavailable", f),
            });
        }
        Ok(())
    }

    fn active_in_hierarchy(&self, path: &str) -> bool {
        let Some(node) = self.nodes.get(path) else {
            return false;
        };
        if !node.active {
            return false;
        }
        ancestors(path)
            .into_iter()
            .all(|ancestor| self.nodes.get(ancestor).map_or(true, |n| n.active))
    }
}

impl SceneQuery for MemoryScene {
    fn exists_active(&self, path: &str) -> Result<bool, SceneError> {
        self.check(path)?;
        Ok(self.active_in_hierarchy(path))
    }

    fn read_text(&self, path: &str) -> Result<Option<String>, SceneError> {
        self.check(path)?;
        Ok(self.nodes.get(path).and_then(|n| n.text.clone()))
    }

    fn read_toggle(&self, path: &str) -> Result<Option<bool>, SceneError> {
        self.check(path)?;
        Ok(self.nodes.get(path).and_then(|n| n.enabled))
    }
}

impl SceneOverride for MemoryScene {
    fn opacity(&self, path: &str) -> Option<f32> {
        self.nodes.get(path).map(|n| n.opacity.unwrap_or(1.0))
    }

    fn set_opacity(&mut self, path: &str, opacity: f32) -> bool {
        match self.nodes.get_mut(path) {
            Some(node) => {
                node.opacity = Some(opacity);
                true
            }
            None => false,
        }
    }
}
