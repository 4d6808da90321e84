use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::announce::template::Template;
use crate::engine::error::NarrationError;
use crate::scene::scene_model::{expand_template, validate_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// Text value of an element; absent when missing, inactive or placeholder
    Text,
    /// Present, active and enabled
    Toggle,
    /// Number of active paths among an enumerated sibling set
    Count,
}

/// One element a screen samples each pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSpec {
    pub key: String,
    pub kind: ElementKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Sibling paths for `count` elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,

    /// Spoken name; defaults to the key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Default text meaning "not populated yet"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Whether changes of this element trigger announcements
    #[serde(default = "default_true")]
    pub watch: bool,

    /// Loop variable values substituted for `{item}`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub each: Vec<String>,
}

impl ElementSpec {
    fn with_kind(key: &str, kind: ElementKind) -> Self {
        Self {
            key: key.to_string(),
            kind,
            path: None,
            paths: Vec::new(),
            label: None,
            placeholder: None,
            watch: true,
            each: Vec::new(),
        }
    }

    pub fn text(key: &str, path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::with_kind(key, ElementKind::Text)
        }
    }

    pub fn toggle(key: &str, path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::with_kind(key, ElementKind::Toggle)
        }
    }

    pub fn count(key: &str, paths: &[&str]) -> Self {
        Self {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            ..Self::with_kind(key, ElementKind::Count)
        }
    }

    pub fn labeled(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    /// Sampled for composition only; never triggers an announcement.
    pub fn context(mut self) -> Self {
        self.watch = false;
        self
    }

    pub fn each(mut self, items: &[&str]) -> Self {
        self.each = items.iter().map(|i| i.to_string()).collect();
        self
    }

    pub fn label_or_key(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }

    /// Resolve `each` into concrete elements.
    ///
    /// Text and toggle elements become one element per item. A count element
    /// stays a single element whose path template fans out into `paths`.
    pub fn expand(&self) -> Vec<ElementSpec> {
        if self.each.is_empty() {
            return vec![self.clone()];
        }

        if self.kind == ElementKind::Count {
            let mut paths = self.paths.clone();
            if let Some(path) = &self.path {
                paths.extend(self.each.iter().map(|item| expand_template(path, item)));
            }
            return vec![ElementSpec {
                path: None,
                paths,
                each: Vec::new(),
                ..self.clone()
            }];
        }

        self.each
            .iter()
            .map(|item| ElementSpec {
                key: expand_template(&self.key, item),
                kind: self.kind,
                path: self.path.as_deref().map(|p| expand_template(p, item)),
                paths: self.paths.iter().map(|p| expand_template(p, item)).collect(),
                label: self.label.as_deref().map(|l| expand_template(l, item)),
                placeholder: self.placeholder.clone(),
                watch: self.watch,
                each: Vec::new(),
            })
            .collect()
    }
}

/// One clause of a screen's activation predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationCondition {
    /// Element exists and is active
    Active { path: String },

    /// Element is missing or inactive
    Inactive { path: String },

    /// Element is active and its enabled flag is set
    Toggled { path: String },

    AnyActive { paths: Vec<String> },

    AnyToggled { paths: Vec<String> },

    /// Element is active and shows real (non-placeholder) text
    TextPresent {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        placeholder: Option<String>,
    },

    /// Element is active and its text contains one of the needles
    TextContains { path: String, needles: Vec<String> },

    /// Element is active, shows text, and the text contains none of the needles
    TextLacks { path: String, needles: Vec<String> },

    /// Element is active and its text parses to a number above `min`
    NumberAbove { path: String, min: i64 },
}

impl ActivationCondition {
    pub fn active(path: &str) -> Self {
        ActivationCondition::Active {
            path: path.to_string(),
        }
    }

    pub fn toggled(path: &str) -> Self {
        ActivationCondition::Toggled {
            path: path.to_string(),
        }
    }

    pub fn any_toggled(paths: &[&str]) -> Self {
        ActivationCondition::AnyToggled {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn paths(&self) -> Vec<&str> {
        match self {
            ActivationCondition::Active { path }
            | ActivationCondition::Inactive { path }
            | ActivationCondition::Toggled { path }
            | ActivationCondition::TextPresent { path, .. }
            | ActivationCondition::TextContains { path, .. }
            | ActivationCondition::TextLacks { path, .. }
            | ActivationCondition::NumberAbove { path, .. } => vec![path.as_str()],
            ActivationCondition::AnyActive { paths } | ActivationCondition::AnyToggled { paths } => {
                paths.iter().map(String::as_str).collect()
            }
        }
    }
}

/// Periodic re-announcement while a screen stays active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepeatSpec {
    pub every_ms: u64,
    pub template: Template,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpacityTarget {
    pub path: String,
    pub opacity: f32,
}

/// Graphics a screen may force visible when the override feature is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilitySpec {
    /// Spoken name used when the override is toggled
    pub label: String,

    #[serde(default = "default_min_opacity")]
    pub min_opacity: f32,

    pub targets: Vec<OpacityTarget>,
}

/// Static description of one monitored screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenDescriptor {
    pub id: String,

    /// Conjunction, evaluated in order
    #[serde(default)]
    pub activation: Vec<ActivationCondition>,

    #[serde(default)]
    pub elements: Vec<ElementSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_enter: Option<Template>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_change: Option<Template>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_interval_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<RepeatSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilitySpec>,
}

/// YAML document holding a list of descriptors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenCatalog {
    pub screens: Vec<ScreenDescriptor>,
}

impl ScreenDescriptor {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            activation: Vec::new(),
            elements: Vec::new(),
            on_enter: None,
            on_change: None,
            entry_delay_ms: None,
            scan_interval_ms: None,
            repeat: None,
            visibility: None,
        }
    }

    pub fn require(mut self, condition: ActivationCondition) -> Self {
        self.activation.push(condition);
        self
    }

    pub fn element(mut self, element: ElementSpec) -> Self {
        self.elements.push(element);
        self
    }

    pub fn on_enter(mut self, template: Template) -> Self {
        self.on_enter = Some(template);
        self
    }

    pub fn on_change(mut self, template: Template) -> Self {
        self.on_change = Some(template);
        self
    }

    pub fn entry_delay(mut self, delay: Duration) -> Self {
        self.entry_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.scan_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn repeat(mut self, every: Duration, template: Template) -> Self {
        self.repeat = Some(RepeatSpec {
            every_ms: every.as_millis() as u64,
            template,
        });
        self
    }

    pub fn visibility(mut self, spec: VisibilitySpec) -> Self {
        self.visibility = Some(spec);
        self
    }

    pub fn entry_delay_duration(&self) -> Duration {
        Duration::from_millis(self.entry_delay_ms.unwrap_or(0))
    }

    /// Template used for the first announcement after activation.
    pub fn entry_template(&self) -> Option<&Template> {
        self.on_enter.as_ref().or(self.on_change.as_ref())
    }

    /// Template used for on-demand announcements.
    pub fn manual_template(&self) -> Option<&Template> {
        self.repeat
            .as_ref()
            .map(|r| &r.template)
            .or(self.on_change.as_ref())
            .or(self.on_enter.as_ref())
    }

    pub fn element_spec(&self, key: &str) -> Option<&ElementSpec> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Spoken label of an element, falling back to the key itself.
    pub fn label_for<'a>(&'a self, key: &'a str) -> &'a str {
        self.element_spec(key)
            .map(ElementSpec::label_or_key)
            .unwrap_or(key)
    }

    /// Copy with every `each` loop resolved, in elements and templates.
    pub fn expanded(&self) -> Self {
        let mut out = self.clone();
        out.elements = self.elements.iter().flat_map(ElementSpec::expand).collect();
        out.on_enter = self.on_enter.as_ref().map(Template::expanded);
        out.on_change = self.on_change.as_ref().map(Template::expanded);
        if let Some(repeat) = &mut out.repeat {
            repeat.template = repeat.template.expanded();
        }
        out
    }

    /// Structural checks run at registration, on an expanded descriptor.
    pub fn validate(&self) -> Result<(), NarrationError> {
        if self.id.trim().is_empty() {
            return Err(NarrationError::invalid(&self.id, "id is empty"));
        }
        if self.activation.is_empty() {
            return Err(NarrationError::invalid(&self.id, "no activation conditions"));
        }
        if self.entry_template().is_none() && self.repeat.is_none() {
            return Err(NarrationError::invalid(&self.id, "no announcement template"));
        }

        for condition in &self.activation {
            for path in condition.paths() {
                validate_path(path).map_err(|e| NarrationError::invalid(&self.id, e.to_string()))?;
            }
        }

        let mut seen = HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.key.as_str()) {
                return Err(NarrationError::invalid(
                    &self.id,
                    format!("duplicate element key '{}'", element.key),
                ));
            }
            if !element.each.is_empty() {
                return Err(NarrationError::invalid(
                    &self.id,
                    format!("element '{}' was not expanded", element.key),
                ));
            }
            match element.kind {
                ElementKind::Count => {
                    if element.paths.is_empty() {
                        return Err(NarrationError::invalid(
                            &self.id,
                            format!("count element '{}' has no paths", element.key),
                        ));
                    }
                }
                ElementKind::Text | ElementKind::Toggle => {
                    if element.path.is_none() {
                        return Err(NarrationError::invalid(
                            &self.id,
                            format!("element '{}' has no path", element.key),
                        ));
                    }
                }
            }
            for path in element.path.iter().chain(element.paths.iter()) {
                validate_path(path).map_err(|e| NarrationError::invalid(&self.id, e.to_string()))?;
            }
        }

        let templates = self
            .on_enter
            .iter()
            .chain(self.on_change.iter())
            .chain(self.repeat.iter().map(|r| &r.template));
        for template in templates {
            for (key, expected) in template.referenced_keys() {
                let Some(element) = self.element_spec(&key) else {
                    return Err(NarrationError::invalid(
                        &self.id,
                        format!("template references unknown element '{}'", key),
                    ));
                };
                if let Some(kind) = expected {
                    if element.kind != kind {
                        return Err(NarrationError::invalid(
                            &self.id,
                            format!("element '{}' must be a {:?} element", key, kind),
                        ));
                    }
                }
            }
        }

        if self.scan_interval_ms == Some(0) {
            return Err(NarrationError::invalid(&self.id, "scan interval is zero"));
        }

        if self.repeat.as_ref().is_some_and(|r| r.every_ms == 0) {
            return Err(NarrationError::invalid(&self.id, "repeat interval is zero"));
        }

        if let Some(visibility) = &self.visibility {
            for target in &visibility.targets {
                validate_path(&target.path)
                    .map_err(|e| NarrationError::invalid(&self.id, e.to_string()))?;
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_min_opacity() -> f32 {
    0.5
}
