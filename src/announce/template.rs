use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::scene::scene_model::expand_template;
use crate::screen::screen_model::{ElementKind, ScreenDescriptor};
use crate::state::normalize::{parse_decimal, parse_number};
use crate::state::state_model::ElementSnapshot;

/// Closure form of a template, for screens built in code.
#[derive(Clone)]
pub struct TemplateFn(pub Arc<dyn Fn(&ElementSnapshot, &ScreenDescriptor) -> Option<String> + Send + Sync>);

impl TemplateFn {
    pub fn new(
        f: impl Fn(&ElementSnapshot, &ScreenDescriptor) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for TemplateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TemplateFn(..)")
    }
}

impl PartialEq for TemplateFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// How a screen turns a snapshot into announcement text.
///
/// Every variant may decline to produce text, which the caller treats as
/// "nothing to say yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Template {
    /// Literal text with `{key}` placeholders; any missing value declines
    Format { text: String },

    /// Speak the option whose toggle is on
    Focus {
        options: Vec<FocusOption>,

        /// Details appended after the chosen option's own details
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        shared: Vec<Detail>,

        #[serde(default = "default_focus_separator")]
        separator: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        prefix: Option<String>,
    },

    /// Speak the numerically largest value, e.g. audience poll results
    Highest {
        keys: Vec<String>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        each: Vec<String>,

        /// Uses `{label}` and `{value}`
        #[serde(default = "default_highest_text")]
        text: String,

        /// Decline when every value reads this, compared as numbers when numeric
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ignore_all: Option<String>,
    },

    /// Speak every present value in order
    List {
        /// Spoken bare before the items; required
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lead: Option<String>,

        keys: Vec<String>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        each: Vec<String>,

        /// Uses `{label}` and `{value}`
        #[serde(default = "default_list_item")]
        item: String,

        #[serde(default = "default_list_separator")]
        separator: String,
    },

    /// Details in declared order, e.g. a name followed by optional facts
    Compose {
        parts: Vec<Detail>,

        #[serde(default = "default_focus_separator")]
        separator: String,
    },

    #[serde(skip)]
    Custom(TemplateFn),
}

/// One selectable item of a focus template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusOption {
    /// Toggle element marking this option as focused
    pub toggle: String,

    /// Literal spoken name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Text element holding the spoken name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_key: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Detail>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub each: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Detail {
    /// Value of a text or count element
    Text {
        key: String,

        /// Skip instead of declining when the value is missing
        #[serde(default)]
        optional: bool,

        /// Uses `{value}`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },

    /// Fixed wording chosen by a toggle
    Flag {
        key: String,
        on: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        off: Option<String>,
    },
}

impl Detail {
    pub fn text(key: &str) -> Self {
        Detail::Text {
            key: key.to_string(),
            optional: false,
            format: None,
        }
    }

    pub fn flag(key: &str, on: &str, off: Option<&str>) -> Self {
        Detail::Flag {
            key: key.to_string(),
            on: on.to_string(),
            off: off.map(str::to_string),
        }
    }

    fn key(&self) -> &str {
        match self {
            Detail::Text { key, .. } | Detail::Flag { key, .. } => key,
        }
    }

    fn expand(&self, item: &str) -> Self {
        match self {
            Detail::Text { key, optional, format } => Detail::Text {
                key: expand_template(key, item),
                optional: *optional,
                format: format.clone(),
            },
            Detail::Flag { key, on, off } => Detail::Flag {
                key: expand_template(key, item),
                on: on.clone(),
                off: off.clone(),
            },
        }
    }
}

impl FocusOption {
    pub fn labeled(toggle: &str, label: &str) -> Self {
        Self {
            toggle: toggle.to_string(),
            label: Some(label.to_string()),
            label_key: None,
            details: Vec::new(),
            each: Vec::new(),
        }
    }

    pub fn detail(mut self, detail: Detail) -> Self {
        self.details.push(detail);
        self
    }

    fn expand(&self) -> Vec<FocusOption> {
        if self.each.is_empty() {
            return vec![self.clone()];
        }
        self.each
            .iter()
            .map(|item| FocusOption {
                toggle: expand_template(&self.toggle, item),
                label: self.label.as_deref().map(|l| expand_template(l, item)),
                label_key: self.label_key.as_deref().map(|k| expand_template(k, item)),
                details: self.details.iter().map(|d| d.expand(item)).collect(),
                each: Vec::new(),
            })
            .collect()
    }
}

impl Template {
    pub fn format(text: &str) -> Self {
        Template::Format {
            text: text.to_string(),
        }
    }

    pub fn focus(options: Vec<FocusOption>) -> Self {
        Template::Focus {
            options,
            shared: Vec::new(),
            separator: default_focus_separator(),
            prefix: None,
        }
    }

    pub fn highest(keys: &[&str], text: &str) -> Self {
        Template::Highest {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            each: Vec::new(),
            text: text.to_string(),
            ignore_all: None,
        }
    }

    pub fn list(keys: &[&str]) -> Self {
        Template::List {
            lead: None,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            each: Vec::new(),
            item: default_list_item(),
            separator: default_list_separator(),
        }
    }

    pub fn compose(parts: Vec<Detail>) -> Self {
        Template::Compose {
            parts,
            separator: default_focus_separator(),
        }
    }

    pub fn custom(
        f: impl Fn(&ElementSnapshot, &ScreenDescriptor) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        Template::Custom(TemplateFn::new(f))
    }

    /// Copy with `each` loops resolved.
    pub fn expanded(&self) -> Self {
        match self {
            Template::Focus { options, shared, separator, prefix } => Template::Focus {
                options: options.iter().flat_map(FocusOption::expand).collect(),
                shared: shared.clone(),
                separator: separator.clone(),
                prefix: prefix.clone(),
            },
            Template::Highest { keys, each, text, ignore_all } => Template::Highest {
                keys: expand_keys(keys, each),
                each: Vec::new(),
                text: text.clone(),
                ignore_all: ignore_all.clone(),
            },
            Template::List { lead, keys, each, item, separator } => Template::List {
                lead: lead.clone(),
                keys: expand_keys(keys, each),
                each: Vec::new(),
                item: item.clone(),
                separator: separator.clone(),
            },
            other => other.clone(),
        }
    }

    /// Element keys this template reads, with the kind it requires if any.
    pub fn referenced_keys(&self) -> Vec<(String, Option<ElementKind>)> {
        match self {
            Template::Format { text } => placeholders(text)
                .into_iter()
                .map(|key| (key, None))
                .collect(),
            Template::Focus { options, shared, .. } => {
                let mut keys = Vec::new();
                for option in options {
                    keys.push((option.toggle.clone(), Some(ElementKind::Toggle)));
                    if let Some(label_key) = &option.label_key {
                        keys.push((label_key.clone(), Some(ElementKind::Text)));
                    }
                    keys.extend(option.details.iter().map(detail_reference));
                }
                keys.extend(shared.iter().map(detail_reference));
                keys
            }
            Template::Highest { keys, .. } => keys.iter().map(|k| (k.clone(), None)).collect(),
            Template::List { lead, keys, .. } => lead
                .iter()
                .chain(keys.iter())
                .map(|k| (k.clone(), None))
                .collect(),
            Template::Compose { parts, .. } => parts.iter().map(detail_reference).collect(),
            Template::Custom(_) => Vec::new(),
        }
    }
}

/// Render announcement text for a snapshot.
///
/// `rising` lists toggles that just turned on this pass; focus templates
/// prefer them over options that were already on.
pub fn build(
    template: &Template,
    descriptor: &ScreenDescriptor,
    snapshot: &ElementSnapshot,
    rising: &[String],
) -> Option<String> {
    let text = match template {
        Template::Format { text } => fill(text, |key| snapshot.display(key))?,

        Template::Focus { options, shared, separator, prefix } => {
            let option = options
                .iter()
                .find(|o| rising.contains(&o.toggle))
                .or_else(|| options.iter().find(|o| snapshot.toggle(&o.toggle)))?;
            let body = render_focus(option, shared, separator, snapshot)?;
            match prefix {
                Some(prefix) => format!("{}{}", prefix, body),
                None => body,
            }
        }

        Template::Highest { keys, text, ignore_all, .. } => {
            render_highest(keys, text, ignore_all.as_deref(), descriptor, snapshot)?
        }

        Template::List { lead, keys, item, separator, .. } => {
            let lead = match lead {
                Some(key) => Some(snapshot.display(key)?),
                None => None,
            };
            let items: Vec<String> = keys
                .iter()
                .filter_map(|key| {
                    let value = snapshot.display(key)?;
                    fill(item, |name| match name {
                        "label" => Some(descriptor.label_for(key).to_string()),
                        "value" => Some(value.clone()),
                        _ => None,
                    })
                })
                .collect();
            if items.is_empty() {
                return None;
            }
            match lead {
                // Questions already end in punctuation
                Some(lead) if lead.ends_with(['?', '.', '!', ':']) => {
                    format!("{} {}", lead, items.join(separator))
                }
                Some(lead) => format!("{}{}{}", lead, separator, items.join(separator)),
                None => items.join(separator),
            }
        }

        Template::Compose { parts, separator } => {
            render_details(Vec::new(), parts.iter(), snapshot)?.join(separator)
        }

        Template::Custom(f) => (f.0)(snapshot, descriptor)?,
    };

    let text = text.trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

fn render_focus(
    option: &FocusOption,
    shared: &[Detail],
    separator: &str,
    snapshot: &ElementSnapshot,
) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(label) = &option.label {
        parts.push(label.clone());
    } else if let Some(label_key) = &option.label_key {
        parts.push(snapshot.display(label_key)?);
    }

    let parts = render_details(parts, option.details.iter().chain(shared.iter()), snapshot)?;
    Some(parts.join(separator))
}

/// Append rendered details; declines when a required one is missing.
fn render_details<'a>(
    mut parts: Vec<String>,
    details: impl Iterator<Item = &'a Detail>,
    snapshot: &ElementSnapshot,
) -> Option<Vec<String>> {
    for detail in details {
        match detail {
            Detail::Text { key, optional, format } => match snapshot.display(key) {
                Some(value) => match format {
                    Some(format) => parts.push(format.replace("{value}", &value)),
                    None => parts.push(value),
                },
                None if *optional => {}
                None => return None,
            },
            Detail::Flag { key, on, off } => {
                if snapshot.toggle(key) {
                    parts.push(on.clone());
                } else if let Some(off) = off {
                    parts.push(off.clone());
                }
            }
        }
    }

    Some(parts)
}

fn render_highest(
    keys: &[String],
    text: &str,
    ignore_all: Option<&str>,
    descriptor: &ScreenDescriptor,
    snapshot: &ElementSnapshot,
) -> Option<String> {
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        values.push((key, snapshot.display(key)?));
    }

    if let Some(ignored) = ignore_all {
        if values.iter().all(|(_, v)| same_reading(v, ignored)) {
            return None;
        }
    }

    // Strictly greater, so the first declared key wins ties
    let mut best: Option<(&String, i64)> = None;
    for (key, raw) in &values {
        let number = parse_number(raw);
        if best.map_or(true, |(_, top)| number > top) {
            best = Some((*key, number));
        }
    }
    let (key, number) = best?;

    fill(text, |name| match name {
        "label" => Some(descriptor.label_for(key).to_string()),
        "value" => Some(number.to_string()),
        _ => None,
    })
}

/// Equal as numbers when both parse ("100 %" and "100.0%"), else as text.
fn same_reading(value: &str, expected: &str) -> bool {
    match (parse_decimal(value), parse_decimal(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => value == expected,
    }
}

/// Replace `{name}` placeholders; declines if any lookup misses.
fn fill(text: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 1..start + len];
        out.push_str(&lookup(name)?);
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);

    Some(out)
}

fn placeholders(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        names.push(rest[start + 1..start + len].to_string());
        rest = &rest[start + len + 1..];
    }
    names
}

fn detail_reference(detail: &Detail) -> (String, Option<ElementKind>) {
    match detail {
        Detail::Flag { .. } => (detail.key().to_string(), Some(ElementKind::Toggle)),
        Detail::Text { .. } => (detail.key().to_string(), None),
    }
}

fn expand_keys(keys: &[String], each: &[String]) -> Vec<String> {
    if each.is_empty() {
        return keys.to_vec();
    }
    keys.iter()
        .flat_map(|key| each.iter().map(move |item| expand_template(key, item)))
        .collect()
}

fn default_focus_separator() -> String {
    ", ".to_string()
}

fn default_highest_text() -> String {
    "{label}, {value}".to_string()
}

fn default_list_item() -> String {
    "{label}, {value}".to_string()
}

fn default_list_separator() -> String {
    ". ".to_string()
}
