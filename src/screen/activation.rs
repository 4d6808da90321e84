use crate::scene::scene_model::{SceneError, SceneQuery};
use crate::screen::screen_model::{ActivationCondition, ScreenDescriptor};
use crate::state::normalize::{normalize_text, parse_number};

/// Evaluate a screen's activation predicate against the live scene.
///
/// Conditions are AND-ed in declaration order and evaluation stops at the
/// first false clause, so later clauses may assume earlier ones held.
pub fn is_active(descriptor: &ScreenDescriptor, scene: &dyn SceneQuery) -> Result<bool, SceneError> {
    for condition in &descriptor.activation {
        if !holds(condition, scene)? {
            return Ok(false);
        }
    }
    Ok(!descriptor.activation.is_empty())
}

pub fn holds(condition: &ActivationCondition, scene: &dyn SceneQuery) -> Result<bool, SceneError> {
    match condition {
        ActivationCondition::Active { path } => scene.exists_active(path),

        ActivationCondition::Inactive { path } => Ok(!scene.exists_active(path)?),

        ActivationCondition::Toggled { path } => toggled(path, scene),

        ActivationCondition::AnyActive { paths } => {
            for path in paths {
                if scene.exists_active(path)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        ActivationCondition::AnyToggled { paths } => {
            for path in paths {
                if toggled(path, scene)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }

        ActivationCondition::TextPresent { path, placeholder } => {
            Ok(active_text(path, placeholder.as_deref(), scene)?.is_some())
        }

        ActivationCondition::TextContains { path, needles } => {
            let Some(text) = active_text(path, None, scene)? else {
                return Ok(false);
            };
            Ok(needles.iter().any(|needle| text.contains(needle.as_str())))
        }

        ActivationCondition::TextLacks { path, needles } => {
            let Some(text) = active_text(path, None, scene)? else {
                return Ok(false);
            };
            Ok(!needles.iter().any(|needle| text.contains(needle.as_str())))
        }

        ActivationCondition::NumberAbove { path, min } => {
            let Some(text) = active_text(path, None, scene)? else {
                return Ok(false);
            };
            Ok(parse_number(&text) > *min)
        }
    }
}

fn toggled(path: &str, scene: &dyn SceneQuery) -> Result<bool, SceneError> {
    if !scene.exists_active(path)? {
        return Ok(false);
    }
    Ok(scene.read_toggle(path)? == Some(true))
}

fn active_text(
    path: &str,
    placeholder: Option<&str>,
    scene: &dyn SceneQuery,
) -> Result<Option<String>, SceneError> {
    if !scene.exists_active(path)? {
        return Ok(None);
    }
    Ok(scene
        .read_text(path)?
        .and_then(|raw| normalize_text(&raw, placeholder)))
}
