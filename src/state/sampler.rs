use crate::scene::scene_model::{SceneError, SceneQuery};
use crate::screen::screen_model::{ElementKind, ScreenDescriptor};
use crate::state::normalize::normalize_text;
use crate::state::state_model::{ElementSnapshot, SampledValue};

/// Read every declared element of a screen into a fresh snapshot.
///
/// Missing or inactive elements are not errors: text elements are left out
/// of the snapshot and toggles read as `false`. Only a scene that cannot
/// answer at all produces an error, and then no partial snapshot is kept.
pub fn sample(
    descriptor: &ScreenDescriptor,
    scene: &dyn SceneQuery,
) -> Result<ElementSnapshot, SceneError> {
    let mut snapshot = ElementSnapshot::new();

    for element in &descriptor.elements {
        match element.kind {
            ElementKind::Text => {
                let Some(path) = element.path.as_deref() else {
                    continue;
                };
                if !scene.exists_active(path)? {
                    continue;
                }
                let text = scene
                    .read_text(path)?
                    .and_then(|raw| normalize_text(&raw, element.placeholder.as_deref()));
                if let Some(text) = text {
                    snapshot.insert(&element.key, SampledValue::Text(text));
                }
            }
            ElementKind::Toggle => {
                let on = match element.path.as_deref() {
                    Some(path) => scene.exists_active(path)? && scene.read_toggle(path)? == Some(true),
                    None => false,
                };
                snapshot.insert(&element.key, SampledValue::Toggle(on));
            }
            ElementKind::Count => {
                let count = scene.count_active(&element.paths)?;
                snapshot.insert(&element.key, SampledValue::Count(count));
            }
        }
    }

    Ok(snapshot)
}
