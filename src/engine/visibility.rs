use tracing::debug;

use crate::scene::scene_model::SceneOverride;
use crate::screen::screen_model::VisibilitySpec;

/// Raise every target below the threshold to its configured opacity.
///
/// Returns how many elements were changed. Missing elements are skipped.
pub fn enforce(spec: &VisibilitySpec, scene: &mut dyn SceneOverride) -> usize {
    let mut changed = 0;
    for target in &spec.targets {
        let Some(current) = scene.opacity(&target.path) else {
            continue;
        };
        if current < spec.min_opacity && scene.set_opacity(&target.path, target.opacity) {
            debug!(path = %target.path, from = current, to = target.opacity, "opacity raised");
            changed += 1;
        }
    }
    changed
}

/// Make every target fully transparent.
pub fn hide(spec: &VisibilitySpec, scene: &mut dyn SceneOverride) -> usize {
    spec.targets
        .iter()
        .filter(|target| scene.set_opacity(&target.path, 0.0))
        .count()
}
