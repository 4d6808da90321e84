use std::path::Path;

use crate::engine::error::NarrationError;
use crate::screen::screen_model::{ScreenCatalog, ScreenDescriptor};

const QUIZ_SHOW: &str = include_str!("../../catalog/quiz_show.yaml");

/// Descriptors shipped with the binary, for the quiz-show host.
pub fn builtin() -> Result<Vec<ScreenDescriptor>, NarrationError> {
    parse_catalog(QUIZ_SHOW, "builtin catalog")
}

pub fn parse_catalog(content: &str, context: &str) -> Result<Vec<ScreenDescriptor>, NarrationError> {
    let catalog: ScreenCatalog =
        serde_yaml::from_str(content).map_err(|source| NarrationError::Yaml {
            context: context.to_string(),
            source,
        })?;
    Ok(catalog.screens)
}

/// Load descriptors from a catalog file or a directory of catalog files.
///
/// Directory entries are read in file-name order; screens keep the order
/// they are declared in within each file.
pub fn load_descriptors(path: &str) -> Result<Vec<ScreenDescriptor>, NarrationError> {
    let io_err = |source| NarrationError::Io {
        path: path.to_string(),
        source,
    };

    let metadata = std::fs::metadata(path).map_err(io_err)?;
    if !metadata.is_dir() {
        return load_file(Path::new(path));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(io_err)? {
        let p = entry.map_err(io_err)?.path();
        if p.extension().map_or(false, |e| e == "yaml" || e == "yml") {
            files.push(p);
        }
    }
    files.sort();

    let mut screens = Vec::new();
    for file in files {
        screens.extend(load_file(&file)?);
    }
    Ok(screens)
}

fn load_file(path: &Path) -> Result<Vec<ScreenDescriptor>, NarrationError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| NarrationError::Io {
        path: display.clone(),
        source,
    })?;
    parse_catalog(&content, &display)
}
