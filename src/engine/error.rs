use thiserror::Error;

#[derive(Debug, Error)]
pub enum NarrationError {
    /// Descriptor, scenario or config file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// YAML document did not match the expected shape
    #[error("invalid YAML ({context}): {source}")]
    Yaml {
        context: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Descriptor failed validation at registration
    #[error("screen '{screen}' is invalid: {reason}")]
    InvalidDescriptor { screen: String, reason: String },

    #[error("screen '{0}' is already registered")]
    DuplicateScreen(String),

    #[error("unknown screen '{0}'")]
    UnknownScreen(String),

    /// Key pressed with no binding in the config
    #[error("no binding for key '{0}'")]
    UnknownBinding(String),

    /// Trace file could not be opened
    #[error("trace file {path}: {source}")]
    Trace {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl NarrationError {
    pub fn invalid(screen: &str, reason: impl Into<String>) -> Self {
        NarrationError::InvalidDescriptor {
            screen: screen.to_string(),
            reason: reason.into(),
        }
    }
}
