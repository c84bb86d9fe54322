pub mod model;

pub use model::*;

/// Common error types
#[derive(thiserror::Error, Debug)]
pub enum BrainError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed element tree: {0}")]
    MalformedTree(String),

    #[error("Malformed stylesheet: {0}")]
    MalformedStylesheet(String),

    #[error("No reference components of type '{component_type}' exist in the model")]
    NoExemplars { component_type: String },

    #[error("Unsupported model version {found} (expected {expected})")]
    UnsupportedVersion { found: String, expected: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BrainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_exemplars_message_names_type() {
        let err = BrainError::NoExemplars {
            component_type: "table".to_string(),
        };
        assert!(err.to_string().contains("'table'"));
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(read(), Err(BrainError::Io(_))));
    }
}
