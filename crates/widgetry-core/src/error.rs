use thiserror::Error;

/// Top-level error type for the Widgetry system.
///
/// Each variant carries a subsystem message. Subsystem crates define their
/// own error types and implement `From<SubsystemError> for WidgetryError` so
/// that the `?` operator works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WidgetryError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Window error: {0}")]
    Window(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for WidgetryError {
    fn from(err: toml::de::Error) -> Self {
        WidgetryError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for WidgetryError {
    fn from(err: toml::ser::Error) -> Self {
        WidgetryError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for WidgetryError {
    fn from(err: serde_json::Error) -> Self {
        WidgetryError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Widgetry operations.
pub type Result<T> = std::result::Result<T, WidgetryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(WidgetryError, &str)> = vec![
            (
                WidgetryError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                WidgetryError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                WidgetryError::WindowCreation("no display".to_string()),
                "Window creation failed: no display",
            ),
            (
                WidgetryError::Window("channel closed".to_string()),
                "Window error: channel closed",
            ),
            (
                WidgetryError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WidgetryError = io_err.into();
        assert!(matches!(err, WidgetryError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: WidgetryError = err.unwrap_err().into();
        assert!(matches!(err, WidgetryError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: WidgetryError = err.unwrap_err().into();
        assert!(matches!(err, WidgetryError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(format!("got {}", value))
        }

        assert_eq!(inner().unwrap(), "got 42");
    }
}
