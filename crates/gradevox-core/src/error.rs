use thiserror::Error;

/// Top-level error type for the gradevox system.
///
/// Parsing and name resolution never produce errors; their failures are
/// tagged outcomes. This type covers configuration, host-side edit
/// application and engine plumbing.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GradevoxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Roster error: {0}")]
    Roster(String),

    #[error("Row {index} is out of range for a roster of {len} rows")]
    RowOutOfRange { index: usize, len: usize },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Edit sink error: {0}")]
    Sink(String),

    #[error("Dictation error: {0}")]
    Dictation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for GradevoxError {
    fn from(err: toml::de::Error) -> Self {
        GradevoxError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GradevoxError {
    fn from(err: toml::ser::Error) -> Self {
        GradevoxError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for GradevoxError {
    fn from(err: serde_json::Error) -> Self {
        GradevoxError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for gradevox operations.
pub type Result<T> = std::result::Result<T, GradevoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let cases: Vec<(GradevoxError, &str)> = vec![
            (
                GradevoxError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                GradevoxError::Roster("duplicate row".to_string()),
                "Roster error: duplicate row",
            ),
            (
                GradevoxError::RowOutOfRange { index: 7, len: 3 },
                "Row 7 is out of range for a roster of 3 rows",
            ),
            (
                GradevoxError::UnknownColumn("Quiz 9".to_string()),
                "Unknown column: Quiz 9",
            ),
            (
                GradevoxError::Sink("read only".to_string()),
                "Edit sink error: read only",
            ),
            (
                GradevoxError::Dictation("already listening".to_string()),
                "Dictation error: already listening",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "roster.json");
        let err: GradevoxError = io_err.into();
        assert!(matches!(err, GradevoxError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("roster.json"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: GradevoxError = err.unwrap_err().into();
        assert!(matches!(err, GradevoxError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: GradevoxError = err.unwrap_err().into();
        assert!(matches!(err, GradevoxError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<u32> {
            let parsed: std::result::Result<u32, std::io::Error> = Ok(42);
            Ok(parsed? + 1)
        }

        assert_eq!(inner().unwrap(), 43);
    }
}
