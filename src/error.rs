use thiserror::Error;

/// Coverage map error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HeatmapError {
    #[error("Malformed sample data: {0}")]
    DataFormat(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for coverage map operations
pub type HResult<T> = Result<T, HeatmapError>;

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::DataFormat(err.to_string())
    }
}

impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_are_data_format() {
        let err = serde_json::from_str::<Vec<u32>>("[1, 2").unwrap_err();
        let mapped: HeatmapError = err.into();
        assert!(matches!(mapped, HeatmapError::DataFormat(_)));
    }

    #[test]
    fn test_io_errors_are_io() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.json");
        let mapped: HeatmapError = err.into();
        assert!(matches!(mapped, HeatmapError::Io(_)));
        assert!(mapped.to_string().contains("missing.json"));
    }
}
