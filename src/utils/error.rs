use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoordBufferError {
    #[error("Invalid DMS format: {message}")]
    FormatError { message: String },

    #[error("Invalid GeoJSON: {message}")]
    SchemaError { message: String },

    #[error("Projection failed: {message}")]
    ProjectionError { message: String },

    #[error("Degenerate geometry: {message}")]
    DegenerateGeometryError { message: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Store error: {message}")]
    StoreError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Geometry,
    Network,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// CLI 退出碼
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Medium => 2,   // 網路錯誤，可重試
            Self::High => 1,     // 輸入、幾何或設定錯誤
            Self::Critical => 3, // 檔案或資料庫錯誤
        }
    }
}

impl CoordBufferError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::FormatError {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaError {
            message: message.into(),
        }
    }

    pub fn projection(message: impl Into<String>) -> Self {
        Self::ProjectionError {
            message: message.into(),
        }
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateGeometryError {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FormatError { .. } | Self::SchemaError { .. } | Self::ValidationError { .. } => {
                ErrorCategory::Input
            }
            Self::ProjectionError { .. } | Self::DegenerateGeometryError { .. } => {
                ErrorCategory::Geometry
            }
            Self::ApiError(_) => ErrorCategory::Network,
            Self::IoError(_) | Self::SerializationError(_) | Self::StoreError { .. } => {
                ErrorCategory::Storage
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Geometry => ErrorSeverity::High,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::FormatError { .. } => {
                "Each line must hold a latitude token DDMMSS[N|S] and a longitude token DDDMMSS[E|W]"
            }
            Self::SchemaError { .. } => {
                "Provide a GeoJSON FeatureCollection whose features are all Polygons"
            }
            Self::ProjectionError { .. } => {
                "Check the coordinates, or switch to --projection utm for areas far from the metric CRS"
            }
            Self::DegenerateGeometryError { .. } => {
                "Use a smaller negative buffer or check that the ring is a simple polygon"
            }
            Self::ApiError(_) => "Check network connectivity and the TMA_URL endpoint",
            Self::IoError(_) => "Check that the path exists and is readable/writable",
            Self::SerializationError(_) => "The data is not valid JSON",
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file or command-line flags",
            Self::StoreError { .. } => "Run without an input file first to populate the area store",
            Self::ValidationError { .. } => "Check the command-line arguments",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Input could not be read: {}", self),
            ErrorCategory::Geometry => format!("Geometry could not be processed: {}", self),
            ErrorCategory::Network => format!("Could not fetch TMA data: {}", self),
            ErrorCategory::Storage => format!("Storage failure: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoordBufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_exit_with_input_code() {
        let errors = [
            CoordBufferError::format("x"),
            CoordBufferError::schema("x"),
            CoordBufferError::projection("x"),
            CoordBufferError::degenerate("x"),
        ];
        for e in &errors {
            assert_eq!(e.severity(), ErrorSeverity::High, "{e}");
            assert_eq!(e.severity().exit_code(), 1);
        }
    }

    #[test]
    fn test_exit_codes_by_severity() {
        assert_eq!(ErrorSeverity::Medium.exit_code(), 2);
        assert_eq!(CoordBufferError::store("locked").severity().exit_code(), 3);
        let io = CoordBufferError::from(std::io::Error::other("disk full"));
        assert_eq!(io.severity().exit_code(), 3);
        let config = CoordBufferError::MissingConfigError {
            field: "tma_url".to_string(),
        };
        assert_eq!(config.severity().exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let e = CoordBufferError::schema("GeoJSON file has no features");
        assert_eq!(e.to_string(), "Invalid GeoJSON: GeoJSON file has no features");
        assert_eq!(e.category(), ErrorCategory::Input);
    }
}
