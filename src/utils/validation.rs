use crate::utils::error::{CoordBufferError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(CoordBufferError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value
        .as_ref()
        .ok_or_else(|| CoordBufferError::MissingConfigError {
            field: field_name.to_string(),
        })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// 緩衝距離必須是有限數值（可為零或負值）
pub fn validate_finite(field_name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(CoordBufferError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must be a finite number".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("fetch.endpoint", "https://daim.lfv.se/geoserver/wfs").is_ok());
        assert!(validate_url("fetch.endpoint", "http://localhost:8080/wfs").is_ok());
        assert!(validate_url("fetch.endpoint", "").is_err());
        assert!(validate_url("fetch.endpoint", "invalid-url").is_err());
        assert!(validate_url("fetch.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("fetch.retry_attempts", 3, 1).is_ok());
        assert!(validate_positive_number("fetch.retry_attempts", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range_and_finite() {
        assert!(validate_range("buffer.mitre_limit", 2.0, 1.0, 100.0).is_ok());
        assert!(validate_range("buffer.mitre_limit", 0.5, 1.0, 100.0).is_err());
        assert!(validate_finite("buffer", -3.5).is_ok());
        assert!(validate_finite("buffer", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some(3006u32);
        let missing: Option<u32> = None;
        assert_eq!(*validate_required_field("projection.metric_epsg", &present).unwrap(), 3006);
        assert!(validate_required_field("projection.metric_epsg", &missing).is_err());
    }
}
