use crate::core::buffer::{BufferMultiplier, JoinStyle, Sided};
use crate::core::projection::ProjectionMode;
use crate::utils::error::{CoordBufferError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Optional settings file. Every section and key may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub buffer: BufferSection,
    pub projection: ProjectionSection,
    pub fetch: FetchSection,
    pub output: OutputSection,
    pub store: Option<StoreSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BufferSection {
    pub multiplier: Option<BufferMultiplier>,
    pub join_style: Option<JoinStyle>,
    pub mitre_limit: Option<f64>,
    pub sided: Option<Sided>,
    pub always_buffer: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProjectionSection {
    pub mode: Option<ProjectionMode>,
    pub metric_epsg: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub endpoint: Option<String>,
    pub epsg: Option<u32>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CoordBufferError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TMA_URL})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.fetch.endpoint {
            validation::validate_url("fetch.endpoint", endpoint)?;
        }
        if let Some(folder) = &self.output.folder {
            validation::validate_path("output.folder", folder)?;
        }
        if let Some(store) = &self.store {
            let path = validation::validate_required_field("store.path", &store.path)?;
            validation::validate_path("store.path", path)?;
        }
        if let Some(limit) = self.buffer.mitre_limit {
            validation::validate_range("buffer.mitre_limit", limit, 1.0, 100.0)?;
        }
        if let Some(attempts) = self.fetch.retry_attempts {
            validation::validate_positive_number("fetch.retry_attempts", attempts as usize, 1)?;
        }
        Ok(())
    }
}
