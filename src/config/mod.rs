pub mod cli;
pub mod toml_config;

use crate::adapters::http::DEFAULT_TMA_URL;
use crate::adapters::store::DEFAULT_STORE_PATH;
use crate::core::pipeline::PipelineConfig;
use crate::core::ConfigProvider;
use crate::domain::model::Crs;
use crate::utils::error::{CoordBufferError, Result};
use crate::utils::validation::{self, Validate};
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_FOLDER: &str = "POLYGONES";

/// Fully resolved settings for one run: defaults, then file, then flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub tma_url: String,
    pub fetch_epsg: u32,
    pub retry_attempts: u32,
    pub retry_delay_seconds: u64,
    pub output_folder: String,
    pub store_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            tma_url: DEFAULT_TMA_URL.to_string(),
            fetch_epsg: 4326,
            retry_attempts: 3,
            retry_delay_seconds: 2,
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
            store_path: DEFAULT_STORE_PATH.to_string(),
        }
    }
}

impl Settings {
    pub fn from_toml(file: &TomlConfig) -> Self {
        let mut settings = Self::default();
        let pipeline = &mut settings.pipeline;

        if let Some(multiplier) = file.buffer.multiplier {
            pipeline.multiplier = multiplier;
        }
        if let Some(join_style) = file.buffer.join_style {
            pipeline.join_style = join_style;
        }
        if let Some(sided) = file.buffer.sided {
            pipeline.sided = sided;
        }
        if file.buffer.mitre_limit.is_some() {
            pipeline.mitre_limit = file.buffer.mitre_limit;
        }
        if let Some(always) = file.buffer.always_buffer {
            pipeline.always_buffer = always;
        }
        if let Some(mode) = file.projection.mode {
            pipeline.projection = mode;
        }
        if let Some(epsg) = file.projection.metric_epsg {
            pipeline.metric_epsg = epsg;
        }

        if let Some(endpoint) = &file.fetch.endpoint {
            settings.tma_url = endpoint.clone();
        }
        if let Some(epsg) = file.fetch.epsg {
            settings.fetch_epsg = epsg;
        }
        if let Some(attempts) = file.fetch.retry_attempts {
            settings.retry_attempts = attempts;
        }
        if let Some(delay) = file.fetch.retry_delay_seconds {
            settings.retry_delay_seconds = delay;
        }
        if let Some(folder) = &file.output.folder {
            settings.output_folder = folder.clone();
        }
        if let Some(path) = file.store.as_ref().and_then(|s| s.path.clone()) {
            settings.store_path = path;
        }
        settings
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        validation::validate_url("fetch.endpoint", &self.tma_url)?;
        validation::validate_path("output.folder", &self.output_folder)?;
        validation::validate_path("store.path", &self.store_path)?;
        validation::validate_positive_number("fetch.retry_attempts", self.retry_attempts as usize, 1)?;

        let crs = Crs::from_epsg(self.fetch_epsg).map_err(|_| {
            CoordBufferError::InvalidConfigValueError {
                field: "fetch.epsg".to_string(),
                value: self.fetch_epsg.to_string(),
                reason: "Supported CRSs are EPSG:4326, EPSG:3006 and UTM (326xx/327xx)".to_string(),
            }
        })?;
        tracing::debug!("Boundaries will be fetched in {}", crs);
        Ok(())
    }
}

impl ConfigProvider for Settings {
    fn tma_url(&self) -> &str {
        &self.tma_url
    }

    fn output_folder(&self) -> &str {
        &self.output_folder
    }

    fn fetch_epsg(&self) -> u32 {
        self.fetch_epsg
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay_seconds(&self) -> u64 {
        self.retry_delay_seconds
    }
}

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::Settings;
    use crate::core::buffer::{BufferMultiplier, JoinStyle, Sided};
    use crate::core::projection::ProjectionMode;
    use crate::core::reader::InputFormat;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "coord-buffer")]
    #[command(about = "Buffer TMA boundaries and print them as DMS coordinates")]
    pub struct CliConfig {
        /// GeoJSON or DMS coordinate file to buffer
        pub input: Option<String>,

        /// Buffer distance in nautical miles (negative shrinks)
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        pub buffer: f64,

        #[arg(short, long, value_enum, default_value_t = InputFormat::Auto)]
        pub format: InputFormat,

        /// Exit 0 if this AIRAC date (YYYY-MM-DD) is current, 1 otherwise
        #[arg(long, value_name = "DATE")]
        pub check_airac: Option<String>,

        /// List stored TMAW areas as "MSID: NAME"
        #[arg(long)]
        pub list: bool,

        /// Buffer the stored area with this MSID
        #[arg(long)]
        pub msid: Option<i64>,

        /// Optional TOML settings file
        #[arg(short, long)]
        pub config: Option<String>,

        #[arg(long, value_enum)]
        pub multiplier: Option<BufferMultiplier>,

        #[arg(long, value_enum)]
        pub join: Option<JoinStyle>,

        #[arg(long, value_enum)]
        pub sided: Option<Sided>,

        #[arg(long, value_enum)]
        pub projection: Option<ProjectionMode>,

        /// Metric CRS used with --projection fixed
        #[arg(long)]
        pub metric_epsg: Option<u32>,

        #[arg(long)]
        pub mitre_limit: Option<f64>,

        /// Run the buffer step even for a zero distance
        #[arg(long)]
        pub always_buffer: bool,

        #[arg(long, env = "TMA_URL")]
        pub tma_url: Option<String>,

        #[arg(long, env = "OUTPUT_FOLDER")]
        pub output_folder: Option<String>,

        /// JSON area store
        #[arg(long, env = "COORD_BUFFER_STORE")]
        pub store: Option<String>,

        #[arg(short, long, help = "Enable verbose output")]
        pub verbose: bool,

        /// Log as JSON lines instead of compact text
        #[arg(long)]
        pub log_json: bool,

        /// Log CPU and memory per ingest phase
        #[arg(long)]
        pub monitor: bool,
    }

    impl CliConfig {
        /// Flags and environment win over file values.
        pub fn apply_to(&self, settings: &mut Settings) {
            let pipeline = &mut settings.pipeline;
            if let Some(multiplier) = self.multiplier {
                pipeline.multiplier = multiplier;
            }
            if let Some(join) = self.join {
                pipeline.join_style = join;
            }
            if let Some(sided) = self.sided {
                pipeline.sided = sided;
            }
            if let Some(mode) = self.projection {
                pipeline.projection = mode;
            }
            if let Some(epsg) = self.metric_epsg {
                pipeline.metric_epsg = epsg;
            }
            if self.mitre_limit.is_some() {
                pipeline.mitre_limit = self.mitre_limit;
            }
            if self.always_buffer {
                pipeline.always_buffer = true;
            }
            if let Some(url) = &self.tma_url {
                settings.tma_url = url.clone();
            }
            if let Some(folder) = &self.output_folder {
                settings.output_folder = folder.clone();
            }
            if let Some(store) = &self.store {
                settings.store_path = store.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::buffer::{JoinStyle, Sided};
    use crate::core::projection::ProjectionMode;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.tma_url, "https://daim.lfv.se/geoserver/wfs");
        assert_eq!(settings.output_folder, "POLYGONES");
        assert_eq!(settings.retry_attempts, 3);
        assert_eq!(settings.retry_delay_seconds, 2);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let file = TomlConfig::from_toml_str(
            r#"
[buffer]
join_style = "bevel"
sided = "symmetric"

[projection]
mode = "utm"

[fetch]
epsg = 3006

[store]
path = "areas.json"
"#,
        )
        .unwrap();
        let settings = Settings::from_toml(&file);
        assert_eq!(settings.pipeline.join_style, JoinStyle::Bevel);
        assert_eq!(settings.pipeline.sided, Sided::Symmetric);
        assert_eq!(settings.pipeline.projection, ProjectionMode::Utm);
        assert_eq!(settings.fetch_epsg, 3006);
        assert_eq!(settings.store_path, "areas.json");
        assert_eq!(settings.output_folder, DEFAULT_OUTPUT_FOLDER);
    }

    #[test]
    fn test_validation_rejects_unsupported_fetch_crs() {
        let settings = Settings {
            fetch_epsg: 3857,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_flags_override_file() {
        use clap::Parser;

        let file = TomlConfig::from_toml_str("[buffer]\njoin_style = \"round\"\n").unwrap();
        let mut settings = Settings::from_toml(&file);
        let cli = CliConfig::parse_from([
            "coord-buffer",
            "area.geojson",
            "--buffer",
            "-2.5",
            "--join",
            "bevel",
            "--store",
            "custom.json",
        ]);
        cli.apply_to(&mut settings);

        assert_eq!(cli.buffer, -2.5);
        assert_eq!(cli.input.as_deref(), Some("area.geojson"));
        assert_eq!(settings.pipeline.join_style, JoinStyle::Bevel);
        assert_eq!(settings.store_path, "custom.json");
    }
}
