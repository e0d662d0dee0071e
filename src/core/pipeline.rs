use crate::core::buffer::{self, BufferMultiplier, BufferParams, JoinStyle, Sided};
use crate::core::dms;
use crate::core::projection::{self, ProjectionMode, Reprojector};
use crate::core::reader::{self, InputFormat};
use crate::domain::model::{Crs, GeoRing, LonLat};
use crate::domain::ports::Storage;
use crate::utils::error::{CoordBufferError, Result};
use crate::utils::validation::{self, Validate};

/// Every knob of the buffer pipeline, passed in explicitly per run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub multiplier: BufferMultiplier,
    pub join_style: JoinStyle,
    /// `None` uses the default of the chosen [`Sided`] mode
    pub mitre_limit: Option<f64>,
    pub sided: Sided,
    pub projection: ProjectionMode,
    /// Metric CRS for [`ProjectionMode::Fixed`]
    pub metric_epsg: u32,
    /// Run the buffer step even for a zero distance
    pub always_buffer: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            multiplier: BufferMultiplier::Nautical,
            join_style: JoinStyle::Mitre,
            mitre_limit: None,
            sided: Sided::Single,
            projection: ProjectionMode::Fixed,
            metric_epsg: 3006,
            always_buffer: false,
        }
    }
}

impl PipelineConfig {
    pub fn buffer_params(&self, buffer_nm: f64) -> BufferParams {
        let params = BufferParams::new(
            buffer::nm_to_meters(buffer_nm, self.multiplier),
            self.join_style,
            self.sided,
        );
        match self.mitre_limit {
            Some(limit) => params.with_mitre_limit(limit),
            None => params,
        }
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.projection == ProjectionMode::Fixed {
            let crs = Crs::from_epsg(self.metric_epsg).map_err(|_| {
                CoordBufferError::InvalidConfigValueError {
                    field: "projection.metric_epsg".to_string(),
                    value: self.metric_epsg.to_string(),
                    reason: "Supported metric CRSs are EPSG:3006 and UTM (326xx/327xx)".to_string(),
                }
            })?;
            if crs.is_geographic() {
                return Err(CoordBufferError::InvalidConfigValueError {
                    field: "projection.metric_epsg".to_string(),
                    value: self.metric_epsg.to_string(),
                    reason: "Buffering needs a metric CRS".to_string(),
                });
            }
        }
        if let Some(limit) = self.mitre_limit {
            validation::validate_range("buffer.mitre_limit", limit, 1.0, 100.0)?;
        }
        Ok(())
    }
}

/// Where the boundary coordinates come from.
#[derive(Debug, Clone)]
pub enum CoordinateSource {
    GeoJson(String),
    DmsLines(String),
    /// Already decoded [lon, lat] vertices, e.g. from the area store
    LonLat(Vec<LonLat>),
}

impl CoordinateSource {
    pub fn from_text(format: InputFormat, path: &str, text: String) -> Self {
        match format.resolve(path) {
            InputFormat::GeoJson => Self::GeoJson(text),
            _ => Self::DmsLines(text),
        }
    }

    /// Reads `path` through `storage`; the format is resolved from the extension
    /// unless forced.
    pub async fn load<S: Storage>(storage: &S, format: InputFormat, path: &str) -> Result<Self> {
        let bytes = storage.read_file(path).await?;
        let text = String::from_utf8(bytes).map_err(|_| CoordBufferError::ValidationError {
            message: format!("Input file is not valid UTF-8: {}", path),
        })?;
        Ok(Self::from_text(format, path, text))
    }

    pub fn read_ring(&self) -> Result<GeoRing> {
        match self {
            Self::GeoJson(text) => GeoRing::from_lon_lat(&reader::read_geojson(text)?),
            Self::DmsLines(text) => GeoRing::from_lat_lon(&reader::read_dms_lines(text)?),
            Self::LonLat(points) => GeoRing::from_lon_lat(points),
        }
    }
}

pub struct BufferPipeline {
    config: PipelineConfig,
}

impl BufferPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Geographic ring in, buffered geographic ring out.
    pub fn buffer_ring(&self, ring: &GeoRing, buffer_nm: f64) -> Result<GeoRing> {
        let crs = projection::metric_crs_for(self.config.projection, self.config.metric_epsg, ring)?;
        let reprojector = Reprojector::new(crs)?;
        tracing::debug!("Reprojecting {} vertices to {}", ring.line_string().0.len(), crs);

        let metric = reprojector.project(ring)?;
        let metric = if buffer_nm != 0.0 || self.config.always_buffer {
            let params = self.config.buffer_params(buffer_nm);
            tracing::debug!(
                "Buffering {} NM ({:.1} m, {:?}, {:?}, mitre limit {})",
                buffer_nm,
                params.distance,
                params.join_style,
                params.sided,
                params.mitre_limit
            );
            buffer::buffer_ring(&metric, &params)?
        } else {
            metric
        };

        reprojector.unproject(&metric)
    }

    /// Runs the whole chain and returns one DMS pair per vertex, in ring order.
    pub fn run(&self, source: &CoordinateSource, buffer_nm: f64) -> Result<Vec<String>> {
        validation::validate_finite("buffer", buffer_nm)?;
        let ring = source.read_ring()?;
        let buffered = self.buffer_ring(&ring, buffer_nm)?;

        Ok(buffered
            .lat_lon()
            .into_iter()
            .map(|(lat, lon)| dms::format_pair(lat, lon))
            .collect())
    }
}

pub fn run_pipeline(
    source: &CoordinateSource,
    buffer_nm: f64,
    config: &PipelineConfig,
) -> Result<Vec<String>> {
    BufferPipeline::new(config.clone()).run(source, buffer_nm)
}
