pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{JsonAreaStore, WfsFetcher};
pub use config::{cli::LocalStorage, Settings};

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use core::{
    airac::is_airac_current,
    etl::IngestEngine,
    ingest::TmaIngestPipeline,
    pipeline::{run_pipeline, BufferPipeline, CoordinateSource, PipelineConfig},
};
pub use utils::error::{CoordBufferError, Result};
