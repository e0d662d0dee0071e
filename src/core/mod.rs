pub mod airac;
pub mod buffer;
pub mod dms;
pub mod etl;
pub mod ingest;
pub mod pipeline;
pub mod projection;
pub mod reader;

pub use crate::domain::model::{GeoRing, IngestResult, MetricRing, TmaArea};
pub use crate::domain::ports::{AreaStore, BoundarySource, ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
