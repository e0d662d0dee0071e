use crate::domain::model::{IngestResult, LonLat, TmaArea};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn tma_url(&self) -> &str;
    fn output_folder(&self) -> &str;
    fn fetch_epsg(&self) -> u32;
    fn retry_attempts(&self) -> u32;
    fn retry_delay_seconds(&self) -> u64;
}

/// 遠端邊界資料來源，回傳原始位元組
#[async_trait]
pub trait BoundarySource: Send + Sync {
    async fn fetch_boundaries(&self) -> Result<Vec<u8>>;
}

/// Persistence for fetched areas. Keyed by (name, effective date).
pub trait AreaStore: Send + Sync {
    fn upsert_areas(&self, areas: &[TmaArea]) -> Result<usize>;
    fn latest_effective_date(&self) -> Result<Option<NaiveDate>>;
    fn list_areas(&self, type_of_area: &str) -> Result<Vec<(i64, String)>>;
    fn area_coordinates(&self, msid: i64) -> Result<Vec<LonLat>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<TmaArea>>;
    async fn transform(&self, data: Vec<TmaArea>) -> Result<IngestResult>;
    async fn load(&self, result: IngestResult) -> Result<String>;
}
