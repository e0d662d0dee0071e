//! Turns a WFS TMA FeatureCollection into per-area GeoJSON files and store records.

use crate::core::projection::Reprojector;
use crate::core::reader::{self, Feature};
use crate::domain::model::{Crs, IngestResult, LonLat, MetricRing, TmaArea};
use crate::domain::ports::{AreaStore, BoundarySource, ConfigProvider, Pipeline, Storage};
use crate::utils::error::{CoordBufferError, Result};
use crate::utils::names::clean_file_name;
use chrono::NaiveDate;
use geo::Coord;
use serde_json::{json, Map, Value};

/// 名稱含此標記的是彙總區域，不輸出也不入庫
const AGGREGATE_MARKER: &str = "TMA_";

pub struct TmaIngestPipeline<S: Storage, B: BoundarySource, A: AreaStore> {
    storage: S,
    source: B,
    store: A,
    fetch_crs: Crs,
    output_folder: String,
}

impl<S: Storage, B: BoundarySource, A: AreaStore> TmaIngestPipeline<S, B, A> {
    pub fn new<C: ConfigProvider>(storage: S, source: B, store: A, config: &C) -> Result<Self> {
        Ok(Self {
            storage,
            source,
            store,
            fetch_crs: Crs::from_epsg(config.fetch_epsg())?,
            output_folder: config.output_folder().to_string(),
        })
    }
}

#[async_trait::async_trait]
impl<S: Storage, B: BoundarySource, A: AreaStore> Pipeline for TmaIngestPipeline<S, B, A> {
    async fn extract(&self) -> Result<Vec<TmaArea>> {
        let body = self.source.fetch_boundaries().await?;
        let text = String::from_utf8_lossy(&body);
        parse_areas(&text)
    }

    async fn transform(&self, data: Vec<TmaArea>) -> Result<IngestResult> {
        let reprojector = if self.fetch_crs.is_geographic() {
            None
        } else {
            tracing::debug!("Fetched in {}, converting rings to EPSG:4326", self.fetch_crs);
            Some(Reprojector::new(self.fetch_crs)?)
        };

        let mut areas = Vec::with_capacity(data.len());
        let mut skipped = Vec::new();
        for mut area in data {
            area.name = clean_file_name(&area.name);
            if area.name.contains(AGGREGATE_MARKER) {
                tracing::debug!("Skipping aggregate area {}", area.name);
                skipped.push(area.name);
                continue;
            }
            if let Some(reprojector) = &reprojector {
                area.exterior = to_geographic(reprojector, &area.exterior)?;
            }
            areas.push(area);
        }

        tracing::info!("Kept {} areas, skipped {} aggregate areas", areas.len(), skipped.len());
        Ok(IngestResult { areas, skipped })
    }

    async fn load(&self, result: IngestResult) -> Result<String> {
        for area in &result.areas {
            let file_name = format!("{}.geojson", area.name);
            let document = area_feature_collection(area);
            let bytes = serde_json::to_vec_pretty(&document)?;
            self.storage.write_file(&file_name, &bytes).await?;
            tracing::debug!("Wrote {}/{}", self.output_folder, file_name);
        }

        let stored = self.store.upsert_areas(&result.areas)?;
        tracing::info!("Persisted {} areas", stored);
        Ok(self.output_folder.clone())
    }
}

fn to_geographic(reprojector: &Reprojector, exterior: &[LonLat]) -> Result<Vec<LonLat>> {
    let coords = exterior.iter().map(|p| Coord { x: p[0], y: p[1] }).collect();
    let metric = MetricRing::new(coords, reprojector.metric_crs())?;
    Ok(reprojector.unproject(&metric)?.lon_lat())
}

/// One area as a single-feature collection with a `NAMEOFAREA` property.
pub fn area_feature_collection(area: &TmaArea) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": { "NAMEOFAREA": area.name },
            "geometry": {
                "type": "Polygon",
                "coordinates": [area.exterior],
            },
        }],
    })
}

/// Parses a WFS FeatureCollection; non-Polygon features are skipped.
pub fn parse_areas(text: &str) -> Result<Vec<TmaArea>> {
    let collection = reader::parse_feature_collection(text)?;
    let mut areas = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        match feature_to_area(feature)? {
            Some(area) => areas.push(area),
            None => tracing::warn!("Feature {} is not a Polygon, skipped", index),
        }
    }

    tracing::info!("Parsed {} TMA areas", areas.len());
    Ok(areas)
}

fn feature_to_area(feature: &Feature) -> Result<Option<TmaArea>> {
    let geometry = match &feature.geometry {
        Some(geometry) if geometry.kind == "Polygon" => geometry,
        _ => return Ok(None),
    };

    let empty = Map::new();
    let props = feature.properties.as_ref().unwrap_or(&empty);
    let name = prop_string(props, "NAMEOFAREA")
        .ok_or_else(|| CoordBufferError::schema("TMA feature without NAMEOFAREA"))?;

    let exterior = reader::polygon_rings(geometry)?
        .into_iter()
        .next()
        .ok_or_else(|| CoordBufferError::schema(format!("{} has an empty polygon", name)))?;

    let mut area = TmaArea::named(name, exterior);
    area.type_of_area = prop_string(props, "TYPEOFAREA");
    area.position_indicator = prop_string(props, "POSITIONINDICATOR");
    area.wef = prop_date(props, "WEF");
    area.date_time_of_change = prop_string(props, "DATETIMEOFCHG");
    area.name_of_operator = prop_string(props, "NAMEOFOPERATOR");
    area.origin = prop_string(props, "ORIGIN");
    area.location = prop_string(props, "LOCATION");
    area.upper_limit = prop_string(props, "UPPER");
    area.lower_limit = prop_string(props, "LOWER");
    area.comment_1 = prop_string(props, "COMMENT_1");
    area.comment_2 = prop_string(props, "COMMENT_2");
    area.quality = prop_string(props, "QUALITY");
    area.crc_id = prop_string(props, "CRC_ID");
    area.crc_pos = prop_string(props, "CRC_POS");
    area.crc_tot = prop_string(props, "CRC_TOT");
    area.msid = prop_i64(props, "MSID");
    area.idnr = prop_i64(props, "IDNR");
    area.mi_style = prop_string(props, "MI_STYLE");
    Ok(Some(area))
}

/// 字串或數字都接受，空字串視為缺值
fn prop_string(props: &Map<String, Value>, key: &str) -> Option<String> {
    match props.get(key)? {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn prop_i64(props: &Map<String, Value>, key: &str) -> Option<i64> {
    match props.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn prop_date(props: &Map<String, Value>, key: &str) -> Option<NaiveDate> {
    let raw = prop_string(props, key)?;
    // 服務有時回傳 "2025-01-23Z" 或完整時間戳
    let date_part = raw.get(..10).unwrap_or(&raw);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            tracing::warn!("Ignoring unparseable {} value '{}'", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WFS_BODY: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "properties": {"NAMEOFAREA": "Göteborg TMA", "TYPEOFAREA": "TMAW",
                            "WEF": "2025-01-23Z", "MSID": 101, "IDNR": "7", "UPPER": "FL 95"},
             "geometry": {"type": "Polygon",
                          "coordinates": [[[11.5, 57.5], [12.5, 57.5], [12.5, 58.0], [11.5, 57.5]]]}},
            {"type": "Feature",
             "properties": {"NAMEOFAREA": "TMA Sverige"},
             "geometry": {"type": "Polygon",
                          "coordinates": [[[11.0, 55.0], [24.0, 55.0], [24.0, 69.0], [11.0, 55.0]]]}},
            {"type": "Feature",
             "properties": {"NAMEOFAREA": "Point feature"},
             "geometry": {"type": "Point", "coordinates": [15.0, 60.0]}}
        ]
    }"#;

    #[test]
    fn test_parse_areas_reads_properties() {
        let areas = parse_areas(WFS_BODY).unwrap();
        assert_eq!(areas.len(), 2);

        let goteborg = &areas[0];
        assert_eq!(goteborg.name, "Göteborg TMA");
        assert_eq!(goteborg.type_of_area.as_deref(), Some("TMAW"));
        assert_eq!(goteborg.wef, NaiveDate::from_ymd_opt(2025, 1, 23));
        assert_eq!(goteborg.msid, Some(101));
        assert_eq!(goteborg.idnr, Some(7));
        assert_eq!(goteborg.upper_limit.as_deref(), Some("FL 95"));
        assert_eq!(goteborg.exterior.len(), 4);
    }

    #[test]
    fn test_parse_areas_requires_name() {
        let body = r#"{"type": "FeatureCollection", "features": [
            {"type": "Feature", "properties": {},
             "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}}
        ]}"#;
        assert!(matches!(
            parse_areas(body).unwrap_err(),
            CoordBufferError::SchemaError { .. }
        ));
    }

    #[test]
    fn test_bad_wef_is_dropped() {
        let mut props = Map::new();
        props.insert("WEF".to_string(), Value::String("next week".to_string()));
        assert_eq!(prop_date(&props, "WEF"), None);
    }

    #[test]
    fn test_feature_collection_shape() {
        let area = TmaArea::named("KIRUNA", vec![[20.0, 67.5], [21.0, 67.5], [21.0, 68.0], [20.0, 67.5]]);
        let doc = area_feature_collection(&area);
        assert_eq!(doc["features"][0]["properties"]["NAMEOFAREA"], "KIRUNA");
        assert_eq!(doc["features"][0]["geometry"]["coordinates"][0][1][0], 21.0);
    }
}
