use coord_buffer::core::{AreaStore, BoundarySource};
use coord_buffer::{
    is_airac_current, CoordBufferError, IngestEngine, JsonAreaStore, LocalStorage, Settings,
    TmaIngestPipeline, WfsFetcher,
};
use httpmock::prelude::*;
use std::time::Duration;
use tempfile::TempDir;

fn wfs_body() -> serde_json::Value {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": {
                    "NAMEOFAREA": "Kiruna TMA",
                    "TYPEOFAREA": "TMAW",
                    "WEF": "2025-01-23",
                    "MSID": 11,
                    "UPPER": "FL 95",
                    "LOWER": "1500 ft MSL"
                },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[20.0, 67.5], [21.0, 67.5], [21.0, 68.0], [20.0, 67.5]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAMEOFAREA": "Åre Östersund", "TYPEOFAREA": "TMAW", "WEF": "2025-02-20", "MSID": 12},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[13.5, 63.0], [14.5, 63.0], [14.5, 63.5], [13.5, 63.0]]]
                }
            },
            {
                "type": "Feature",
                "properties": {"NAMEOFAREA": "TMA Sweden", "TYPEOFAREA": "TMAS", "WEF": "2025-02-20"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[11.0, 55.0], [24.0, 55.0], [24.0, 69.0], [11.0, 55.0]]]
                }
            }
        ]
    })
}

fn settings_for(server: &MockServer, dir: &TempDir) -> Settings {
    Settings {
        tma_url: server.url("/geoserver/wfs"),
        retry_delay_seconds: 0,
        output_folder: dir.path().join("POLYGONES").to_string_lossy().into_owned(),
        store_path: dir.path().join("areas.json").to_string_lossy().into_owned(),
        ..Settings::default()
    }
}

#[tokio::test]
async fn test_fetch_split_and_persist() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let wfs_mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/geoserver/wfs")
                .query_param("service", "WFS")
                .query_param("version", "1.1.0")
                .query_param("request", "GetFeature")
                .query_param("typename", "mais:TMAS,mais:TMAW")
                .query_param("outputFormat", "application/json")
                .query_param("srsName", "EPSG:4326");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(wfs_body());
        })
        .await;

    let settings = settings_for(&server, &dir);
    let storage = LocalStorage::new(&settings.output_folder);
    let fetcher = WfsFetcher::from_config(&settings);
    let store = JsonAreaStore::new(&settings.store_path);
    let pipeline = TmaIngestPipeline::new(storage, fetcher, store, &settings).unwrap();

    let output = IngestEngine::new(pipeline).run().await.unwrap();
    wfs_mock.assert_async().await;
    assert_eq!(output, settings.output_folder);

    let folder = dir.path().join("POLYGONES");
    assert!(folder.join("KIRUNA_TMA.geojson").exists());
    assert!(folder.join("ARE_OSTERSUND.geojson").exists());
    // 彙總區域不輸出
    assert!(!folder.join("TMA_SWEDEN.geojson").exists());

    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(folder.join("KIRUNA_TMA.geojson")).unwrap()).unwrap();
    assert_eq!(written["features"][0]["properties"]["NAMEOFAREA"], "KIRUNA_TMA");
    assert_eq!(written["features"][0]["geometry"]["type"], "Polygon");

    let store = JsonAreaStore::new(&settings.store_path);
    let listed = store.list_areas("TMAW").unwrap();
    assert_eq!(
        listed,
        vec![(12, "ARE_OSTERSUND".to_string()), (11, "KIRUNA_TMA".to_string())]
    );
    assert!(store.list_areas("TMAS").is_err());
    assert!(is_airac_current(&store, "2025-02-20").unwrap());
    assert!(!is_airac_current(&store, "2025-01-23").unwrap());
}

#[tokio::test]
async fn test_ingest_twice_replaces_records() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    let wfs_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/geoserver/wfs");
            then.status(200).json_body(wfs_body());
        })
        .await;

    let settings = settings_for(&server, &dir);
    for _ in 0..2 {
        let pipeline = TmaIngestPipeline::new(
            LocalStorage::new(&settings.output_folder),
            WfsFetcher::from_config(&settings),
            JsonAreaStore::new(&settings.store_path),
            &settings,
        )
        .unwrap();
        IngestEngine::new(pipeline).run().await.unwrap();
    }

    wfs_mock.assert_hits_async(2).await;
    let store = JsonAreaStore::new(&settings.store_path);
    assert_eq!(store.list_areas("TMAW").unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_in_metric_crs_is_converted_to_wgs84() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    // SWEREF 99 TM 座標，約在北緯 59.6 度、東經 17.9 度附近
    let body = serde_json::json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"NAMEOFAREA": "Arlanda", "TYPEOFAREA": "TMAW", "MSID": 1},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[660000.0, 6610000.0], [680000.0, 6610000.0],
                                 [680000.0, 6630000.0], [660000.0, 6610000.0]]]
            }
        }]
    });
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geoserver/wfs").query_param("srsName", "EPSG:3006");
            then.status(200).json_body(body);
        })
        .await;

    let settings = Settings {
        fetch_epsg: 3006,
        ..settings_for(&server, &dir)
    };
    let pipeline = TmaIngestPipeline::new(
        LocalStorage::new(&settings.output_folder),
        WfsFetcher::from_config(&settings),
        JsonAreaStore::new(&settings.store_path),
        &settings,
    )
    .unwrap();
    IngestEngine::new(pipeline).run().await.unwrap();

    let coords = JsonAreaStore::new(&settings.store_path).area_coordinates(1).unwrap();
    assert_eq!(coords.len(), 4);
    for [lon, lat] in coords {
        assert!((17.0..19.0).contains(&lon), "lon {lon}");
        assert!((59.0..60.5).contains(&lat), "lat {lat}");
    }
}

#[tokio::test]
async fn test_fetch_retries_then_fails() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(GET).path("/geoserver/wfs");
            then.status(500);
        })
        .await;

    let fetcher = WfsFetcher::new(server.url("/geoserver/wfs"), 4326).with_retry(3, Duration::ZERO);
    let err = fetcher.fetch_boundaries().await.unwrap_err();

    assert!(matches!(err, CoordBufferError::ApiError(_)));
    failing.assert_hits_async(3).await;
}

#[tokio::test]
async fn test_fetch_failure_leaves_no_files() {
    let dir = TempDir::new().unwrap();
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geoserver/wfs");
            then.status(503);
        })
        .await;

    let settings = Settings {
        retry_attempts: 1,
        ..settings_for(&server, &dir)
    };
    let pipeline = TmaIngestPipeline::new(
        LocalStorage::new(&settings.output_folder),
        WfsFetcher::from_config(&settings),
        JsonAreaStore::new(&settings.store_path),
        &settings,
    )
    .unwrap();

    assert!(IngestEngine::new(pipeline).run().await.is_err());
    assert!(!dir.path().join("POLYGONES").exists());
    assert!(!dir.path().join("areas.json").exists());
}
