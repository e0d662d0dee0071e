//! File-backed area store.
//!
//! Keeps every ingested area in one JSON document. Records are keyed by
//! (name, effective date); upserting the same key replaces the record.

use crate::domain::model::{LonLat, TmaArea};
use crate::domain::ports::AreaStore;
use crate::utils::error::{CoordBufferError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_STORE_PATH: &str = "tma_areas.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    areas: Vec<TmaArea>,
}

pub struct JsonAreaStore {
    path: PathBuf,
    // 序列化同一行程內的讀改寫
    lock: Mutex<()>,
}

impl JsonAreaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StoreDocument::default());
        }
        serde_json::from_str(&content).map_err(|e| {
            CoordBufferError::store(format!("{} is not a valid area store: {}", self.path.display(), e))
        })
    }

    fn save(&self, document: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(document)?;
        // 先寫暫存檔再改名，避免中斷時留下半個檔案
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| CoordBufferError::store("area store lock poisoned"))
    }
}

impl AreaStore for JsonAreaStore {
    fn upsert_areas(&self, areas: &[TmaArea]) -> Result<usize> {
        let _guard = self.guard()?;
        let mut document = self.load()?;
        let mut next_msid = document
            .areas
            .iter()
            .filter_map(|a| a.msid)
            .max()
            .unwrap_or(0)
            + 1;

        for area in areas {
            let mut area = area.clone();
            let existing = document
                .areas
                .iter()
                .position(|a| a.name == area.name && a.wef == area.wef);

            match existing {
                Some(index) => {
                    if area.msid.is_none() {
                        area.msid = document.areas[index].msid;
                    }
                    tracing::debug!("Replacing stored area {} ({:?})", area.name, area.wef);
                    document.areas[index] = area;
                }
                None => {
                    if area.msid.is_none() {
                        area.msid = Some(next_msid);
                    }
                    if let Some(msid) = area.msid {
                        next_msid = next_msid.max(msid + 1);
                    }
                    document.areas.push(area);
                }
            }
        }

        self.save(&document)?;
        tracing::info!("Upserted {} areas into {}", areas.len(), self.path.display());
        Ok(areas.len())
    }

    fn latest_effective_date(&self) -> Result<Option<NaiveDate>> {
        let _guard = self.guard()?;
        Ok(self.load()?.areas.iter().filter_map(|a| a.wef).max())
    }

    fn list_areas(&self, type_of_area: &str) -> Result<Vec<(i64, String)>> {
        let _guard = self.guard()?;
        let mut listed: Vec<(i64, String)> = self
            .load()?
            .areas
            .into_iter()
            .filter(|a| a.type_of_area.as_deref() == Some(type_of_area))
            .filter_map(|a| a.msid.map(|msid| (msid, a.name)))
            .collect();

        if listed.is_empty() {
            return Err(CoordBufferError::store("No geometries found"));
        }
        listed.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(listed)
    }

    fn area_coordinates(&self, msid: i64) -> Result<Vec<LonLat>> {
        let _guard = self.guard()?;
        self.load()?
            .areas
            .into_iter()
            .find(|a| a.msid == Some(msid))
            .map(|a| a.exterior)
            .ok_or_else(|| CoordBufferError::store("No geometry found for the given MSID"))
    }
}
