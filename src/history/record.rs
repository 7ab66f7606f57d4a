use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::RecordIssue;
use crate::raster::RASTER_EXTENSION;

pub const META_FILE: &str = "meta.json";
pub const SUMMARY_FILE: &str = "summary.txt";

pub fn composite_file() -> String {
    format!("composite.{RASTER_EXTENSION}")
}

pub fn thumbnail_file() -> String {
    format!("thumbnail.{RASTER_EXTENSION}")
}

/// File name for the persisted image of the entry with the given index.
pub fn entry_image_file(index: usize) -> String {
    format!("entry_{index}.{RASTER_EXTENSION}")
}

/// Snapshot of one composition, as stored in the record's metadata document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub created_at: DateTime<Local>,
    /// Number of checked entries at save time.
    pub entry_count: usize,
    pub entries: Vec<EntryMeta>,
}

/// What is remembered about one composited entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryMeta {
    pub index: usize,
    pub is_text_only: bool,
    pub image_file_name: Option<String>,
    #[serde(default)]
    pub comment: String,
    pub checked: bool,
}

impl EntryMeta {
    /// Metadata for `entry`; the image file is only named when the entry has an image to save.
    pub fn describe(entry: &Entry) -> Self {
        let has_image = !entry.is_text_only() && entry.display_image().is_some();
        Self {
            index: entry.index(),
            is_text_only: entry.is_text_only(),
            image_file_name: has_image.then(|| entry_image_file(entry.index())),
            comment: entry.comment().to_owned(),
            checked: entry.is_checked(),
        }
    }
}

impl HistoryRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Read and validate the record stored in `dir`.
///
/// A record is valid only if its metadata parses, names the folder it lives in, and
/// its composite image exists.
pub fn read_record(dir: &Path) -> Result<HistoryRecord, RecordIssue> {
    let meta_path = dir.join(META_FILE);
    if !meta_path.is_file() {
        return Err(RecordIssue::MissingMeta);
    }

    let json = fs::read_to_string(&meta_path).map_err(RecordIssue::UnreadableMeta)?;
    let record: HistoryRecord = serde_json::from_str(&json).map_err(RecordIssue::UnparsableMeta)?;

    let folder = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    if record.id != folder {
        return Err(RecordIssue::IdMismatch {
            folder,
            id: record.id,
        });
    }

    if !dir.join(composite_file()).is_file() {
        return Err(RecordIssue::MissingComposite);
    }

    Ok(record)
}
