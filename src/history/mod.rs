//! Folder-per-record persistence for composites.
//!
//! Each save creates `<root>/<id>/` containing the composite, a thumbnail, one image per
//! image-bearing entry, `meta.json` and `summary.txt`. Records are written into a hidden
//! staging folder and renamed into place once complete, so a listing never observes a
//! half written record.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use parking_lot::Mutex;

use crate::config::HistoryConfig;
use crate::entry::Entry;
use crate::error::{HistoryError, HistoryResult};
use crate::raster;
use crate::util::time;

pub mod record;
pub mod summary;

pub use record::{EntryMeta, HistoryRecord};

const STAGING_PREFIX: &str = ".";
const STAGING_SUFFIX: &str = ".partial";
/// How many `-N` suffixes to try when an id is already taken.
const MAX_ID_ATTEMPTS: usize = 1000;

pub struct HistoryStore {
    root: PathBuf,
    retention_cap: usize,
    thumbnail_size: u32,
    /// Serializes writers (save, delete, eviction). Readers never take it.
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("root", &self.root)
            .field("retention_cap", &self.retention_cap)
            .field("thumbnail_size", &self.thumbnail_size)
            .finish()
    }
}

impl HistoryStore {
    /// Open (creating if needed) the store described by `config`.
    ///
    /// Staging folders left behind by an interrupted save are removed. A retention
    /// cap of zero is raised to one, so a save always leaves its own record behind.
    pub fn open(config: &HistoryConfig) -> HistoryResult<Self> {
        fs::create_dir_all(&config.root).map_err(|source| HistoryError::CreateDir {
            path: config.root.clone(),
            source,
        })?;

        let store = Self {
            root: config.root.clone(),
            retention_cap: config.retention_cap.max(1),
            thumbnail_size: config.thumbnail_size.max(1),
            write_lock: Mutex::new(()),
        };
        store.sweep_staging();
        log::info!("History store opened at {}", store.root.display());
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention_cap(&self) -> usize {
        self.retention_cap
    }

    /// Folder of the record with the given id (whether or not it exists).
    pub fn record_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Persist `composite` and the checked subset of `entries` as a new record.
    ///
    /// Unchecked entries are not stored. After the record is committed, the oldest
    /// records beyond the retention cap are evicted. On failure nothing is left behind
    /// and the error is returned.
    pub fn save(&self, composite: &RgbaImage, entries: &[Entry]) -> HistoryResult<HistoryRecord> {
        let _guard = self.write_lock.lock();

        let created_at = time::now();
        let id = self.allocate_id(&time::record_id(&created_at))?;
        let checked: Vec<&Entry> = entries.iter().filter(|e| e.is_checked()).collect();
        let record = HistoryRecord {
            id: id.clone(),
            created_at,
            entry_count: checked.len(),
            entries: checked.iter().map(|e| EntryMeta::describe(e)).collect(),
        };

        let staging = self.staging_dir(&id);
        fs::create_dir(&staging).map_err(|source| HistoryError::CreateDir {
            path: staging.clone(),
            source,
        })?;

        let written = self
            .write_record(&staging, composite, &checked, &record)
            .and_then(|()| self.commit(&staging, &id));
        if let Err(err) = written {
            log::error!("Saving history record {id} failed: {err}");
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                log::warn!("Could not remove {}: {cleanup}", staging.display());
            }
            return Err(err);
        }

        log::info!("Saved history record {id} with {} entries", record.entry_count);
        self.evict_locked();
        Ok(record)
    }

    /// All valid records, newest first.
    ///
    /// Folders without readable metadata or without a composite image are skipped.
    /// Only failing to read the root folder itself is an error.
    pub fn list(&self) -> HistoryResult<Vec<HistoryRecord>> {
        let dir_entries = fs::read_dir(&self.root).map_err(|source| HistoryError::ReadRoot {
            path: self.root.clone(),
            source,
        })?;

        let mut records = Vec::new();
        for dir_entry in dir_entries.filter_map(Result::ok) {
            let path = dir_entry.path();
            if !path.is_dir() || is_hidden(&path) {
                continue;
            }
            match record::read_record(&path) {
                Ok(record) => records.push(record),
                Err(issue) => log::debug!("Skipping {}: {issue}", path.display()),
            }
        }

        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    pub fn load_composite(&self, id: &str) -> Option<RgbaImage> {
        self.load_file(id, &record::composite_file())
    }

    /// The record's thumbnail. Records saved without one get it generated from the
    /// composite and cached for next time.
    pub fn load_thumbnail(&self, id: &str) -> Option<RgbaImage> {
        if let Some(thumbnail) = self.load_file(id, &record::thumbnail_file()) {
            return Some(thumbnail);
        }

        let composite = self.load_composite(id)?;
        let thumbnail = self.make_thumbnail(&composite);
        let path = self.record_dir(id).join(record::thumbnail_file());
        if let Err(err) = raster::save(&thumbnail, &path) {
            log::warn!("Could not cache thumbnail {}: {err}", path.display());
        }
        Some(thumbnail)
    }

    /// Load one of the per-entry images of a record.
    pub fn load_entry_image(&self, id: &str, file_name: &str) -> Option<RgbaImage> {
        self.load_file(id, file_name)
    }

    /// Rebuild editable entries from `record`, in stored order.
    ///
    /// Index, comment and checked state come back verbatim. Image entries get the
    /// flattened image that was saved as their new source; strokes are not restored.
    pub fn restore(&self, record: &HistoryRecord) -> Vec<Entry> {
        record
            .entries
            .iter()
            .map(|meta| {
                let entry = if meta.is_text_only {
                    Entry::text(meta.index)
                } else {
                    let image = meta
                        .image_file_name
                        .as_deref()
                        .and_then(|file| self.load_entry_image(&record.id, file));
                    Entry::image(meta.index, image)
                };
                entry
                    .with_comment(meta.comment.clone())
                    .with_checked(meta.checked)
            })
            .collect()
    }

    /// Remove a record and everything in its folder. A record that does not exist
    /// counts as deleted.
    pub fn delete(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock();
        self.delete_locked(id)
    }

    fn delete_locked(&self, id: &str) -> bool {
        if !is_valid_id(id) {
            log::warn!("Refusing to delete invalid record id {id:?}");
            return false;
        }

        let dir = self.record_dir(id);
        if !dir.exists() {
            return true;
        }
        match fs::remove_dir_all(&dir) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to delete history record {id}: {err}");
                false
            }
        }
    }

    /// Delete the oldest records until at most `retention_cap` remain.
    /// Returns the ids that were removed.
    pub fn evict(&self) -> Vec<String> {
        let _guard = self.write_lock.lock();
        self.evict_locked()
    }

    fn evict_locked(&self) -> Vec<String> {
        let records = match self.list() {
            Ok(records) => records,
            Err(err) => {
                log::warn!("Skipping eviction: {err}");
                return Vec::new();
            }
        };

        // `list` is newest first, so everything past the cap is the oldest excess
        let mut evicted = Vec::new();
        for record in records.into_iter().skip(self.retention_cap) {
            if self.delete_locked(&record.id) {
                log::info!("Evicted history record {}", record.id);
                evicted.push(record.id);
            }
        }
        evicted
    }

    fn write_record(
        &self,
        dir: &Path,
        composite: &RgbaImage,
        checked: &[&Entry],
        record: &HistoryRecord,
    ) -> HistoryResult<()> {
        write_image(composite, &dir.join(record::composite_file()))?;
        write_image(
            &self.make_thumbnail(composite),
            &dir.join(record::thumbnail_file()),
        )?;

        for (entry, meta) in checked.iter().zip(&record.entries) {
            if let (Some(file), Some(image)) = (&meta.image_file_name, entry.display_image()) {
                write_image(image, &dir.join(file))?;
            }
        }

        write_text(&dir.join(record::META_FILE), &record.to_json()?)?;
        write_text(&dir.join(record::SUMMARY_FILE), &summary::render(record))?;
        Ok(())
    }

    fn commit(&self, staging: &Path, id: &str) -> HistoryResult<()> {
        let target = self.record_dir(id);
        fs::rename(staging, &target).map_err(|source| HistoryError::Commit {
            from: staging.to_path_buf(),
            to: target,
            source,
        })
    }

    fn make_thumbnail(&self, composite: &RgbaImage) -> RgbaImage {
        raster::fit_within(composite, self.thumbnail_size, self.thumbnail_size)
    }

    fn load_file(&self, id: &str, file_name: &str) -> Option<RgbaImage> {
        if !is_valid_id(id) || !is_valid_id(file_name) {
            return None;
        }
        let path = self.record_dir(id).join(file_name);
        if !path.is_file() {
            return None;
        }
        match raster::load(&path) {
            Ok(image) => Some(image),
            Err(err) => {
                log::warn!("Failed to decode {}: {err}", path.display());
                None
            }
        }
    }

    /// First id derived from `base` that is neither a record nor a staging folder.
    fn allocate_id(&self, base: &str) -> HistoryResult<String> {
        (0..MAX_ID_ATTEMPTS)
            .map(|attempt| match attempt {
                0 => base.to_owned(),
                n => format!("{base}-{n}"),
            })
            .find(|id| !self.record_dir(id).exists() && !self.staging_dir(id).exists())
            .ok_or_else(|| HistoryError::IdExhausted(base.to_owned()))
    }

    fn staging_dir(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{STAGING_PREFIX}{id}{STAGING_SUFFIX}"))
    }

    fn sweep_staging(&self) {
        let Ok(dir_entries) = fs::read_dir(&self.root) else {
            return;
        };
        for dir_entry in dir_entries.filter_map(Result::ok) {
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX) {
                log::info!("Removing interrupted save {name}");
                if let Err(err) = fs::remove_dir_all(dir_entry.path()) {
                    log::warn!("Could not remove {name}: {err}");
                }
            }
        }
    }
}

fn write_image(image: &RgbaImage, path: &Path) -> HistoryResult<()> {
    raster::save(image, path).map_err(|source| HistoryError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_text(path: &Path, contents: &str) -> HistoryResult<()> {
    fs::write(path, contents).map_err(|source| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Ids and file names must stay inside the record folder.
fn is_valid_id(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_cannot_escape_the_root() {
        assert!(is_valid_id("2026-01-01_000000_000"));
        assert!(is_valid_id("entry_3.png"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id(".."));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id("a/b"));
        assert!(!is_valid_id("a\\b"));
        assert!(!is_valid_id(".hidden.partial"));
    }

    #[test]
    fn taken_ids_get_a_suffix() {
        let root = tempfile::tempdir().unwrap();
        let store = HistoryStore::open(&HistoryConfig::with_root(root.path())).unwrap();
        assert_eq!(store.allocate_id("x").unwrap(), "x");

        fs::create_dir(root.path().join("x")).unwrap();
        fs::create_dir(root.path().join(".x-1.partial")).unwrap();
        assert_eq!(store.allocate_id("x").unwrap(), "x-2");
    }

    #[test]
    fn open_sweeps_interrupted_saves() {
        let root = tempfile::tempdir().unwrap();
        let leftover = root.path().join(".2026-01-01_000000_000.partial");
        fs::create_dir(&leftover).unwrap();
        fs::write(leftover.join("composite.png"), b"half").unwrap();

        HistoryStore::open(&HistoryConfig::with_root(root.path())).unwrap();
        assert!(!leftover.exists());
    }
}
