use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top level configuration, usually read from a JSON file.
///
/// Every field has a default, so partial files (or files written by older versions) load fine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub history: HistoryConfig,
}

/// Geometry of the composite image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal padding on both sides, and the top margin.
    pub padding: u32,
    pub separator_height: u32,
    /// Gap after each separator band.
    pub entry_spacing: u32,
    /// Lower bound for the content width, so text-only composites stay readable.
    pub min_content_width: u32,
    /// Body font size as a fraction of the largest image dimension.
    pub font_size_ratio: f32,
    pub min_font_size: f32,
    /// How much larger the index label is than the body text.
    pub title_font_boost: f32,
    /// TrueType/OpenType file tried before the built-in fonts, e.g. a CJK face.
    pub font_path: Option<PathBuf>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            padding: 30,
            separator_height: 8,
            entry_spacing: 40,
            min_content_width: 600,
            font_size_ratio: 0.02,
            min_font_size: 16.0,
            title_font_boost: 8.0,
            font_path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding one sub-directory per record.
    pub root: PathBuf,
    /// Oldest records beyond this count are deleted after every save. At least 1.
    pub retention_cap: usize,
    /// Bounding box (square) for record thumbnails.
    pub thumbnail_size: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            root: default_history_root(),
            retention_cap: 100,
            thumbnail_size: 80,
        }
    }
}

impl HistoryConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// `<local data dir>/batch-note/history`, falling back to the working directory.
pub fn default_history_root() -> PathBuf {
    let mut path = dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    path.push("batch-note");
    path.push("history");
    path
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load from `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
