#![warn(clippy::all, rust_2018_idioms)]

pub mod composite;
pub mod config;
pub mod entry;
pub mod error;
pub mod history;
pub mod raster;
pub mod stroke;
pub mod util;
pub mod working_set;

pub use composite::{Compositor, composite};
pub use config::{Config, HistoryConfig, LayoutConfig};
pub use entry::{Entry, EntryId};
pub use error::{ConfigError, FontError, HistoryError, HistoryResult, RecordIssue};
pub use history::{EntryMeta, HistoryRecord, HistoryStore};
pub use stroke::{MutableStroke, Stroke};
pub use working_set::WorkingSet;
