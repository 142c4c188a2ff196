//! File import and export.

pub mod export;
pub mod import;

pub use export::{
    STRATEGY_FILE_NAME, export_csv, export_strategy, results_file_name, write_csv, write_strategy_json,
};
pub use import::{ImportError, ImportedSeries, LoadMode, LoadUnit, SeriesKind, apply_uploaded_load, import_series, read_series};
