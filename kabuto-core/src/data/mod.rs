//! Data access: frame conversions, persistence, synthetic data and page seams.

pub mod frame;
pub mod pages;
pub mod repository;
pub mod synthetic;

pub use pages::{recordset_from_pages, PageDecoder, PageError, PageFetcher};
pub use repository::{CsvRecordsetRepository, RecordsetRepository, RepositoryError};
pub use synthetic::synthetic_recordset;
