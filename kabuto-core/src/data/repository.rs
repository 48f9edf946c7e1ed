//! Recordset persistence.

use crate::domain::record::{Brand, RawRow};
use crate::domain::recordset::{Recordset, OPTIONAL_COL, REQUIRED_COL};
use crate::error::EntityError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Entity(#[from] EntityError),
}

/// Read and write a whole recordset.
pub trait RecordsetRepository {
    fn read(&self) -> Result<Recordset, RepositoryError>;
    fn write(&self, data: &Recordset) -> Result<(), RepositoryError>;
}

/// One CSV file with a header row. Written with the full column set.
#[derive(Debug, Clone)]
pub struct CsvRecordsetRepository {
    path: PathBuf,
}

impl CsvRecordsetRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordsetRepository for CsvRecordsetRepository {
    fn read(&self) -> Result<Recordset, RepositoryError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|source| RepositoryError::Open {
            path: self.path.clone(),
            source,
        })?;
        let headers = reader.headers()?.clone();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: RawRow = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, value)| !value.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(Recordset::from_rows(&rows)?)
    }

    fn write(&self, data: &Recordset) -> Result<(), RepositoryError> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(REQUIRED_COL.iter().chain(OPTIONAL_COL.iter()))?;

        let brands: BTreeMap<&str, &Brand> =
            data.brands().iter().map(|b| (b.code.as_str(), b)).collect();
        let mut records: Vec<_> = data.records().iter().collect();
        records.sort_by(|a, b| a.code.cmp(&b.code).then(a.dt.cmp(&b.dt)));

        for r in records {
            let brand = brands.get(r.code.as_str());
            let text = |f: fn(&Brand) -> Option<String>| brand.and_then(|b| f(b)).unwrap_or_default();
            writer.write_record([
                r.code.clone(),
                r.dt.to_string(),
                r.open.to_string(),
                r.high.to_string(),
                r.low.to_string(),
                r.close.to_string(),
                r.volume.to_string(),
                text(|b| b.name.clone()),
                text(|b| b.industry_type.clone()),
                text(|b| b.market.clone()),
                text(|b| b.unit.map(|u| u.to_string())),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
