//! Page fetching and decoding seams.
//!
//! Network access and HTML parsing live outside this crate. Callers plug in
//! their own fetcher and decoder; the core only sees the decoded rows.

use crate::domain::record::RawRow;
use crate::domain::recordset::Recordset;
use crate::error::EntityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PageError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Entity(#[from] EntityError),
}

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, PageError>;
}

pub trait PageDecoder {
    fn decode(&self, html: &str) -> Result<RawRow, PageError>;
}

/// Fetch and decode every url, then build one recordset from the rows.
pub fn recordset_from_pages(
    fetcher: &dyn PageFetcher,
    decoder: &dyn PageDecoder,
    urls: &[String],
) -> Result<Recordset, PageError> {
    let rows = urls
        .iter()
        .map(|url| decoder.decode(&fetcher.fetch(url)?))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Recordset::from_rows(&rows)?)
}
