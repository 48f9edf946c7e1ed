//! Domain types: price records, brands, recordsets and indicator outputs.

pub mod calendar;
pub mod coerce;
pub mod estimated;
pub mod processed;
pub mod record;
pub mod recordset;

pub use estimated::EstimatedValue;
pub use processed::{ProcessedTable, BASE_REQUIRED_COLUMNS};
pub use record::{Brand, DailyPriceRecord, RawRow};
pub use recordset::{Recordset, RecordsetStatus, SlidingWindow, OPTIONAL_COL, REQUIRED_COL};
