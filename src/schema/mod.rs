pub mod coerce;
pub mod raw_table;
pub mod types;

pub use raw_table::{ColumnMap, RawTable};
pub use types::{CandidateVotes, ElectionResult, CANONICAL_COLUMNS};
