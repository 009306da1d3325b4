pub mod canonical;
pub mod classify;
pub mod reconcile;

pub use canonical::{RecordType, CRIME_COLUMNS, STOP_AND_SEARCH_COLUMNS};
pub use classify::classify;
pub use reconcile::{
    drop_policing_operation, duplicate_columns, fill_unknown, reconcile, reindex, strip_column_names,
    MismatchRecord, Reconciled, POLICING_OPERATION, UNKNOWN,
};
