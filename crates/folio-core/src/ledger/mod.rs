//! The ledger: uploads, folders, aggregates and record maintenance.

mod folders;
mod ingest;
mod ops;
mod query;

pub use folders::{aggregate, recompute, resolve_folder_key, Aggregate, Folder, Totals, UNNAMED_FOLDER};
pub use ingest::{slugify, Ingestor, NewInvoice};
pub use ops::{
    delete_invoice, move_many, move_to_folder, set_due_date, update_payment_status, BulkMoveReport,
    DeletedInvoice,
};
pub use query::{sort_records, ParseSortOrderError, ParseYearMonthError, RecordQuery, SortOrder, StatusSummary, YearMonth};
