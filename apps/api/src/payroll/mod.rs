// Record Adapter: spreadsheet bytes → validated employee records.
// Parsing is CPU-bound; handlers call it inside tokio::task::spawn_blocking.

pub mod adapter;
pub mod models;
pub mod table;
pub mod workbook;

pub use adapter::{AdapterOptions, RecordReader};
pub use models::{EmployeeRecord, NetPolicy, PayPeriod};
pub use table::{Cell, Table};
