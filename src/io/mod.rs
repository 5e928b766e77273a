pub mod api;
pub mod csv_export;
pub mod worker;
