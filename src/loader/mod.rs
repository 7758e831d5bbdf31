pub mod csv_loader;
pub mod run_report;

pub use csv_loader::CsvLoader;
pub use run_report::RunReport;
