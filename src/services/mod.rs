pub mod charts;
pub mod correlation;
pub mod csv_loader;
pub mod describe;
pub mod distribution;
pub mod missing;
pub mod report;

pub use csv_loader::CsvLoader;
pub use report::generate_report;
