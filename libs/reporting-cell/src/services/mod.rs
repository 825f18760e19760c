pub mod aggregator;
pub mod export;
pub mod loader;

pub use export::export_report;
pub use loader::load_report;
