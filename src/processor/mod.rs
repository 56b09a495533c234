pub mod csv_generator;
pub mod progress_tracker;
pub mod totals;

// Re-export the main structs for easier access
pub use csv_generator::CsvGenerator;
pub use progress_tracker::ProgressTracker;
pub use totals::Totals;
