// Library root: re-exports all modules so integration tests and the `snippet`
// binary share one public API.

pub mod config;
pub mod fetch;
pub mod math;
pub mod processor;

pub use fetch::{fetch_data, FetchError, Fetcher};
pub use math::{calculate_sum, checked_sum};
pub use processor::{DataProcessor, ProcessError, ProcessorConfig};
