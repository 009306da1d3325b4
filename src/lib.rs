pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod load;
pub mod pipeline;
pub mod profile;
pub mod report;
pub mod schema;

pub use config::Config;
pub use pipeline::{run, RunSummary};
