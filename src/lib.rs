pub mod analyzers;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod mutator;
pub mod planner;
pub mod probe;
pub mod reporting;
pub mod safety;
pub mod scheduler;

// Re-export commonly used items
pub use analyzers::*;
pub use auth::*;
pub use config::*;
pub use models::*;
pub use planner::*;
pub use probe::*;
pub use scheduler::*;
