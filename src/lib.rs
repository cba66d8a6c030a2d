pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod output;
pub mod service;
pub mod store;

pub use db::Database;
pub use error::{ErrorCode, WeekplanError};
pub use service::{PlanService, SettingsService};
