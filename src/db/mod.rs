pub mod connection;
pub mod migrations;
pub mod plan_day_repo;
pub mod plan_repo;
pub mod settings_repo;
pub mod store;

pub use store::Database;
