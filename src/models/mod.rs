pub mod plan;
pub mod plan_day;
pub mod settings;

pub use plan::*;
pub use plan_day::*;
pub use settings::*;
