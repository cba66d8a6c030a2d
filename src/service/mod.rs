pub mod clock;
pub mod events;
pub mod plans;
pub mod settings;

pub use clock::{Clock, SystemClock};
pub use events::{ListenerId, PlanEvent};
pub use plans::{CapacityStatus, PlanService};
pub use settings::SettingsService;
