use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index is `day_of_week`; 0 is Sunday.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

pub fn default_day_name(day_of_week: u8) -> Option<&'static str> {
    DAY_NAMES.get(day_of_week as usize).copied()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDay {
    pub id: String,
    pub plan_id: String,
    pub day_of_week: u8,
    pub day_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied day content; ids and timestamps are assigned on write.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewPlanDay {
    pub day_of_week: u8,
    #[serde(default)]
    pub day_name: Option<String>,
    #[serde(default)]
    pub content: String,
}

impl NewPlanDay {
    pub fn new(day_of_week: u8, content: impl Into<String>) -> Self {
        Self {
            day_of_week,
            day_name: None,
            content: content.into(),
        }
    }
}
