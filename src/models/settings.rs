use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_ACTIVE_PLANS: u32 = 1;
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    MaxActivePlans,
    IsFullScreen,
    Language,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxActivePlans => "max_active_plans",
            Self::IsFullScreen => "is_full_screen",
            Self::Language => "language",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub max_active_plans: u32,
    pub is_full_screen: bool,
    pub language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            max_active_plans: DEFAULT_MAX_ACTIVE_PLANS,
            is_full_screen: false,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Partial update; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub max_active_plans: Option<u32>,
    pub is_full_screen: Option<bool>,
    pub language: Option<String>,
}
