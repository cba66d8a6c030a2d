use std::cell::RefCell;

use crate::error::WeekplanError;
use crate::models::{AppSettings, SettingKey, SettingsPatch, DEFAULT_MAX_ACTIVE_PLANS};
use crate::store::SettingsStore;

/// Typed access to the key-value settings table.
///
/// Reads are served from a cache that every write clears, so a value written
/// through this service is never shadowed by a stale copy.
pub struct SettingsService<'a, S: SettingsStore> {
    store: &'a S,
    cache: RefCell<Option<AppSettings>>,
}

impl<'a, S: SettingsStore> SettingsService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            cache: RefCell::new(None),
        }
    }

    pub fn get_settings(&self) -> Result<AppSettings, WeekplanError> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let settings = self.load()?;
        *self.cache.borrow_mut() = Some(settings.clone());
        Ok(settings)
    }

    pub fn max_active_plans(&self) -> Result<u32, WeekplanError> {
        Ok(self.get_settings()?.max_active_plans)
    }

    /// Reads the limit from storage, bypassing and then refreshing the cache.
    /// Activation decisions go through here.
    pub fn load_max_active_plans(&self) -> Result<u32, WeekplanError> {
        self.invalidate();
        self.max_active_plans()
    }

    pub fn set_max_active_plans(&self, max_active_plans: u32) -> Result<(), WeekplanError> {
        self.update_settings(SettingsPatch {
            max_active_plans: Some(max_active_plans),
            ..SettingsPatch::default()
        })?;
        Ok(())
    }

    pub fn is_full_screen(&self) -> Result<bool, WeekplanError> {
        Ok(self.get_settings()?.is_full_screen)
    }

    pub fn set_is_full_screen(&self, is_full_screen: bool) -> Result<(), WeekplanError> {
        self.update_settings(SettingsPatch {
            is_full_screen: Some(is_full_screen),
            ..SettingsPatch::default()
        })?;
        Ok(())
    }

    pub fn language(&self) -> Result<String, WeekplanError> {
        Ok(self.get_settings()?.language)
    }

    pub fn set_language(&self, language: &str) -> Result<(), WeekplanError> {
        self.update_settings(SettingsPatch {
            language: Some(language.to_string()),
            ..SettingsPatch::default()
        })?;
        Ok(())
    }

    /// Validates the whole patch before writing any key.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<AppSettings, WeekplanError> {
        if patch.max_active_plans == Some(0) {
            return Err(WeekplanError::validation(
                "max_active_plans must be at least 1",
            ));
        }
        if let Some(language) = &patch.language {
            if language.trim().is_empty() {
                return Err(WeekplanError::validation("language must not be empty"));
            }
        }

        let result = self.write_patch(&patch);
        // Clear even on partial failure: some keys may have been written.
        self.invalidate();
        result?;

        tracing::info!(?patch, "settings updated");
        self.get_settings()
    }

    pub fn invalidate(&self) {
        self.cache.borrow_mut().take();
    }

    fn write_patch(&self, patch: &SettingsPatch) -> Result<(), WeekplanError> {
        if let Some(max) = patch.max_active_plans {
            self.store
                .set_setting(SettingKey::MaxActivePlans, &max.to_string())?;
        }
        if let Some(full_screen) = patch.is_full_screen {
            self.store
                .set_setting(SettingKey::IsFullScreen, &full_screen.to_string())?;
        }
        if let Some(language) = &patch.language {
            self.store.set_setting(SettingKey::Language, language.trim())?;
        }
        Ok(())
    }

    fn load(&self) -> Result<AppSettings, WeekplanError> {
        let defaults = AppSettings::default();

        let max_active_plans = match self.store.get_setting(SettingKey::MaxActivePlans)? {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    tracing::warn!(value = %raw, "invalid max_active_plans, using default");
                    DEFAULT_MAX_ACTIVE_PLANS
                }
            },
            None => defaults.max_active_plans,
        };

        let is_full_screen = self
            .store
            .get_setting(SettingKey::IsFullScreen)?
            .map(|raw| raw == "true")
            .unwrap_or(defaults.is_full_screen);

        let language = self
            .store
            .get_setting(SettingKey::Language)?
            .filter(|raw| !raw.trim().is_empty())
            .unwrap_or(defaults.language);

        Ok(AppSettings {
            max_active_plans,
            is_full_screen,
            language,
        })
    }
}
