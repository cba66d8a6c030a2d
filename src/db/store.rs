use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::Connection;

use crate::error::WeekplanError;
use crate::models::{Plan, PlanDay, SettingKey};
use crate::store::{PlanDayStore, PlanStore, SettingsStore, Transactional};

use super::{connection, plan_day_repo, plan_repo, settings_repo};

/// SQLite-backed implementation of every storage collaborator.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, WeekplanError> {
        Ok(Self {
            conn: connection::open_db(path)?,
        })
    }

    pub fn init(path: &Path) -> Result<Self, WeekplanError> {
        Ok(Self {
            conn: connection::init_db(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, WeekplanError> {
        Ok(Self {
            conn: connection::open_in_memory()?,
        })
    }

    /// Resolve a user-typed plan reference (name, id prefix, or name fragment).
    pub fn resolve_plan(&self, reference: &str) -> Result<Plan, WeekplanError> {
        plan_repo::resolve_plan(&self.conn, reference)
    }
}

impl PlanStore for Database {
    fn all_plans(&self) -> Result<Vec<Plan>, WeekplanError> {
        plan_repo::list_plans(&self.conn)
    }

    fn plan_by_id(&self, id: &str) -> Result<Option<Plan>, WeekplanError> {
        plan_repo::find_plan_by_id(&self.conn, id)
    }

    fn plan_by_name(&self, name: &str) -> Result<Option<Plan>, WeekplanError> {
        plan_repo::find_plan_by_name(&self.conn, name)
    }

    fn insert_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError> {
        plan_repo::create_plan(&self.conn, plan)
    }

    fn update_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError> {
        plan_repo::update_plan(&self.conn, plan)
    }

    fn delete_plan(&self, id: &str) -> Result<(), WeekplanError> {
        // plan_days rows go with it via ON DELETE CASCADE
        plan_repo::delete_plan(&self.conn, id)
    }
}

impl PlanDayStore for Database {
    fn days_for_plan(&self, plan_id: &str) -> Result<Vec<PlanDay>, WeekplanError> {
        plan_day_repo::list_days_by_plan(&self.conn, plan_id)
    }

    fn insert_days(&self, days: &[PlanDay]) -> Result<(), WeekplanError> {
        self.atomically(|| {
            for day in days {
                plan_day_repo::create_plan_day(&self.conn, day)?;
            }
            Ok(())
        })
    }

    fn update_day(&self, day: &PlanDay) -> Result<PlanDay, WeekplanError> {
        plan_day_repo::update_plan_day(&self.conn, day)
    }

    fn delete_days_for_plan(&self, plan_id: &str) -> Result<(), WeekplanError> {
        plan_day_repo::delete_days_by_plan(&self.conn, plan_id)?;
        Ok(())
    }
}

impl SettingsStore for Database {
    fn get_setting(&self, key: SettingKey) -> Result<Option<String>, WeekplanError> {
        settings_repo::get_setting(&self.conn, key.as_str())
    }

    fn set_setting(&self, key: SettingKey, value: &str) -> Result<(), WeekplanError> {
        settings_repo::set_setting(&self.conn, key.as_str(), value)
    }

    fn all_settings(&self) -> Result<BTreeMap<String, String>, WeekplanError> {
        settings_repo::list_settings(&self.conn)
    }
}

impl Transactional for Database {
    fn atomically<T, F>(&self, f: F) -> Result<T, WeekplanError>
    where
        F: FnOnce() -> Result<T, WeekplanError>,
    {
        connection::with_transaction(&self.conn, f)
    }
}
