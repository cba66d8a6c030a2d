//! Storage collaborators consumed by the services.
//!
//! The repositories store whatever they are given; limits and lifecycle rules
//! live in [`crate::service`]. Uniqueness of plan names and of
//! `(plan_id, day_of_week)` is enforced by the backend and reported as
//! `PLAN_NAME_CONFLICT` / `VALIDATION_ERROR` respectively.

use std::collections::BTreeMap;

use crate::error::WeekplanError;
use crate::models::{Plan, PlanDay, SettingKey};

pub trait PlanStore {
    /// All plans, newest first.
    fn all_plans(&self) -> Result<Vec<Plan>, WeekplanError>;
    fn plan_by_id(&self, id: &str) -> Result<Option<Plan>, WeekplanError>;
    fn plan_by_name(&self, name: &str) -> Result<Option<Plan>, WeekplanError>;
    fn insert_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError>;
    /// Full-record write. Fails with `PLAN_NOT_FOUND` when no row matches.
    fn update_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError>;
    /// Removes the plan and its days. Fails with `PLAN_NOT_FOUND` when absent.
    fn delete_plan(&self, id: &str) -> Result<(), WeekplanError>;
}

pub trait PlanDayStore {
    /// Days of one plan ordered by `day_of_week`.
    fn days_for_plan(&self, plan_id: &str) -> Result<Vec<PlanDay>, WeekplanError>;
    fn insert_days(&self, days: &[PlanDay]) -> Result<(), WeekplanError>;
    fn update_day(&self, day: &PlanDay) -> Result<PlanDay, WeekplanError>;
    fn delete_days_for_plan(&self, plan_id: &str) -> Result<(), WeekplanError>;
}

pub trait SettingsStore {
    fn get_setting(&self, key: SettingKey) -> Result<Option<String>, WeekplanError>;
    fn set_setting(&self, key: SettingKey, value: &str) -> Result<(), WeekplanError>;
    fn all_settings(&self) -> Result<BTreeMap<String, String>, WeekplanError>;
}

pub trait Transactional {
    /// Run `f` as one all-or-nothing unit of work.
    fn atomically<T, F>(&self, f: F) -> Result<T, WeekplanError>
    where
        F: FnOnce() -> Result<T, WeekplanError>;
}
