//! Active-plan capacity and lifecycle control.
//!
//! At most `max_active_plans` plans may be active (active and not completed)
//! at once. Creating a plan makes room by demoting the least recently opened
//! active plan; activating an existing plan never demotes anything and is
//! refused with `CAPACITY_EXCEEDED` instead, leaving the choice of which plan
//! to deactivate to the caller. Completion is terminal.
//!
//! Every decision that depends on the active set reads it from storage inside
//! a transaction. The in-memory plan list only serves the read-side getters
//! and is dropped after each mutation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::error::WeekplanError;
use crate::models::{
    by_recency, default_day_name, least_recent, most_recent, week_name, NewPlanDay, Plan,
    PlanDay,
};
use crate::store::{PlanDayStore, PlanStore, SettingsStore, Transactional};

use super::clock::{Clock, SystemClock};
use super::events::{ListenerId, Listeners, PlanEvent};
use super::settings::SettingsService;

/// Active count against the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityStatus {
    pub active_count: u32,
    pub limit: u32,
}

impl CapacityStatus {
    /// How many plans must be deactivated before another activation can succeed.
    pub fn over_limit_by(&self) -> u32 {
        self.active_count.saturating_sub(self.limit)
    }

    pub fn has_free_slot(&self) -> bool {
        self.active_count < self.limit
    }
}

enum Activation {
    Activated,
    Reopened,
}

pub struct PlanService<'a, S, T>
where
    S: PlanStore + PlanDayStore + Transactional,
    T: SettingsStore,
{
    store: &'a S,
    settings: &'a SettingsService<'a, T>,
    clock: Box<dyn Clock + 'a>,
    cache: Option<Vec<Plan>>,
    degraded: bool,
    listeners: Listeners<'a>,
}

impl<'a, S, T> PlanService<'a, S, T>
where
    S: PlanStore + PlanDayStore + Transactional,
    T: SettingsStore,
{
    pub fn new(store: &'a S, settings: &'a SettingsService<'a, T>) -> Self {
        Self {
            store,
            settings,
            clock: Box::new(SystemClock),
            cache: None,
            degraded: false,
            listeners: Listeners::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'a) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // --- change notification ---

    pub fn on_plan_data_changed(&mut self, listener: impl FnMut(&PlanEvent) + 'a) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // --- cache ---

    /// Reload the plan list from storage.
    pub fn refresh(&mut self) -> Result<&[Plan], WeekplanError> {
        let plans = self.store.all_plans()?;
        self.degraded = false;
        Ok(self.cache.insert(plans).as_slice())
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// True when the last read-side load failed and getters are answering from
    /// an empty list.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn plans(&mut self) -> &[Plan] {
        if self.cache.is_none() {
            match self.store.all_plans() {
                Ok(plans) => {
                    self.degraded = false;
                    self.cache = Some(plans);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load plans; reporting none");
                    self.degraded = true;
                }
            }
        }
        self.cache.as_deref().unwrap_or(&[])
    }

    // --- queries ---

    /// All plans, newest first.
    pub fn get_all_plans(&mut self) -> Vec<Plan> {
        self.plans().to_vec()
    }

    pub fn get_plan_by_id(&mut self, id: &str) -> Option<Plan> {
        self.plans().iter().find(|p| p.id == id).cloned()
    }

    /// Active plans, most recently opened first.
    pub fn get_active_plans(&mut self) -> Vec<Plan> {
        let mut active: Vec<Plan> = self.plans().iter().filter(|p| p.is_live()).cloned().collect();
        active.sort_by(|a, b| by_recency(b, a));
        active
    }

    pub fn get_active_plan(&mut self) -> Option<Plan> {
        most_recent(self.plans().iter().filter(|p| p.is_live())).cloned()
    }

    pub fn has_active_plan(&mut self) -> bool {
        self.get_active_plan().is_some()
    }

    /// Most recently opened plan in any state.
    pub fn get_last_opened_plan(&mut self) -> Option<Plan> {
        most_recent(self.plans()).cloned()
    }

    pub fn get_plan_days(&self, plan_id: &str) -> Result<Vec<PlanDay>, WeekplanError> {
        self.require_plan(plan_id)?;
        self.store.days_for_plan(plan_id)
    }

    /// Current active count and limit, both read from storage.
    pub fn capacity_status(&self) -> Result<CapacityStatus, WeekplanError> {
        let limit = self.settings.load_max_active_plans()?;
        let active_count = count_live(&self.store.all_plans()?);
        Ok(CapacityStatus { active_count, limit })
    }

    /// Change the limit. Lowering it below the current active count is allowed;
    /// nothing is demoted, and the returned status reports the excess.
    pub fn set_capacity_limit(&mut self, limit: u32) -> Result<CapacityStatus, WeekplanError> {
        self.settings.set_max_active_plans(limit)?;
        let status = self.capacity_status()?;
        if status.over_limit_by() > 0 {
            tracing::warn!(
                limit,
                active = status.active_count,
                "active plans exceed the new limit; activations are blocked until plans are deactivated"
            );
        }
        Ok(status)
    }

    // --- lifecycle ---

    /// Create a plan as active, with its days. When the active set is full the
    /// least recently opened active plan is deactivated first. The limit is
    /// read and every write happens inside one transaction.
    pub fn create_plan(
        &mut self,
        plan_name: &str,
        description: Option<&str>,
        year: i32,
        week: u32,
        days: &[NewPlanDay],
    ) -> Result<Plan, WeekplanError> {
        validate_plan_name(plan_name)?;
        validate_week(week)?;
        validate_days(days)?;

        let now = self.clock.now();
        let new_plan = Plan {
            id: Ulid::new().to_string(),
            plan_name: plan_name.to_string(),
            description: normalize_description(description),
            year,
            week,
            week_name: week_name(year, week),
            is_active: true,
            is_completed: false,
            created_at: now,
            last_opened_at: Some(now),
        };
        let day_rows = build_day_rows(&new_plan.id, days, now);

        let store = self.store;
        let settings = self.settings;
        let (plan, demoted, limit) = store.atomically(|| {
            let limit = settings.load_max_active_plans()?;
            if store.plan_by_name(plan_name)?.is_some() {
                return Err(WeekplanError::plan_name_conflict(plan_name));
            }

            let plans = store.all_plans()?;
            let live: Vec<&Plan> = plans.iter().filter(|p| p.is_live()).collect();
            let mut demoted = None;
            if live.len() as u32 >= limit {
                if let Some(oldest) = least_recent(live.iter().copied()) {
                    let mut oldest = oldest.clone();
                    oldest.is_active = false;
                    store.update_plan(&oldest)?;
                    demoted = Some(oldest);
                }
            }

            let plan = store.insert_plan(&new_plan)?;
            if !day_rows.is_empty() {
                store.insert_days(&day_rows)?;
            }
            Ok((plan, demoted, limit))
        })?;

        self.invalidate();
        if let Some(demoted) = demoted {
            tracing::info!(
                plan_id = %demoted.id,
                plan_name = %demoted.plan_name,
                limit,
                "deactivated oldest active plan to make room"
            );
            self.listeners.emit(&PlanEvent::Deactivated {
                plan_id: demoted.id,
                automatic: true,
            });
        }
        tracing::info!(plan_id = %plan.id, plan_name = %plan.plan_name, days = day_rows.len(), "plan created");
        self.listeners.emit(&PlanEvent::Created {
            plan_id: plan.id.clone(),
        });
        Ok(plan)
    }

    /// Activate a plan, or just refresh `last_opened_at` when it is already
    /// active. Never demotes another plan.
    pub fn set_plan_active(&mut self, id: &str) -> Result<(), WeekplanError> {
        let now = self.clock.now();

        let store = self.store;
        let settings = self.settings;
        let outcome = store.atomically(|| {
            let limit = settings.load_max_active_plans()?;
            let mut plan = store
                .plan_by_id(id)?
                .ok_or_else(|| WeekplanError::plan_not_found(id))?;
            if plan.is_completed {
                return Err(WeekplanError::plan_completed(&plan.plan_name));
            }
            if plan.is_active {
                plan.last_opened_at = Some(now);
                store.update_plan(&plan)?;
                return Ok(Activation::Reopened);
            }

            let mut others: Vec<Plan> = store
                .all_plans()?
                .into_iter()
                .filter(|p| p.is_live() && p.id != id)
                .collect();
            if others.len() as u32 >= limit {
                others.sort_by(|a, b| by_recency(b, a));
                return Err(WeekplanError::capacity_exceeded(others, limit));
            }

            plan.is_active = true;
            plan.last_opened_at = Some(now);
            store.update_plan(&plan)?;
            Ok(Activation::Activated)
        });

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if let Some(conflict) = &e.capacity {
                    tracing::info!(
                        plan_id = id,
                        limit = conflict.limit,
                        active = conflict.active_plans.len(),
                        "activation refused: limit reached"
                    );
                }
                return Err(e);
            }
        };

        self.invalidate();
        let event = match outcome {
            Activation::Activated => {
                tracing::info!(plan_id = id, "plan activated");
                PlanEvent::Activated { plan_id: id.to_string() }
            }
            Activation::Reopened => PlanEvent::Opened { plan_id: id.to_string() },
        };
        self.listeners.emit(&event);
        Ok(())
    }

    pub fn set_plan_inactive(&mut self, id: &str) -> Result<(), WeekplanError> {
        let mut plan = self.require_plan(id)?;
        if plan.is_completed {
            return Err(WeekplanError::plan_completed(&plan.plan_name));
        }
        plan.is_active = false;
        self.store.update_plan(&plan)?;

        self.invalidate();
        tracing::info!(plan_id = id, "plan deactivated");
        self.listeners.emit(&PlanEvent::Deactivated {
            plan_id: id.to_string(),
            automatic: false,
        });
        Ok(())
    }

    /// Mark completed and inactive in one write. Completing twice is a no-op.
    pub fn set_plan_completed(&mut self, id: &str) -> Result<(), WeekplanError> {
        let mut plan = self.require_plan(id)?;
        if plan.is_completed {
            return Ok(());
        }
        plan.is_completed = true;
        plan.is_active = false;
        self.store.update_plan(&plan)?;

        self.invalidate();
        tracing::info!(plan_id = id, "plan completed");
        self.listeners.emit(&PlanEvent::Completed {
            plan_id: id.to_string(),
        });
        Ok(())
    }

    pub fn mark_plan_opened(&mut self, id: &str) -> Result<(), WeekplanError> {
        let mut plan = self.require_plan(id)?;
        plan.last_opened_at = Some(self.clock.now());
        self.store.update_plan(&plan)?;

        self.invalidate();
        self.listeners.emit(&PlanEvent::Opened {
            plan_id: id.to_string(),
        });
        Ok(())
    }

    /// Full-record update of name, description, year and week. `week_name` is
    /// re-derived; the lifecycle flags and timestamps of `changes` are ignored
    /// and keep their stored values.
    pub fn update_plan(&mut self, changes: &Plan) -> Result<Plan, WeekplanError> {
        validate_plan_name(&changes.plan_name)?;
        validate_week(changes.week)?;
        let id = changes.id.as_str();

        let store = self.store;
        let plan = store.atomically(|| {
            let existing = store
                .plan_by_id(id)?
                .ok_or_else(|| WeekplanError::plan_not_found(id))?;
            if existing.plan_name != changes.plan_name {
                if let Some(other) = store.plan_by_name(&changes.plan_name)? {
                    if other.id != id {
                        return Err(WeekplanError::plan_name_conflict(&changes.plan_name));
                    }
                }
            }
            let updated = Plan {
                plan_name: changes.plan_name.clone(),
                description: normalize_description(changes.description.as_deref()),
                year: changes.year,
                week: changes.week,
                week_name: week_name(changes.year, changes.week),
                ..existing
            };
            store.update_plan(&updated)
        })?;

        self.invalidate();
        tracing::info!(plan_id = id, "plan updated");
        self.listeners.emit(&PlanEvent::Updated {
            plan_id: id.to_string(),
        });
        Ok(plan)
    }

    /// Delete a plan and its days.
    pub fn delete_plan(&mut self, id: &str) -> Result<(), WeekplanError> {
        let store = self.store;
        store.atomically(|| {
            store.delete_days_for_plan(id)?;
            store.delete_plan(id)
        })?;

        self.invalidate();
        tracing::info!(plan_id = id, "plan deleted");
        self.listeners.emit(&PlanEvent::Deleted {
            plan_id: id.to_string(),
        });
        Ok(())
    }

    // --- days ---

    /// Replace every day of a plan with `days`. All or nothing.
    pub fn replace_plan_days(
        &mut self,
        plan_id: &str,
        days: &[NewPlanDay],
    ) -> Result<Vec<PlanDay>, WeekplanError> {
        validate_days(days)?;
        let rows = build_day_rows(plan_id, days, self.clock.now());

        let store = self.store;
        store.atomically(|| {
            if store.plan_by_id(plan_id)?.is_none() {
                return Err(WeekplanError::plan_not_found(plan_id));
            }
            store.delete_days_for_plan(plan_id)?;
            store.insert_days(&rows)
        })?;

        tracing::info!(plan_id, days = rows.len(), "plan days replaced");
        self.listeners.emit(&PlanEvent::DaysChanged {
            plan_id: plan_id.to_string(),
        });
        self.store.days_for_plan(plan_id)
    }

    /// Set the content of one day, creating the day when the plan has none for it.
    pub fn set_plan_day_content(
        &mut self,
        plan_id: &str,
        day_of_week: u8,
        content: &str,
    ) -> Result<PlanDay, WeekplanError> {
        validate_day_of_week(day_of_week)?;
        let now = self.clock.now();

        let store = self.store;
        let day = store.atomically(|| {
            if store.plan_by_id(plan_id)?.is_none() {
                return Err(WeekplanError::plan_not_found(plan_id));
            }
            let existing = store
                .days_for_plan(plan_id)?
                .into_iter()
                .find(|d| d.day_of_week == day_of_week);
            match existing {
                Some(mut day) => {
                    day.content = content.to_string();
                    day.updated_at = now;
                    store.update_day(&day)
                }
                None => {
                    let row = new_day_row(plan_id, &NewPlanDay::new(day_of_week, content), now);
                    store.insert_days(std::slice::from_ref(&row))?;
                    Ok(row)
                }
            }
        })?;

        self.listeners.emit(&PlanEvent::DaysChanged {
            plan_id: plan_id.to_string(),
        });
        Ok(day)
    }

    fn require_plan(&self, id: &str) -> Result<Plan, WeekplanError> {
        self.store
            .plan_by_id(id)?
            .ok_or_else(|| WeekplanError::plan_not_found(id))
    }
}

fn count_live(plans: &[Plan]) -> u32 {
    plans.iter().filter(|p| p.is_live()).count() as u32
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

fn build_day_rows(plan_id: &str, days: &[NewPlanDay], now: DateTime<Utc>) -> Vec<PlanDay> {
    days.iter().map(|day| new_day_row(plan_id, day, now)).collect()
}

fn new_day_row(plan_id: &str, day: &NewPlanDay, now: DateTime<Utc>) -> PlanDay {
    let day_name = day
        .day_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .or_else(|| default_day_name(day.day_of_week))
        .unwrap_or_default();
    PlanDay {
        id: Ulid::new().to_string(),
        plan_id: plan_id.to_string(),
        day_of_week: day.day_of_week,
        day_name: day_name.to_string(),
        content: day.content.clone(),
        created_at: now,
        updated_at: now,
    }
}

pub(crate) fn validate_plan_name(name: &str) -> Result<(), WeekplanError> {
    if name.trim().is_empty() {
        return Err(WeekplanError::validation("Plan name must not be empty"));
    }
    Ok(())
}

pub(crate) fn validate_week(week: u32) -> Result<(), WeekplanError> {
    if !(1..=53).contains(&week) {
        return Err(WeekplanError::validation(format!(
            "Week must be between 1 and 53, got {week}"
        )));
    }
    Ok(())
}

fn validate_day_of_week(day_of_week: u8) -> Result<(), WeekplanError> {
    if day_of_week > 6 {
        return Err(WeekplanError::validation(format!(
            "Day of week must be between 0 (Sunday) and 6, got {day_of_week}"
        )));
    }
    Ok(())
}

fn validate_days(days: &[NewPlanDay]) -> Result<(), WeekplanError> {
    let mut seen = HashSet::new();
    for day in days {
        validate_day_of_week(day.day_of_week)?;
        if !seen.insert(day.day_of_week) {
            return Err(WeekplanError::validation(format!(
                "Day {} appears more than once",
                day.day_of_week
            )));
        }
    }
    Ok(())
}
