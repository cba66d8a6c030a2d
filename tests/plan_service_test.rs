use std::cell::{Cell, RefCell};

use chrono::{DateTime, Duration, TimeZone, Utc};

use weekplan::models::{NewPlanDay, Plan, PlanDay, SettingKey, SettingsPatch};
use weekplan::service::{Clock, PlanEvent};
use weekplan::store::{PlanDayStore, PlanStore, SettingsStore, Transactional};
use weekplan::{Database, ErrorCode, PlanService, SettingsService, WeekplanError};

// ─── helpers ───────────────────────────────────────────────────────

/// Advances one second per reading so recency is strictly ordered.
struct StepClock {
    now: Cell<DateTime<Utc>>,
}

impl StepClock {
    fn new() -> Self {
        Self {
            now: Cell::new(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap()),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.now.get();
        self.now.set(now + Duration::seconds(1));
        now
    }
}

fn db() -> Database {
    Database::open_in_memory().expect("in-memory db")
}

fn active_names<S, T>(service: &mut PlanService<'_, S, T>) -> Vec<String>
where
    S: PlanStore + PlanDayStore + Transactional,
    T: SettingsStore,
{
    service
        .get_active_plans()
        .into_iter()
        .map(|p| p.plan_name)
        .collect()
}

// ─── capacity ──────────────────────────────────────────────────────

#[test]
fn create_demotes_previous_plan_at_limit() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let a = service.create_plan("A", None, 2025, 10, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 11, &[]).unwrap();

    let a = service.get_plan_by_id(&a.id).unwrap();
    assert!(!a.is_active);
    assert!(!a.is_completed);
    assert!(b.is_active);
    assert_eq!(service.get_active_plan().unwrap().id, b.id);
    assert!(service.has_active_plan());
}

#[test]
fn create_demotes_least_recently_opened() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings.set_max_active_plans(2).unwrap();
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    service.create_plan("B", None, 2025, 2, &[]).unwrap();
    // A becomes the most recently opened, so B is the one to go.
    service.mark_plan_opened(&a.id).unwrap();
    service.create_plan("C", None, 2025, 3, &[]).unwrap();

    assert_eq!(active_names(&mut service), vec!["C", "A"]);
}

#[test]
fn activate_at_limit_fails_without_side_effects() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 2, &[]).unwrap();
    service.set_plan_inactive(&b.id).unwrap();
    service.set_plan_active(&a.id).unwrap();

    let err = service.set_plan_active(&b.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::CapacityExceeded);
    let conflict = err.capacity.expect("capacity details");
    assert_eq!(conflict.limit, 1);
    assert_eq!(conflict.active_plans.len(), 1);
    assert_eq!(conflict.active_plans[0].id, a.id);

    assert!(service.get_plan_by_id(&a.id).unwrap().is_active);
    assert!(!service.get_plan_by_id(&b.id).unwrap().is_active);
}

#[test]
fn activating_active_plan_only_touches_recency() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    service.set_plan_active(&a.id).unwrap();

    let reloaded = service.get_plan_by_id(&a.id).unwrap();
    assert!(reloaded.is_active);
    assert!(reloaded.last_opened_at > a.last_opened_at);
    assert_eq!(service.capacity_status().unwrap().active_count, 1);
}

#[test]
fn lowering_limit_never_demotes() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings.set_max_active_plans(3).unwrap();
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    for name in ["A", "B", "C"] {
        service.create_plan(name, None, 2025, 1, &[]).unwrap();
    }
    let d = service.create_plan("D", None, 2025, 1, &[]).unwrap();
    service.set_plan_inactive(&d.id).unwrap();
    let e = service.create_plan("E", None, 2025, 1, &[]).unwrap();
    service.set_plan_inactive(&e.id).unwrap();
    // A was demoted by D; only B and C are left.
    let before = active_names(&mut service);
    assert_eq!(before, vec!["C", "B"]);

    let status = service.set_capacity_limit(1).unwrap();
    assert_eq!(status.limit, 1);
    assert_eq!(status.active_count, before.len() as u32);
    assert_eq!(active_names(&mut service), before);

    let err = service.set_plan_active(&d.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::CapacityExceeded);
    let conflict = err.capacity.unwrap();
    assert_eq!(conflict.limit, 1);
    let listed: Vec<String> = conflict.active_plans.into_iter().map(|p| p.plan_name).collect();
    assert_eq!(listed, before);
}

#[test]
fn three_active_plans_over_lowered_limit() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings.set_max_active_plans(3).unwrap();
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    for name in ["A", "B", "C"] {
        service.create_plan(name, None, 2025, 1, &[]).unwrap();
    }
    settings.set_max_active_plans(4).unwrap();
    let fourth = service.create_plan("D", None, 2025, 1, &[]).unwrap();
    service.set_plan_inactive(&fourth.id).unwrap();

    let status = service.set_capacity_limit(1).unwrap();
    assert_eq!(status.active_count, 3);
    assert_eq!(status.over_limit_by(), 2);

    let err = service.set_plan_active(&fourth.id).unwrap_err();
    let conflict = err.capacity.unwrap();
    assert_eq!(conflict.limit, 1);
    let listed: Vec<String> = conflict.active_plans.into_iter().map(|p| p.plan_name).collect();
    assert_eq!(listed, vec!["C", "B", "A"]);
}

#[test]
fn limit_read_fresh_from_storage() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());
    assert_eq!(settings.max_active_plans().unwrap(), 1);

    // Written behind the service's back.
    db.set_setting(SettingKey::MaxActivePlans, "2").unwrap();
    service.create_plan("A", None, 2025, 1, &[]).unwrap();
    service.create_plan("B", None, 2025, 1, &[]).unwrap();
    assert_eq!(service.get_active_plans().len(), 2);
}

// ─── names ─────────────────────────────────────────────────────────

#[test]
fn duplicate_name_rejected() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let first = service.create_plan("Sprint 1", None, 2025, 1, &[]).unwrap();
    let err = service.create_plan("Sprint 1", None, 2025, 2, &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::PlanNameConflict);

    let all = service.get_all_plans();
    assert_eq!(all.len(), 1);
    // The failed create did not demote the existing plan.
    assert!(service.get_plan_by_id(&first.id).unwrap().is_active);
}

#[test]
fn update_plan_name_conflict_and_lifecycle_fields_kept() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    service.create_plan("alpha", None, 2025, 1, &[]).unwrap();
    let beta = service.create_plan("beta", Some("  "), 2025, 1, &[]).unwrap();
    assert_eq!(beta.description, None);

    let mut renamed = beta.clone();
    renamed.plan_name = "alpha".into();
    let err = service.update_plan(&renamed).unwrap_err();
    assert_eq!(err.code, ErrorCode::PlanNameConflict);

    let mut changes = beta.clone();
    changes.plan_name = "gamma".into();
    changes.week = 9;
    changes.is_active = false;
    changes.is_completed = true;
    let updated = service.update_plan(&changes).unwrap();
    assert_eq!(updated.plan_name, "gamma");
    assert_eq!(updated.week_name, "2025 / 9. Week");
    assert!(updated.is_active);
    assert!(!updated.is_completed);
    assert_eq!(updated.created_at, beta.created_at);
}

#[test]
fn update_keeping_own_name_is_allowed() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let plan = service.create_plan("Sprint", None, 2025, 1, &[]).unwrap();
    let mut changes = plan.clone();
    changes.description = Some("focus".into());
    let updated = service.update_plan(&changes).unwrap();
    assert_eq!(updated.description.as_deref(), Some("focus"));
}

#[test]
fn invalid_input_rejected() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);

    let err = service.create_plan("", None, 2025, 1, &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    let err = service.create_plan("x", None, 2025, 0, &[]).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    let err = service
        .create_plan("x", None, 2025, 1, &[NewPlanDay::new(9, "?")])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(service.get_all_plans().is_empty());
}

// ─── lifecycle ─────────────────────────────────────────────────────

#[test]
fn completion_is_terminal() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let p = service.create_plan("P", None, 2025, 1, &[]).unwrap();
    service.set_plan_completed(&p.id).unwrap();

    let done = service.get_plan_by_id(&p.id).unwrap();
    assert!(!done.is_active);
    assert!(done.is_completed);
    assert!(service.get_active_plan().is_none());

    assert_eq!(
        service.set_plan_active(&p.id).unwrap_err().code,
        ErrorCode::PlanCompleted
    );
    assert_eq!(
        service.set_plan_inactive(&p.id).unwrap_err().code,
        ErrorCode::PlanCompleted
    );
    service.set_plan_completed(&p.id).unwrap();
    assert_eq!(service.get_plan_by_id(&p.id).unwrap(), done);
}

#[test]
fn completed_plan_frees_a_slot() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 1, &[]).unwrap();
    service.set_plan_completed(&b.id).unwrap();
    service.set_plan_active(&a.id).unwrap();
    assert_eq!(active_names(&mut service), vec!["A"]);
}

#[test]
fn last_opened_covers_every_state() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());
    assert!(service.get_last_opened_plan().is_none());

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 1, &[]).unwrap();
    service.set_plan_completed(&b.id).unwrap();
    assert_eq!(service.get_last_opened_plan().unwrap().id, b.id);

    service.mark_plan_opened(&a.id).unwrap();
    assert_eq!(service.get_last_opened_plan().unwrap().id, a.id);
}

#[test]
fn missing_plan_reported() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings);

    assert_eq!(service.set_plan_active("nope").unwrap_err().code, ErrorCode::PlanNotFound);
    assert_eq!(service.set_plan_inactive("nope").unwrap_err().code, ErrorCode::PlanNotFound);
    assert_eq!(service.set_plan_completed("nope").unwrap_err().code, ErrorCode::PlanNotFound);
    assert_eq!(service.delete_plan("nope").unwrap_err().code, ErrorCode::PlanNotFound);
    assert_eq!(service.get_plan_days("nope").unwrap_err().code, ErrorCode::PlanNotFound);
    assert!(service.get_plan_by_id("nope").is_none());
}

// ─── days ──────────────────────────────────────────────────────────

#[test]
fn replace_days_swaps_whole_set() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let p = service
        .create_plan(
            "P",
            None,
            2025,
            1,
            &[NewPlanDay::new(1, "standup"), NewPlanDay::new(2, "review")],
        )
        .unwrap();
    assert_eq!(service.get_plan_days(&p.id).unwrap().len(), 2);

    let days = service
        .replace_plan_days(&p.id, &[NewPlanDay::new(3, "retro")])
        .unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].day_of_week, 3);
    assert_eq!(days[0].day_name, "Wednesday");
    assert_eq!(service.get_plan_days(&p.id).unwrap(), days);
}

#[test]
fn failed_replace_keeps_old_days() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let p = service
        .create_plan("P", None, 2025, 1, &[NewPlanDay::new(1, "standup")])
        .unwrap();
    let err = service
        .replace_plan_days(&p.id, &[NewPlanDay::new(5, "a"), NewPlanDay::new(5, "b")])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let days = service.get_plan_days(&p.id).unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].content, "standup");
}

#[test]
fn day_content_updates_in_place_or_inserts() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let p = service
        .create_plan("P", None, 2025, 1, &[NewPlanDay::new(1, "standup")])
        .unwrap();
    let original = service.get_plan_days(&p.id).unwrap().remove(0);

    let edited = service.set_plan_day_content(&p.id, 1, "planning").unwrap();
    assert_eq!(edited.id, original.id);
    assert_eq!(edited.content, "planning");
    assert!(edited.updated_at > original.updated_at);

    let added = service.set_plan_day_content(&p.id, 6, "hike").unwrap();
    assert_eq!(added.day_name, "Saturday");
    assert_eq!(service.get_plan_days(&p.id).unwrap().len(), 2);

    let err = service.set_plan_day_content(&p.id, 7, "x").unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[test]
fn delete_removes_plan_and_days() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    let p = service
        .create_plan("P", None, 2025, 1, &[NewPlanDay::new(1, "standup")])
        .unwrap();
    service.delete_plan(&p.id).unwrap();

    assert!(service.get_plan_by_id(&p.id).is_none());
    assert!(db.days_for_plan(&p.id).unwrap().is_empty());
    assert!(db.plan_by_id(&p.id).unwrap().is_none());
}

// ─── notifications and cache ───────────────────────────────────────

#[test]
fn listeners_see_every_change() {
    let db = db();
    let settings = SettingsService::new(&db);
    let events = RefCell::new(Vec::new());
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());
    let id = service.on_plan_data_changed(|e| events.borrow_mut().push(e.clone()));

    let a = service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 1, &[]).unwrap();
    service.replace_plan_days(&b.id, &[NewPlanDay::new(0, "rest")]).unwrap();
    service.set_plan_completed(&b.id).unwrap();

    assert_eq!(
        *events.borrow(),
        vec![
            PlanEvent::Created { plan_id: a.id.clone() },
            PlanEvent::Deactivated { plan_id: a.id.clone(), automatic: true },
            PlanEvent::Created { plan_id: b.id.clone() },
            PlanEvent::DaysChanged { plan_id: b.id.clone() },
            PlanEvent::Completed { plan_id: b.id.clone() },
        ]
    );

    assert!(service.remove_listener(id));
    service.delete_plan(&a.id).unwrap();
    assert_eq!(events.borrow().len(), 5);
}

#[test]
fn failed_activation_emits_nothing() {
    let db = db();
    let settings = SettingsService::new(&db);
    let count = Cell::new(0);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());

    service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 1, &[]).unwrap();
    service.set_plan_inactive(&b.id).unwrap();
    let a = service.get_all_plans().into_iter().find(|p| p.plan_name == "A").unwrap();
    service.set_plan_active(&a.id).unwrap();

    service.on_plan_data_changed(|_| count.set(count.get() + 1));
    assert!(service.set_plan_active(&b.id).is_err());
    assert_eq!(count.get(), 0);
}

#[test]
fn refresh_picks_up_external_writes() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());
    let p = service.create_plan("P", None, 2025, 1, &[]).unwrap();
    assert_eq!(service.get_all_plans().len(), 1);

    let mut external = p.clone();
    external.plan_name = "Renamed".into();
    db.update_plan(&external).unwrap();
    assert_eq!(service.get_all_plans()[0].plan_name, "P");

    let plans = service.refresh().unwrap();
    assert_eq!(plans[0].plan_name, "Renamed");
    assert!(!service.is_degraded());
}

// ─── settings ──────────────────────────────────────────────────────

#[test]
fn settings_round_trip_through_store() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings
        .update_settings(SettingsPatch {
            max_active_plans: Some(2),
            is_full_screen: Some(true),
            language: Some("tr".into()),
        })
        .unwrap();

    let stored = db.all_settings().unwrap();
    assert_eq!(stored.get("max_active_plans").map(String::as_str), Some("2"));
    assert_eq!(stored.get("is_full_screen").map(String::as_str), Some("true"));
    assert_eq!(stored.get("language").map(String::as_str), Some("tr"));

    let fresh = SettingsService::new(&db);
    assert!(fresh.is_full_screen().unwrap());
    assert_eq!(fresh.language().unwrap(), "tr");
}

// ─── injected storage failures ─────────────────────────────────────

/// Delegates to a real database, with switches for failures and for a
/// competing writer that commits just before the next transaction starts.
struct FlakyStore<'a> {
    db: &'a Database,
    fail_plan_loads: Cell<bool>,
    fail_day_inserts: Cell<bool>,
    limit_before_lock: Cell<Option<u32>>,
}

impl<'a> FlakyStore<'a> {
    fn new(db: &'a Database) -> Self {
        Self {
            db,
            fail_plan_loads: Cell::new(false),
            fail_day_inserts: Cell::new(false),
            limit_before_lock: Cell::new(None),
        }
    }
}

impl PlanStore for FlakyStore<'_> {
    fn all_plans(&self) -> Result<Vec<Plan>, WeekplanError> {
        if self.fail_plan_loads.get() {
            return Err(WeekplanError::database("disk I/O error"));
        }
        self.db.all_plans()
    }

    fn plan_by_id(&self, id: &str) -> Result<Option<Plan>, WeekplanError> {
        self.db.plan_by_id(id)
    }

    fn plan_by_name(&self, name: &str) -> Result<Option<Plan>, WeekplanError> {
        self.db.plan_by_name(name)
    }

    fn insert_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError> {
        self.db.insert_plan(plan)
    }

    fn update_plan(&self, plan: &Plan) -> Result<Plan, WeekplanError> {
        self.db.update_plan(plan)
    }

    fn delete_plan(&self, id: &str) -> Result<(), WeekplanError> {
        self.db.delete_plan(id)
    }
}

impl PlanDayStore for FlakyStore<'_> {
    fn days_for_plan(&self, plan_id: &str) -> Result<Vec<PlanDay>, WeekplanError> {
        self.db.days_for_plan(plan_id)
    }

    fn insert_days(&self, days: &[PlanDay]) -> Result<(), WeekplanError> {
        if self.fail_day_inserts.get() {
            return Err(WeekplanError::database("disk full"));
        }
        self.db.insert_days(days)
    }

    fn update_day(&self, day: &PlanDay) -> Result<PlanDay, WeekplanError> {
        self.db.update_day(day)
    }

    fn delete_days_for_plan(&self, plan_id: &str) -> Result<(), WeekplanError> {
        self.db.delete_days_for_plan(plan_id)
    }
}

impl Transactional for FlakyStore<'_> {
    fn atomically<T, F>(&self, f: F) -> Result<T, WeekplanError>
    where
        F: FnOnce() -> Result<T, WeekplanError>,
    {
        if let Some(limit) = self.limit_before_lock.take() {
            self.db
                .set_setting(SettingKey::MaxActivePlans, &limit.to_string())?;
        }
        self.db.atomically(f)
    }
}

#[test]
fn activation_checks_limit_committed_just_before_it() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings.set_max_active_plans(2).unwrap();
    let store = FlakyStore::new(&db);
    let mut service = PlanService::new(&store, &settings).with_clock(StepClock::new());

    service.create_plan("A", None, 2025, 1, &[]).unwrap();
    let b = service.create_plan("B", None, 2025, 1, &[]).unwrap();
    service.set_plan_inactive(&b.id).unwrap();
    assert_eq!(settings.max_active_plans().unwrap(), 2);

    store.limit_before_lock.set(Some(1));
    let err = service.set_plan_active(&b.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::CapacityExceeded);
    assert_eq!(err.capacity.unwrap().limit, 1);
    assert_eq!(active_names(&mut service), vec!["A"]);
}

#[test]
fn create_checks_limit_committed_just_before_it() {
    let db = db();
    let settings = SettingsService::new(&db);
    settings.set_max_active_plans(2).unwrap();
    let store = FlakyStore::new(&db);
    let mut service = PlanService::new(&store, &settings).with_clock(StepClock::new());

    service.create_plan("A", None, 2025, 1, &[]).unwrap();
    store.limit_before_lock.set(Some(1));
    service.create_plan("B", None, 2025, 1, &[]).unwrap();

    assert_eq!(active_names(&mut service), vec!["B"]);
}

#[test]
fn failed_load_degrades_reads_until_refresh() {
    let db = db();
    let settings = SettingsService::new(&db);
    let store = FlakyStore::new(&db);
    let mut service = PlanService::new(&store, &settings).with_clock(StepClock::new());
    service.create_plan("P", None, 2025, 1, &[]).unwrap();
    service.invalidate();

    store.fail_plan_loads.set(true);
    assert!(service.get_all_plans().is_empty());
    assert!(service.get_active_plan().is_none());
    assert!(service.get_last_opened_plan().is_none());
    assert!(!service.has_active_plan());
    assert!(service.is_degraded());

    assert_eq!(service.refresh().unwrap_err().code, ErrorCode::DatabaseError);
    assert!(service.is_degraded());

    store.fail_plan_loads.set(false);
    assert_eq!(service.refresh().unwrap().len(), 1);
    assert!(!service.is_degraded());
    assert_eq!(service.get_active_plan().unwrap().plan_name, "P");
}

#[test]
fn replace_rolls_back_when_insert_fails_after_delete() {
    let db = db();
    let settings = SettingsService::new(&db);
    let store = FlakyStore::new(&db);
    let mut service = PlanService::new(&store, &settings).with_clock(StepClock::new());
    let p = service
        .create_plan(
            "P",
            None,
            2025,
            1,
            &[NewPlanDay::new(1, "standup"), NewPlanDay::new(2, "review")],
        )
        .unwrap();

    store.fail_day_inserts.set(true);
    let err = service
        .replace_plan_days(&p.id, &[NewPlanDay::new(3, "retro")])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);

    let contents: Vec<String> = db
        .days_for_plan(&p.id)
        .unwrap()
        .into_iter()
        .map(|d| d.content)
        .collect();
    assert_eq!(contents, vec!["standup", "review"]);
}

#[test]
fn create_rolls_back_demotion_and_plan_when_days_fail() {
    let db = db();
    let settings = SettingsService::new(&db);
    let store = FlakyStore::new(&db);
    let mut service = PlanService::new(&store, &settings).with_clock(StepClock::new());
    let p = service.create_plan("P", None, 2025, 1, &[]).unwrap();

    store.fail_day_inserts.set(true);
    let err = service
        .create_plan("Q", None, 2025, 2, &[NewPlanDay::new(1, "standup")])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DatabaseError);

    assert!(db.plan_by_name("Q").unwrap().is_none());
    assert!(db.plan_by_id(&p.id).unwrap().unwrap().is_active);
    assert_eq!(active_names(&mut service), vec!["P"]);

    store.fail_day_inserts.set(false);
    service
        .create_plan("Q", None, 2025, 2, &[NewPlanDay::new(1, "standup")])
        .unwrap();
}

#[test]
fn storage_enforces_unique_names_and_days() {
    let db = db();
    let settings = SettingsService::new(&db);
    let mut service = PlanService::new(&db, &settings).with_clock(StepClock::new());
    let first = service
        .create_plan("Sprint 1", None, 2025, 1, &[NewPlanDay::new(1, "standup")])
        .unwrap();

    let mut twin = first.clone();
    twin.id = "01J0000000000000000000TWIN".to_string();
    assert_eq!(db.insert_plan(&twin).unwrap_err().code, ErrorCode::PlanNameConflict);
    assert_eq!(db.all_plans().unwrap().len(), 1);

    let mut day = db.days_for_plan(&first.id).unwrap().remove(0);
    day.id = "01J0000000000000000000TWIN".to_string();
    assert_eq!(db.insert_days(&[day]).unwrap_err().code, ErrorCode::ValidationError);
    assert_eq!(db.days_for_plan(&first.id).unwrap().len(), 1);
}
