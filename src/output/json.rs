use serde_json::{json, Value};

use crate::error::WeekplanError;
use crate::models::{AppSettings, Plan, PlanDay};
use crate::service::CapacityStatus;

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &WeekplanError) -> Value {
    let mut v = json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    });
    if let Some(conflict) = &err.capacity {
        let active: Vec<_> = conflict.active_plans.iter().map(plan_json).collect();
        v["error"]["details"] = json!({
            "limit": conflict.limit,
            "active_plans": active
        });
    }
    v
}

pub fn print(v: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
    );
}

pub fn plan_json(p: &Plan) -> Value {
    json!({
        "id": p.id,
        "name": p.plan_name,
        "description": p.description,
        "year": p.year,
        "week": p.week,
        "week_name": p.week_name,
        "state": p.state().as_str(),
        "is_active": p.is_active,
        "is_completed": p.is_completed,
        "created_at": p.created_at.to_rfc3339(),
        "last_opened_at": p.last_opened_at.map(|t| t.to_rfc3339())
    })
}

pub fn plan_or_null(p: Option<&Plan>) -> Value {
    p.map(plan_json).unwrap_or(Value::Null)
}

pub fn day_json(d: &PlanDay) -> Value {
    json!({
        "id": d.id,
        "day_of_week": d.day_of_week,
        "day_name": d.day_name,
        "content": d.content,
        "updated_at": d.updated_at.to_rfc3339()
    })
}

pub fn days_json(days: &[PlanDay]) -> Value {
    Value::Array(days.iter().map(day_json).collect())
}

pub fn capacity_json(status: &CapacityStatus) -> Value {
    json!({
        "active_count": status.active_count,
        "limit": status.limit,
        "over_limit_by": status.over_limit_by(),
        "has_free_slot": status.has_free_slot()
    })
}

pub fn settings_json(s: &AppSettings) -> Value {
    json!({
        "max_active_plans": s.max_active_plans,
        "is_full_screen": s.is_full_screen,
        "language": s.language
    })
}

/// Shown when the limit is below the number of active plans.
pub fn over_limit_warning(status: &CapacityStatus) -> Option<String> {
    match status.over_limit_by() {
        0 => None,
        n => Some(format!(
            "{} plans are active but the limit is {}. Deactivate {} plan(s) before activating another.",
            status.active_count, status.limit, n
        )),
    }
}
