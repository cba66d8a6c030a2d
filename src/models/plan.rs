use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle position derived from the two persisted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanState {
    Active,
    Inactive,
    Completed,
}

impl PlanState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub plan_name: String,
    pub description: Option<String>,
    pub year: i32,
    pub week: u32,
    pub week_name: String,
    pub is_active: bool,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub last_opened_at: Option<DateTime<Utc>>,
}

impl Plan {
    /// Counts against the active-plan limit.
    pub fn is_live(&self) -> bool {
        self.is_active && !self.is_completed
    }

    pub fn state(&self) -> PlanState {
        if self.is_completed {
            PlanState::Completed
        } else if self.is_active {
            PlanState::Active
        } else {
            PlanState::Inactive
        }
    }

    /// `last_opened_at`, falling back to `created_at`.
    pub fn recency(&self) -> DateTime<Utc> {
        self.last_opened_at.unwrap_or(self.created_at)
    }
}

pub fn week_name(year: i32, week: u32) -> String {
    format!("{year} / {week}. Week")
}

/// Oldest first. Ties fall back to creation time, then id, so the order is total.
pub fn by_recency(a: &Plan, b: &Plan) -> Ordering {
    a.recency()
        .cmp(&b.recency())
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Most recently relevant plan in `plans`.
pub fn most_recent<'a, I>(plans: I) -> Option<&'a Plan>
where
    I: IntoIterator<Item = &'a Plan>,
{
    plans.into_iter().max_by(|a, b| by_recency(a, b))
}

/// Demotion candidate: the least recently relevant plan.
pub fn least_recent<'a, I>(plans: I) -> Option<&'a Plan>
where
    I: IntoIterator<Item = &'a Plan>,
{
    plans.into_iter().min_by(|a, b| by_recency(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plan(id: &str, created: i64, opened: Option<i64>) -> Plan {
        Plan {
            id: id.to_string(),
            plan_name: id.to_string(),
            description: None,
            year: 2025,
            week: 1,
            week_name: week_name(2025, 1),
            is_active: true,
            is_completed: false,
            created_at: Utc.timestamp_opt(created, 0).unwrap(),
            last_opened_at: opened.map(|t| Utc.timestamp_opt(t, 0).unwrap()),
        }
    }

    #[test]
    fn week_name_format() {
        assert_eq!(week_name(2025, 7), "2025 / 7. Week");
    }

    #[test]
    fn recency_prefers_last_opened() {
        let a = plan("a", 100, Some(500));
        let b = plan("b", 300, None);
        assert_eq!(least_recent([&a, &b]).unwrap().id, "b");
        assert_eq!(most_recent([&a, &b]).unwrap().id, "a");
    }

    #[test]
    fn recency_ties_break_on_created_then_id() {
        let a = plan("a", 100, Some(500));
        let b = plan("b", 200, Some(500));
        assert_eq!(least_recent([&b, &a]).unwrap().id, "a");

        let c = plan("c", 100, Some(500));
        assert_eq!(most_recent([&a, &c]).unwrap().id, "c");
    }

    #[test]
    fn state_follows_flags() {
        let mut p = plan("p", 0, None);
        assert_eq!(p.state(), PlanState::Active);
        p.is_active = false;
        assert_eq!(p.state(), PlanState::Inactive);
        p.is_completed = true;
        assert_eq!(p.state(), PlanState::Completed);
        assert!(!p.is_live());
    }
}
