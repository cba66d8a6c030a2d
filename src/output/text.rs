use crate::error::WeekplanError;
use crate::models::{AppSettings, Plan, PlanDay};
use crate::service::CapacityStatus;

pub fn print_plan(p: &Plan) {
    println!("Plan: {} ({})", p.plan_name, p.id);
    println!("  Week: {}", p.week_name);
    if let Some(ref desc) = p.description {
        println!("  Description: {desc}");
    }
    println!("  State: {}", p.state().as_str());
    println!("  Created: {}", p.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(opened) = p.last_opened_at {
        println!("  Last opened: {}", opened.format("%Y-%m-%d %H:%M"));
    }
}

pub fn print_plan_list(plans: &[Plan]) {
    if plans.is_empty() {
        println!("No plans found.");
        return;
    }
    for p in plans {
        let marker = if p.is_live() { " *" } else { "" };
        println!(
            "  {} ({}) [{}] - {}{}",
            p.plan_name,
            &p.id[..std::cmp::min(8, p.id.len())],
            p.state().as_str(),
            p.week_name,
            marker
        );
    }
}

pub fn print_days(days: &[PlanDay]) {
    if days.is_empty() {
        println!("No days planned.");
        return;
    }
    for d in days {
        println!("  {:<10} {}", d.day_name, d.content);
    }
}

pub fn print_capacity(status: &CapacityStatus) {
    let slot = if status.has_free_slot() { "" } else { " (full)" };
    println!("Active plans: {}/{}{}", status.active_count, status.limit, slot);
}

pub fn print_settings(s: &AppSettings) {
    println!("max_active_plans = {}", s.max_active_plans);
    println!("is_full_screen   = {}", s.is_full_screen);
    println!("language         = {}", s.language);
}

pub fn print_error(e: &WeekplanError) {
    eprintln!("Error: {}", e.message);
    if let Some(conflict) = &e.capacity {
        eprintln!("Currently active:");
        for p in &conflict.active_plans {
            eprintln!("  {} ({})", p.plan_name, p.week_name);
        }
        eprintln!("Run `weekplan plan deactivate <name>` on one of them, then retry.");
    }
}
