//! Plain-text board rendering. Everything takes `now` explicitly: projected
//! starts and slots move with the clock even when the store does not.

use client_core::BoardSnapshot;
use schedule::{Estimator, TimeSlots};
use shared::domain::{Table, TableStatus, TeamId};

use crate::config::Settings;

pub fn board(snapshot: &BoardSnapshot, settings: &Settings, now: i64) -> String {
    if snapshot.is_empty() {
        return "no tables\n".to_string();
    }
    let config = settings.estimator_config();
    let calendar = settings.calendar();
    let estimator = Estimator::new(&calendar, &config);
    let schedule = estimator.schedule(snapshot.tables(), now);
    let slots = estimator.time_slots(snapshot.tables(), now);

    let mut out = String::new();
    for group in snapshot.problem_groups() {
        if !group.problem.is_empty() {
            out.push_str(&format!("== {} ==\n", group.problem));
        }
        for name in &group.tables {
            let Some(table) = snapshot.table(name) else {
                continue;
            };
            out.push_str(&status_line(table));
            if let Some(projected) = schedule.table(name) {
                let queue: Vec<String> = projected
                    .starts
                    .iter()
                    .map(|start| format!("{} {}", start.team, slots.label(start.start)))
                    .collect();
                out.push_str(&format!("    queue: {}\n", queue.join(", ")));
            }
        }
    }

    let unavailable = snapshot.unavailable_teams();
    if !unavailable.is_empty() {
        let teams: Vec<&str> = unavailable.iter().map(TeamId::as_str).collect();
        out.push_str(&format!("busy teams: {}\n", teams.join(" ")));
    }
    out.push_str(&format!(
        "estimated finish: {}\n",
        slots.label(schedule.estimated_finish)
    ));
    out.push_str(&slot_line(slots));
    out
}

pub fn table(table: &Table, settings: &Settings, now: i64) -> String {
    let config = settings.estimator_config();
    let calendar = settings.calendar();
    let estimator = Estimator::new(&calendar, &config);
    let labels = estimator.time_slots(std::slice::from_ref(table), now);

    let mut out = status_line(table);
    for start in estimator.projected_starts(table, now).starts {
        out.push_str(&format!(
            "    {:>2}. {:<6} {}\n",
            start.position + 1,
            start.team,
            labels.label(start.start)
        ));
    }
    out
}

fn slot_line(slots: TimeSlots) -> String {
    let labels: Vec<String> = slots
        .map(|slot| format!("{} (+{}m)", slot.label, slot.seconds_from_now / 60))
        .collect();
    if labels.is_empty() {
        String::new()
    } else {
        format!("slots: {}\n", labels.join(" | "))
    }
}

fn status_line(table: &Table) -> String {
    let current = match (table.status, &table.current_coordination_team) {
        (TableStatus::Correcting, Some(team)) => format!(" with {team}"),
        _ => String::new(),
    };
    let coordinators = if table.coordinators.is_empty() {
        String::new()
    } else {
        format!(" [{}]", table.coordinators.join(", "))
    };
    format!(
        "{:<8} {:<10}{current}{coordinators}\n",
        table.name.as_str(),
        table.status.label()
    )
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
