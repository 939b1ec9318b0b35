//! Human-readable and JSON rendering for the three answer shapes the CLI
//! produces: a schedulability [`Verdict`], a priority assignment, and a
//! simulation [`SimOutcome`].

use rt_sched_lab::analyses::Verdict;
use rt_sched_lab::model::{Priority, TaskId};
use rt_sched_lab::simulate::resources::SimOutcome;
use rt_sched_lab::simulate::Timeline;

use crate::args::OutputFormat;

pub fn render_verdict(verdict: &Verdict, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(verdict).unwrap()),
        OutputFormat::Text => {
            let bound = verdict
                .utilization_bound
                .map(|b| format!("{b:.4}"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "schedulable: {} (utilization {:.4}, bound {}, decided by {})",
                verdict.schedulable,
                verdict.utilization,
                bound,
                if verdict.decided_by_bound { "utilization bound" } else { "exact test" },
            );
            for entry in &verdict.response_times {
                let mark = if entry.schedulable { "ok" } else { "MISS" };
                println!(
                    "  {} response_time={} deadline={} [{}]",
                    entry.task, entry.response_time, entry.deadline, mark
                );
            }
            for point in &verdict.demand_points {
                let mark = if point.satisfied { "ok" } else { "MISS" };
                println!("  L={} demand={} [{}]", point.time, point.demand, mark);
            }
        }
    }
}

pub fn render_timeline(timeline: &Timeline, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(timeline).unwrap()),
        OutputFormat::Text => {
            for (t, slot) in timeline.slots.iter().enumerate() {
                match slot.running {
                    Some(task) => println!("  t={t}: {task}"),
                    None => println!("  t={t}: idle"),
                }
            }
        }
    }
}

pub fn render_assignment(assignment: &Option<Vec<(TaskId, Priority)>>, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(assignment).unwrap()),
        OutputFormat::Text => match assignment {
            None => println!("no priority assignment makes this task set schedulable"),
            Some(fixed) => {
                println!("priority assignment (fixed lowest-first):");
                for (task, priority) in fixed {
                    println!("  {task} -> priority {priority}");
                }
            }
        },
    }
}

pub fn render_sim_outcome(outcome: &SimOutcome, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            #[derive(serde::Serialize)]
            struct Rendered<'a> {
                success: bool,
                error: &'a Option<rt_sched_lab::error::SimError>,
                timeline: &'a rt_sched_lab::simulate::Timeline,
            }
            let rendered = Rendered {
                success: outcome.success(),
                error: &outcome.error,
                timeline: &outcome.timeline,
            };
            println!("{}", serde_json::to_string_pretty(&rendered).unwrap());
        }
        OutputFormat::Text => {
            match &outcome.error {
                None => println!("all jobs finished ({} slots)", outcome.timeline.len()),
                Some(err) => println!("simulation failed at t={}: {err}", outcome.timeline.len()),
            }
            for (t, slot) in outcome.timeline.slots.iter().enumerate() {
                match slot.running {
                    Some(task) if slot.held_resources.is_empty() => println!("  t={t}: {task}"),
                    Some(task) => println!("  t={t}: {task} holding {:?}", slot.held_resources),
                    None => println!("  t={t}: idle"),
                }
            }
        }
    }
}
