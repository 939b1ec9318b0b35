//! Audsley's Optimal Priority Assignment (OPA) for arbitrary deadlines.
//!
//! From lowest priority level up to highest, search for an unassigned task
//! that passes RTA when placed at that level with every other unassigned
//! task treated as higher-priority interference. The crucial property: if
//! any priority assignment makes the set schedulable, OPA finds one.

use crate::error::InternalError;
use crate::model::{Priority, Task, TaskId, Time};

fn div_ceil(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

/// Response time of `task` when every task in `higher` is assumed to have
/// strictly higher priority (full preemptive interference, deadline bound
/// by WCET alone otherwise -- same fixed point as
/// [`crate::analyses::fixed_priority::response_time`], but with an
/// explicit interference set rather than one inferred from deadlines).
fn response_time_with_interferers(task: &Task, higher: &[&Task]) -> Option<Time> {
    let mut r = task.wcet;
    loop {
        if r > task.deadline {
            return None;
        }
        let mut next = task.wcet;
        for other in higher {
            next += other.wcet * div_ceil(r.get(), other.period.get());
        }
        if next == r {
            return Some(r);
        }
        r = next;
    }
}

/// Run Audsley's OPA over `tasks`, mutating each task's `priority` field on
/// success. Priorities are filled from level 1 (lowest) upward; the
/// returned vector lists `(TaskId, Priority)` pairs in the order they were
/// fixed (lowest priority first).
///
/// Returns `Ok(None)` if no priority assignment makes the set schedulable
/// (infeasible, not an error); `Err` only for an internal invariant failure.
pub fn assign(tasks: &mut [Task]) -> Result<Option<Vec<(TaskId, Priority)>>, InternalError> {
    let n = tasks.len();
    let mut unassigned: Vec<usize> = (0..n).collect();
    let mut fixed: Vec<(TaskId, Priority)> = Vec::with_capacity(n);

    for level in 1..=n as u32 {
        let mut found = None;
        for &candidate_idx in &unassigned {
            let higher: Vec<&Task> = unassigned
                .iter()
                .filter(|&&idx| idx != candidate_idx)
                .map(|&idx| &tasks[idx])
                .collect();

            if response_time_with_interferers(&tasks[candidate_idx], &higher).is_some() {
                found = Some(candidate_idx);
                break;
            }
        }

        let idx = match found {
            Some(idx) => idx,
            None => return Ok(None),
        };

        tasks[idx].priority = Priority(level);
        fixed.push((tasks[idx].id, tasks[idx].priority));
        unassigned.retain(|&i| i != idx);
    }

    if !unassigned.is_empty() {
        return Err(InternalError::InvariantViolation(
            "OPA terminated with unassigned tasks remaining".to_string(),
        ));
    }

    Ok(Some(fixed))
}
