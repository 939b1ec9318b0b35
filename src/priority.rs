//! Static priority assignment: rate-monotonic (RM) and deadline-monotonic (DM).

use crate::error::InternalError;
use crate::model::{Priority, Task, Time};

/// The key RM/DM assignment sorts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Policy {
    /// Rate-monotonic: key is `period`.
    RateMonotonic,
    /// Deadline-monotonic: key is `deadline`.
    DeadlineMonotonic,
}

impl Policy {
    fn key(self, task: &Task) -> Time {
        match self {
            Policy::RateMonotonic => task.period,
            Policy::DeadlineMonotonic => task.deadline,
        }
    }
}

/// Assign priorities to every task with `priority == Priority::UNASSIGNED`,
/// from highest priority down to lowest. Repeatedly picks the unassigned
/// task with the smallest key (period under RM, deadline under DM); ties are
/// broken by first-encountered order, matching the stable scan the reference
/// implementation performs.
///
/// Mutates `tasks` in place and also returns the assignment as
/// `(TaskId, Priority)` pairs in assignment order (highest priority first).
pub fn assign(tasks: &mut [Task], policy: Policy) -> Result<Vec<(crate::model::TaskId, Priority)>, InternalError> {
    let n = tasks.len();
    let mut assignment = Vec::with_capacity(n);
    let mut next_priority = n as u32;

    for _ in 0..n {
        let candidate = tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.priority.is_assigned())
            .min_by_key(|(idx, t)| (policy.key(t), *idx))
            .map(|(idx, _)| idx);

        let idx = candidate.ok_or_else(|| {
            InternalError::InvariantViolation(
                "no unassigned task found during priority assignment".to_string(),
            )
        })?;

        tasks[idx].priority = Priority(next_priority);
        assignment.push((tasks[idx].id, tasks[idx].priority));
        next_priority -= 1;
    }

    Ok(assignment)
}
