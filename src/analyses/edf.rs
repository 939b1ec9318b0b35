//! EDF/LST schedulability via the processor-demand criterion.

use super::{DemandPoint, Verdict};
use crate::feasibility;
use crate::model::{Task, Time};

/// Demand bound at a single deadline point `l`:
/// `sum_i floor((l + period_i - deadline_i) / period_i) * wcet_i`.
///
/// `deadline_i` may exceed `l + period_i` (spec §3 allows `deadline >
/// period`); such a task contributes no completed jobs by `l` rather than
/// underflowing.
fn demand_at(tasks: &[Task], l: Time) -> Time {
    let mut total = 0u64;
    for task in tasks {
        let bound = l.get() + task.period.get();
        let jobs = if bound >= task.deadline.get() {
            (bound - task.deadline.get()) / task.period.get()
        } else {
            0
        };
        total += jobs * task.wcet.get();
    }
    Time::new(total)
}

/// Run the EDF/LST schedulability test: utilization test first, then (for
/// constrained/arbitrary deadlines) the processor-demand criterion over
/// every deadline point in `[0, hyperperiod]`.
pub fn is_schedulable(tasks: &[Task]) -> Verdict {
    let utilization = feasibility::utilization(tasks);

    if utilization <= 1.0 {
        return Verdict {
            schedulable: true,
            utilization,
            utilization_bound: Some(1.0),
            decided_by_bound: true,
            response_times: Vec::new(),
            demand_points: Vec::new(),
        };
    }

    let implicit_deadlines = tasks.iter().all(Task::has_implicit_deadline);
    if implicit_deadlines {
        return Verdict {
            schedulable: false,
            utilization,
            utilization_bound: Some(1.0),
            decided_by_bound: true,
            response_times: Vec::new(),
            demand_points: Vec::new(),
        };
    }

    let horizon = feasibility::hyperperiod(tasks);
    let points = feasibility::deadline_points(tasks, horizon);

    let mut demand_points = Vec::with_capacity(points.len());
    let mut schedulable = true;
    for l in points {
        let demand = demand_at(tasks, l);
        let satisfied = demand <= l;
        if !satisfied {
            schedulable = false;
        }
        demand_points.push(DemandPoint { time: l, demand, satisfied });
    }

    Verdict {
        schedulable,
        utilization,
        utilization_bound: Some(1.0),
        decided_by_bound: false,
        response_times: Vec::new(),
        demand_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Task;

    #[test]
    fn edf_feasible_by_utilization() {
        // Concrete scenario 3.
        let tasks = [Task::new(1, 22, 60, 60), Task::new(2, 14, 50, 50), Task::new(3, 5, 20, 20)];
        let verdict = is_schedulable(&tasks);
        assert!(verdict.schedulable);
        assert!(verdict.decided_by_bound);
    }

    #[test]
    fn edf_feasible_by_demand() {
        // Concrete scenario 4: utilization > 1, demand criterion must hold
        // at every deadline point in [0, lcm(50, 20) = 100].
        let tasks = [Task::new(1, 21, 50, 40), Task::new(2, 8, 20, 15)];
        let verdict = is_schedulable(&tasks);
        assert!(!verdict.decided_by_bound);
        assert!(verdict.schedulable);
        assert!(!verdict.demand_points.is_empty());
    }

    #[test]
    fn lst_feasible_by_demand() {
        // Concrete scenario 5.
        let tasks = [Task::new(1, 3, 20, 7), Task::new(2, 2, 5, 4), Task::new(3, 2, 10, 8)];
        let verdict = is_schedulable(&tasks);
        assert!(verdict.schedulable);
    }

    #[test]
    fn unschedulable_implicit_deadline_over_utilized() {
        let tasks = [Task::new(1, 6, 10, 10), Task::new(2, 6, 10, 10)];
        let verdict = is_schedulable(&tasks);
        assert!(!verdict.schedulable);
    }

    #[test]
    fn deadline_greater_than_period_does_not_underflow() {
        // A task with deadline > period means some of the demand-point
        // terms have deadline_j > l + period_j; demand_at must clamp those
        // to zero jobs instead of underflowing the u64 subtraction.
        let tasks = [Task::new(1, 10, 10, 5), Task::new(2, 1, 100, 200)];
        let verdict = is_schedulable(&tasks);
        assert!(!verdict.decided_by_bound);
        assert!(!verdict.schedulable);
    }
}
