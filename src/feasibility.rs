//! Feasibility utilities shared by every analyzer: utilization, hyperperiod,
//! and the deadline-point set used by the processor-demand criterion.

use crate::model::{Task, Time};
use ordered_float::OrderedFloat;

/// Total utilization using spec's deadline-denominator density, i.e.
/// `sum(wcet_i / deadline_i)`. This is non-standard -- the textbook
/// definition divides by period -- but it is what every analyzer in this
/// crate uses; [`utilization_by_period`] is exposed alongside it so callers
/// can recover the conventional figure for diagnostics.
pub fn utilization(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::utilization).sum()
}

/// The conventional utilization, `sum(wcet_i / period_i)`.
pub fn utilization_by_period(tasks: &[Task]) -> f64 {
    tasks.iter().map(Task::utilization_by_period).sum()
}

/// The task with the largest deadline-denominator utilization, if any.
pub fn largest_utilization(tasks: &[Task]) -> f64 {
    tasks
        .iter()
        .map(|t| OrderedFloat(t.utilization()))
        .max()
        .map(|m| m.0)
        .unwrap_or(0.0)
}

/// `lcm` of all task periods.
pub fn hyperperiod(tasks: &[Task]) -> Time {
    let h = tasks
        .iter()
        .map(|t| t.period.get())
        .fold(1u64, num::integer::lcm);
    Time::new(h)
}

/// The deadline-point set `L = { k*period_i + deadline_i : i, k >= 0 } ∩ [0, H]`,
/// sorted ascending and deduplicated, used by the processor-demand criterion.
pub fn deadline_points(tasks: &[Task], horizon: Time) -> Vec<Time> {
    let mut points: Vec<Time> = Vec::new();
    for task in tasks {
        let mut k = 0u64;
        loop {
            let point = task.period * k + task.deadline;
            if point > horizon {
                break;
            }
            points.push(point);
            k += 1;
        }
    }
    points.sort();
    points.dedup();
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: u32, wcet: u64, period: u64, deadline: u64) -> Task {
        Task::new(id, wcet, period, deadline)
    }

    #[test]
    fn rm_example_utilization() {
        let tasks = [t(1, 21, 80, 80), t(2, 9, 25, 25), t(3, 4, 20, 20)];
        assert!((utilization(&tasks) - 0.823).abs() < 0.001);
    }

    #[test]
    fn hyperperiod_is_lcm() {
        let tasks = [t(1, 21, 50, 40), t(2, 8, 20, 15)];
        assert_eq!(hyperperiod(&tasks), Time::new(100));
    }

    #[test]
    fn deadline_points_are_sorted_and_deduped() {
        let tasks = [t(1, 1, 10, 10), t(2, 1, 20, 10)];
        let points = deadline_points(&tasks, Time::new(20));
        assert_eq!(
            points,
            vec![Time::new(10), Time::new(20)]
        );
    }
}
