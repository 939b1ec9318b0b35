//! Property-based tests over randomly generated task sets and job sets,
//! checking the universal invariants and algorithmic laws that have to hold
//! for any valid input, not just the handful of worked examples covered by
//! the per-module unit tests.

use proptest::collection::vec as vec_of;
use proptest::option::of as optional;
use proptest::prelude::*;

use rt_sched_lab::analyses::{fixed_priority, opa};
use rt_sched_lab::feasibility;
use rt_sched_lab::model::resources_from_jobs;
use rt_sched_lab::prelude::*;
use rt_sched_lab::simulate::resources;

fn raw_implicit_task() -> impl Strategy<Value = (u64, u64)> {
    (1u64..15, 20u64..100)
}

fn taskset_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Task>> {
    vec_of(raw_implicit_task(), min..=max).prop_map(|raws| {
        raws.into_iter()
            .enumerate()
            .map(|(i, (wcet, period))| Task::new((i + 1) as u32, wcet, period, period))
            .collect()
    })
}

proptest! {
    /// The hyperperiod is always a positive common multiple of every period.
    #[test]
    fn hyperperiod_is_multiple_of_every_period(tasks in taskset_strategy(1, 6)) {
        let h = feasibility::hyperperiod(&tasks);
        prop_assert!(h.get() > 0);
        for task in &tasks {
            prop_assert_eq!(h.get() % task.period.get(), 0);
        }
    }

    /// The deadline-point set is sorted, deduplicated, and every point lies
    /// in `(0, horizon]`.
    #[test]
    fn deadline_points_are_sorted_deduped_and_bounded(tasks in taskset_strategy(1, 6)) {
        let horizon = feasibility::hyperperiod(&tasks);
        let points = feasibility::deadline_points(&tasks, horizon);
        for w in points.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
        for p in &points {
            prop_assert!(p.get() > 0 && *p <= horizon);
        }
    }

    /// Whenever the fixed-priority analyzer reports a task set schedulable,
    /// every response-time entry it traced must actually meet its deadline
    /// -- the boolean verdict and the diagnostic trace cannot disagree.
    #[test]
    fn fixed_priority_verdict_agrees_with_its_trace(tasks in taskset_strategy(1, 5)) {
        let mut tasks = tasks;
        rt_sched_lab::priority::assign(&mut tasks, rt_sched_lab::priority::Policy::DeadlineMonotonic).unwrap();
        let verdict = fixed_priority::is_schedulable(&tasks);
        if verdict.schedulable && !verdict.decided_by_bound {
            prop_assert!(verdict.response_times.iter().all(|e| e.schedulable));
        }
        if !verdict.decided_by_bound {
            prop_assert_eq!(verdict.schedulable, verdict.response_times.iter().all(|e| e.schedulable));
        }
    }

    /// When the utilization bound alone certifies schedulability, utilization
    /// must not exceed the bound it was decided by.
    #[test]
    fn bound_decision_is_internally_consistent(tasks in taskset_strategy(1, 5)) {
        let verdict = fixed_priority::is_schedulable(&tasks);
        if verdict.decided_by_bound && verdict.schedulable {
            prop_assert!(verdict.utilization <= verdict.utilization_bound.unwrap());
        }
    }
}

fn task_triple() -> impl Strategy<Value = (u64, u64, u64)> {
    (1u64..6, 5u64..25, 1u64..25)
}

fn div_ceil(a: u64, b: u64) -> u64 {
    (a + b - 1) / b
}

/// Local re-implementation of the OPA module's interferer-set RTA, since
/// that helper is private: computes whether `task` meets its deadline when
/// every task in `higher` is assumed strictly higher priority.
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

fn schedulable_under(order: &[usize], tasks: &[Task]) -> bool {
    // order[0] is highest priority.
    order.iter().enumerate().all(|(rank, &i)| {
        let higher: Vec<&Task> = order[..rank].iter().map(|&j| &tasks[j]).collect();
        response_time_with_interferers(&tasks[i], &higher).is_some()
    })
}

fn permutations(n: usize) -> Vec<Vec<usize>> {
    fn go(remaining: Vec<usize>, acc: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if remaining.is_empty() {
            out.push(acc.clone());
            return;
        }
        for i in 0..remaining.len() {
            let mut rest = remaining.clone();
            let picked = rest.remove(i);
            acc.push(picked);
            go(rest, acc, out);
            acc.pop();
        }
    }
    let mut out = Vec::new();
    go((0..n).collect(), &mut Vec::new(), &mut out);
    out
}

proptest! {
    /// OPA's completeness law: if any priority ordering at all makes a task
    /// set schedulable under RTA, OPA must find one too (checked against a
    /// brute-force search over every ordering, feasible for the small task
    /// counts generated here).
    #[test]
    fn opa_completeness_vs_brute_force(raws in vec_of(task_triple(), 2..=4)) {
        let n = raws.len();
        let tasks: Vec<Task> = raws
            .iter()
            .enumerate()
            .map(|(i, &(w, p, d))| Task::new((i + 1) as u32, w, p, d))
            .collect();

        let any_feasible = permutations(n).iter().any(|perm| schedulable_under(perm, &tasks));

        let mut opa_tasks = tasks.clone();
        let opa_result = opa::assign(&mut opa_tasks).unwrap();
        prop_assert_eq!(any_feasible, opa_result.is_some());
    }
}

fn raw_job() -> impl Strategy<Value = (u64, Option<(u32, u64)>)> {
    (1u64..6, optional((1u32..=2u32, 1u64..4u64)))
}

fn jobset_strategy() -> impl Strategy<Value = Vec<Job>> {
    vec_of(raw_job(), 2..=4).prop_map(|raws| {
        let n = raws.len();
        raws.into_iter()
            .enumerate()
            .map(|(i, (wcet, req))| {
                let id = (i + 1) as u32;
                let priority = (n - i) as u32;
                let resource_sequence = match req {
                    Some((r, d)) => vec![ResourceRequest::new(r, d.min(wcet))],
                    None => vec![],
                };
                // Periods/deadlines large enough that no job is released a
                // second time within the bounded simulation below.
                Job::new(id, 0, wcet, priority, 1000, 1000, resource_sequence)
            })
            .collect()
    })
}

proptest! {
    /// Work conservation: whenever the resource simulator reports success
    /// under any of the three protocols, the sum of busy slots across the
    /// whole timeline equals the sum of every job's WCET -- no job runs for
    /// more or fewer ticks than its WCET demands.
    #[test]
    fn pip_conserves_total_work(jobs in jobset_strategy()) {
        let total_wcet: u64 = jobs.iter().map(|j| j.wcet.get()).sum();
        let resource_set = resources_from_jobs(&jobs, 2);
        let outcome = resources::simulate(jobs, resource_set, ResourceProtocol::PriorityInheritance);
        if outcome.success() {
            let busy = outcome.timeline.slots.iter().filter(|s| !s.is_idle()).count();
            prop_assert_eq!(busy as u64, total_wcet);
        }
    }

    #[test]
    fn icpp_conserves_total_work(jobs in jobset_strategy()) {
        let total_wcet: u64 = jobs.iter().map(|j| j.wcet.get()).sum();
        let resource_set = resources_from_jobs(&jobs, 2);
        let outcome = resources::simulate(jobs, resource_set, ResourceProtocol::ImmediateCeiling);
        if outcome.success() {
            let busy = outcome.timeline.slots.iter().filter(|s| !s.is_idle()).count();
            prop_assert_eq!(busy as u64, total_wcet);
        }
    }

    #[test]
    fn ocpp_conserves_total_work(jobs in jobset_strategy()) {
        let total_wcet: u64 = jobs.iter().map(|j| j.wcet.get()).sum();
        let resource_set = resources_from_jobs(&jobs, 2);
        let outcome = resources::simulate(jobs, resource_set, ResourceProtocol::OriginalCeiling);
        if outcome.success() {
            let busy = outcome.timeline.slots.iter().filter(|s| !s.is_idle()).count();
            prop_assert_eq!(busy as u64, total_wcet);
        }
    }

    /// At every slot, the timeline names at most one running job (the type
    /// already guarantees this -- `Slot::running` is `Option<TaskId>`, not a
    /// set -- this checks the simulator never produces a malformed slot by
    /// leaving both fields inconsistent).
    #[test]
    fn timeline_slots_are_well_formed(jobs in jobset_strategy()) {
        let resource_set = resources_from_jobs(&jobs, 2);
        let outcome = resources::simulate(jobs, resource_set, ResourceProtocol::PriorityInheritance);
        for slot in &outcome.timeline.slots {
            if slot.running.is_none() {
                prop_assert!(slot.held_resources.is_empty());
            }
        }
    }
}
