//! Error taxonomy.
//!
//! Following spec: `InputValidation` and internal invariant violations are
//! genuine errors; an `Unschedulable` verdict is not an error at all -- it is
//! an `Ok` result carrying `false` plus diagnostics (see [`crate::analyses`]).

use crate::model::{ResourceId, TaskId, Time};
use thiserror::Error;

/// Failures detected while parsing or validating a task/job set, before any
/// analysis or simulation runs. No partial analysis is produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("task set is empty")]
    EmptyTaskSet,

    #[error("task {task} has non-positive WCET")]
    NonPositiveWcet { task: TaskId },

    #[error("task {task} has non-positive period")]
    NonPositivePeriod { task: TaskId },

    #[error("task {task} has non-positive deadline")]
    NonPositiveDeadline { task: TaskId },

    #[error("job {job} references unknown resource {resource}")]
    UnknownResource { job: TaskId, resource: ResourceId },

    #[error("job {job} has a resource request with non-positive duration")]
    NonPositiveDuration { job: TaskId },

    #[error("job {job} requests {requested} total resource time, exceeding its WCET of {wcet}")]
    DurationExceedsWcet {
        job: TaskId,
        requested: Time,
        wcet: Time,
    },

    #[error("job {job} has non-positive base priority")]
    NonPositiveBasePriority { job: TaskId },
}

/// Failures detected by the discrete-event simulators while they run. Unlike
/// [`InputError`], the partial timeline accumulated up to the failure point
/// still has diagnostic value and is returned alongside the error by the
/// simulator entry points (see [`crate::simulate::resources::SimOutcome`]).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub enum SimError {
    #[error("job {job} missed its deadline at time {time}")]
    DeadlineMiss { job: TaskId, time: Time },

    #[error("job {job} did not finish before its next period boundary at time {time}")]
    PeriodOverrun { job: TaskId, time: Time },

    #[error(
        "deadlock at time {time}: no runnable job among {blocked:?}, waiting on {resources:?}"
    )]
    Deadlock {
        time: Time,
        blocked: Vec<TaskId>,
        resources: Vec<ResourceId>,
    },
}

/// Fatal conditions that should never occur on valid input and indicate a
/// bug in the analysis itself, e.g. a task left unassigned at the end of the
/// RM/DM priority loop. Analysis aborts immediately when one of these fires.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InternalError {
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}
