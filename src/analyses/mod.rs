//! Schedulability analyzers.
//!
//! Each analyzer returns a [`Verdict`] carrying the boolean schedulability
//! result alongside the diagnostic trace spec calls for (utilization,
//! bound, per-task response times, per-point demand values) -- an
//! `Unschedulable` result is data, not an error (see [`crate::error`]).

pub mod edf;
pub mod fixed_priority;
pub mod opa;

pub mod prelude {
    pub use super::{ResponseTimeEntry, Verdict};
}

use crate::model::{Time, TaskId};

/// Per-task response-time trace entry produced by exact RTA.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize)]
pub struct ResponseTimeEntry {
    pub task: TaskId,
    pub response_time: Time,
    pub deadline: Time,
    pub schedulable: bool,
}

/// The outcome of a schedulability analysis, plus the diagnostic values a
/// human (or a test) needs to understand why.
#[derive(Clone, Debug, Default, PartialEq)]
#[derive(serde::Serialize)]
pub struct Verdict {
    pub schedulable: bool,
    pub utilization: f64,
    pub utilization_bound: Option<f64>,
    pub decided_by_bound: bool,
    pub response_times: Vec<ResponseTimeEntry>,
    pub demand_points: Vec<DemandPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[derive(serde::Serialize)]
pub struct DemandPoint {
    pub time: Time,
    pub demand: Time,
    pub satisfied: bool,
}
