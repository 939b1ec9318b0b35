//! Core value types: tasks, jobs, resources, and the discrete time domain.
//!
//! Tasks and resources are created once per analysis run from the input set
//! and are mutated only by the simulators in [`crate::simulate`].

pub mod taskset_serde;

use std::collections::HashSet;

pub mod prelude {
    pub use super::{
        Job, Priority, Resource, ResourceId, ResourceRequest, Task, TaskId, Time,
    };
}

/// A discrete simulation tick. The system uses a simple integer time model:
/// there is no notion of sub-tick resolution, and every duration (WCET,
/// period, deadline, critical-section length) is given in the same unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Time(pub u64);

impl Time {
    pub const ZERO: Time = Time(0);

    pub fn new(value: u64) -> Self {
        Time(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::ops::Add for Time {
    type Output = Time;
    fn add(self, rhs: Self) -> Self::Output {
        Time(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Time {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Self) -> Self::Output {
        Time(self.0 - rhs.0)
    }
}

impl std::ops::SubAssign for Time {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl std::ops::Mul<u64> for Time {
    type Output = Time;
    fn mul(self, rhs: u64) -> Self::Output {
        Time(self.0 * rhs)
    }
}

impl std::ops::Mul<Time> for u64 {
    type Output = Time;
    fn mul(self, rhs: Time) -> Self::Output {
        rhs * self
    }
}

impl std::ops::Div<u64> for Time {
    type Output = Time;
    fn div(self, rhs: u64) -> Self::Output {
        Time(self.0 / rhs)
    }
}

impl std::iter::Sum for Time {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Time::ZERO, |acc, val| acc + val)
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduling priority. Higher numeric value means higher priority
/// throughout this crate. `Priority(0)` is the sentinel for "unassigned".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    pub const UNASSIGNED: Priority = Priority(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u32);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// A periodic, preemptive task. `id` is a unique positive integer; `priority`
/// is `Priority::UNASSIGNED` until a priority-assignment pass fills it in.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub wcet: Time,
    pub period: Time,
    pub deadline: Time,
    #[serde(default)]
    pub priority: Priority,
}

impl Task {
    pub fn new(id: u32, wcet: u64, period: u64, deadline: u64) -> Self {
        Task {
            id: TaskId(id),
            wcet: Time::new(wcet),
            period: Time::new(period),
            deadline: Time::new(deadline),
            priority: Priority::UNASSIGNED,
        }
    }

    pub fn utilization(&self) -> f64 {
        self.wcet.get() as f64 / self.deadline.get() as f64
    }

    pub fn utilization_by_period(&self) -> f64 {
        self.wcet.get() as f64 / self.period.get() as f64
    }

    pub fn has_implicit_deadline(&self) -> bool {
        self.deadline == self.period
    }

    pub fn has_constrained_deadline(&self) -> bool {
        self.deadline <= self.period
    }
}

/// One critical section a job will enter exactly once, in sequence order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct ResourceRequest {
    pub resource: ResourceId,
    pub duration: Time,
    #[serde(default)]
    pub is_finished: bool,
}

impl ResourceRequest {
    pub fn new(resource: u32, duration: u64) -> Self {
        ResourceRequest {
            resource: ResourceId(resource),
            duration: Time::new(duration),
            is_finished: false,
        }
    }
}

/// A job: one instance of a (possibly resource-using) periodic task.
///
/// `remaining_wcet`, `current_priority`, `is_blocked`, `is_finished`, and
/// `waiting_for` are mutated only by [`crate::simulate::resources`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Job {
    pub id: TaskId,
    pub release_time: Time,
    pub wcet: Time,
    pub base_priority: Priority,
    pub period: Time,
    pub deadline: Time,
    #[serde(default)]
    pub resource_sequence: Vec<ResourceRequest>,

    #[serde(skip, default = "Job::default_remaining")]
    pub remaining_wcet: Time,
    #[serde(skip)]
    pub current_priority: Priority,
    #[serde(skip)]
    pub next_request: usize,
    #[serde(skip)]
    pub is_blocked: bool,
    #[serde(skip)]
    pub is_finished: bool,
    #[serde(skip)]
    pub waiting_for: Option<ResourceId>,
}

impl Job {
    pub fn new(
        id: u32,
        release_time: u64,
        wcet: u64,
        base_priority: u32,
        period: u64,
        deadline: u64,
        resource_sequence: Vec<ResourceRequest>,
    ) -> Self {
        let wcet = Time::new(wcet);
        let base_priority = Priority(base_priority);
        Job {
            id: TaskId(id),
            release_time: Time::new(release_time),
            wcet,
            base_priority,
            period: Time::new(period),
            deadline: Time::new(deadline),
            resource_sequence,
            remaining_wcet: wcet,
            current_priority: base_priority,
            next_request: 0,
            is_blocked: false,
            is_finished: false,
            waiting_for: None,
        }
    }

    /// Called by serde on deserialization and by [`Job::reset`] to restore
    /// every runtime-mutable field to its initial value for a fresh run.
    fn default_remaining() -> Time {
        Time::ZERO
    }

    /// Reset all runtime-mutable fields so the job can be simulated again
    /// from a freshly-parsed description.
    pub fn reset(&mut self) {
        self.remaining_wcet = self.wcet;
        self.current_priority = self.base_priority;
        self.next_request = 0;
        self.is_blocked = false;
        self.is_finished = false;
        self.waiting_for = None;
        for req in &mut self.resource_sequence {
            req.is_finished = false;
        }
    }

    /// The request the job is currently working through, if any remain.
    pub fn current_request(&self) -> Option<&ResourceRequest> {
        self.resource_sequence.get(self.next_request)
    }

    pub fn current_request_mut(&mut self) -> Option<&mut ResourceRequest> {
        self.resource_sequence.get_mut(self.next_request)
    }

    pub fn is_runnable(&self) -> bool {
        !self.is_finished && !self.is_blocked
    }
}

/// A lockable resource shared by jobs' critical sections. `ceiling_priority`
/// is the maximum base priority among jobs that ever request it -- computed
/// once up front from the job set, per spec.
#[derive(Clone, Debug, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub ceiling_priority: Priority,
    #[serde(skip)]
    pub is_held: bool,
    #[serde(skip)]
    pub held_by: Option<TaskId>,
}

impl Resource {
    pub fn new(id: u32) -> Self {
        Resource {
            id: ResourceId(id),
            ceiling_priority: Priority::UNASSIGNED,
            is_held: false,
            held_by: None,
        }
    }
}

/// Derive the set of resources referenced by a job set, with ceiling
/// priorities computed as the max base priority among requesting jobs.
pub fn resources_from_jobs(jobs: &[Job], num_resources: u32) -> Vec<Resource> {
    let mut resources: Vec<Resource> = (1..=num_resources).map(Resource::new).collect();
    let mut seen: HashSet<ResourceId> = HashSet::new();
    for job in jobs {
        for req in &job.resource_sequence {
            seen.insert(req.resource);
            let idx = (req.resource.0 - 1) as usize;
            if let Some(resource) = resources.get_mut(idx) {
                if job.base_priority > resource.ceiling_priority {
                    resource.ceiling_priority = job.base_priority;
                }
            }
        }
    }
    resources
}
