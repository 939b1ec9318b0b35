//! Timeline simulators: the plain preemptive simulator (no resources) and
//! the resource-sharing simulator (PIP/OCPP/ICPP).
//!
//! Both produce a [`Timeline`]: an ordered sequence of slots, one per time
//! unit, which is the sole structured artifact handed off to external
//! renderers or property tests -- rendering itself is out of scope.

pub mod preemptive;
pub mod resources;

pub mod prelude {
    pub use super::{Algorithm, ResourceProtocol, Slot, Timeline};
}

use std::collections::BTreeSet;

use crate::model::{ResourceId, TaskId};

/// The non-resource scheduling policies the preemptive simulator supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    RateMonotonic,
    DeadlineMonotonic,
    EarliestDeadlineFirst,
    LeastSlackTime,
}

/// The resource-sharing protocols the resource simulator supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceProtocol {
    PriorityInheritance,
    OriginalCeiling,
    ImmediateCeiling,
}

/// One time-unit slot in a timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct Slot {
    pub running: Option<TaskId>,
    /// Resources held at this slot, populated only by the resource-sharing
    /// simulator (always empty for the plain preemptive simulator).
    pub held_resources: BTreeSet<ResourceId>,
}

impl Slot {
    pub fn idle() -> Self {
        Slot::default()
    }

    pub fn running(task: TaskId) -> Self {
        Slot {
            running: Some(task),
            held_resources: BTreeSet::new(),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }
}

/// An ordered sequence of slots, one per time unit from 0 to the horizon.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[derive(serde::Serialize)]
pub struct Timeline {
    pub slots: Vec<Slot>,
}

impl Timeline {
    pub fn new() -> Self {
        Timeline { slots: Vec::new() }
    }

    pub fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Total slots in which `task` was recorded as running.
    pub fn busy_units(&self, task: TaskId) -> usize {
        self.slots.iter().filter(|s| s.running == Some(task)).count()
    }
}
