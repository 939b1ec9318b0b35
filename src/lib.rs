/*!
Offline schedulability analysis and discrete-event simulation for hard
real-time uniprocessor task sets.

The crate is organized around three stages that a caller chains in order:

1. Load and validate a task/job set ([`model::taskset_serde`]).
2. Run one of the schedulability analyzers ([`analyses`]) or a priority
   assignment pass ([`priority`], [`analyses::opa`]).
3. Optionally drive a discrete-event simulation to produce a concrete
   timeline ([`simulate`]).

[`feasibility`] holds utilities (utilization, hyperperiod, deadline points)
shared across stages 2 and 3. [`error`] collects the three error taxonomies:
input validation, simulation failure, and internal invariant violations.
*/

pub mod analyses;
pub mod error;
pub mod feasibility;
pub mod model;
pub mod priority;
pub mod simulate;

pub mod prelude {
    pub use crate::analyses::prelude::*;
    pub use crate::error::{InputError, InternalError, SimError};
    pub use crate::model::prelude::*;
    pub use crate::model::taskset_serde::prelude::*;
    pub use crate::priority::Policy;
    pub use crate::simulate::prelude::*;
}
