//! Canonical Schema Model
//!
//! Dialect-independent, immutable value types produced once per capture.
//! Every type here implements [`Canonical`](crate::normalize::Canonical), and
//! that signature is the only identity the diff engine trusts.

pub mod engine;
pub mod lookup;
pub mod snapshot;
pub mod stored;
pub mod table;

pub use engine::EngineKind;
pub use lookup::Lookup;
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use stored::{
    Parameter, ParameterMode, Routine, RoutineKind, Sequence, Trigger, TriggerEvent,
    TriggerTiming, View,
};
pub use table::{Column, Constraint, ConstraintKind, Index, Table};
