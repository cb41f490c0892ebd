//! Shared data types for the Emblem badge engine.
//!
//! Everything here is plain data: rule definitions loaded by the host,
//! the persisted state snapshot, and the loosely-typed property values
//! both are built from. Engine logic lives in `emblem-core`.

pub mod rule;
pub mod state;
pub mod value;

pub use rule::{GameEndReason, Period, Rule};
pub use state::{BadgeState, EarnedBadge, PeriodWindow, PropertyMap};
pub use value::PropertyValue;
