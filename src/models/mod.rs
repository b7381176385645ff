pub mod entry;
pub mod phase;
pub mod profile;

pub use entry::{DailyEntry, NewFoodLog};
pub use phase::{PhaseError, PhaseKind, PhasePlan, PhaseRecord, PhaseStatus};
pub use profile::{ActivityLevel, Sex, UserProfile};
