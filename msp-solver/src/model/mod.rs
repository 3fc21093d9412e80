//! Compiles an [`InstanceModel`](crate::instance::InstanceModel) into variables and constraints of
//! a [`Solver`](pumpkin_core::Solver).
//!
//! There are two encodings:
//! * [`TimeslotModel`]: one variable per meeting, holding the timeslot of that meeting. Pairs of
//!   meetings with a common attendee are kept apart by their travel distance. The makespan can be
//!   minimised.
//! * [`CalendarModel`]: one variable per agent and slot, holding the meeting which the agent
//!   attends in that slot (or `-1` if it is free). The number of slots is fixed.
//!
//! Root-level infeasibility while posting constraints is not an error. The solver remembers it,
//! and solving the model then reports that it is unsatisfiable. Every variable of a model is
//! created before its first constraint is posted, since the solver does not accept new variables
//! once it is infeasible.
mod calendar;
mod timeslot;

pub use calendar::CalendarModel;
pub use calendar::CalendarOptions;
pub use calendar::FREE_SLOT;
use log::debug;
use pumpkin_core::ConstraintOperationError;
use thiserror::Error;
pub use timeslot::TimeslotModel;
pub use timeslot::TimeslotOptions;

/// How large the gap between two meetings of the same agent has to be, given the travel distance
/// `d` between them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum GapRule {
    /// `|t1 - t2| > d`.
    #[default]
    Strict,
    /// `|t1 - t2| >= d`, and never less than one slot since an agent attends one meeting at a
    /// time.
    AtLeast,
}

impl GapRule {
    /// The smallest difference between the timeslots of two meetings which are `distance` apart.
    pub fn minimum_gap(self, distance: i32) -> i64 {
        match self {
            GapRule::Strict => i64::from(distance) + 1,
            GapRule::AtLeast => i64::from(distance).max(1),
        }
    }

    /// Returns `true` if two meetings `distance` apart can be held `gap` timeslots apart.
    pub fn allows(self, gap: i64, distance: i32) -> bool {
        gap.abs() >= self.minimum_gap(distance)
    }
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("the horizon {0} does not fit in a 32-bit domain")]
    HorizonTooLarge(i64),

    #[error("the horizon must not be negative, got {0}")]
    NegativeHorizon(i64),

    #[error("the number of timeslots {0} does not fit in a 32-bit domain")]
    TooManyTimeslots(u32),

    #[error("the timeslot field of the header must not be negative, got {0}")]
    NegativeTimeslots(i32),
}

/// Logs the root-level failure which stopped the constraints of a model from being posted.
fn log_root_failure(result: Result<(), ConstraintOperationError>, model: &str) {
    if let Err(error) = result {
        debug!("The {model} model is infeasible at the root: {error}");
    }
}
