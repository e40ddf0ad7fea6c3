//! Background work driven on a schedule rather than by requests.

pub mod scheduler;
pub mod sweeper;

pub use scheduler::{Scheduler, ShutdownSignal, DEFAULT_SWEEP_INTERVAL};
pub use sweeper::{
    AutoValidationSweeper, MatchConfirmer, PendingCounts, SweepReport, DEFAULT_PENDING_EXPIRY,
};
