//! # skyvisit
//!
//! Visit sequencing and drift tracking for a single sky target.
//!
//! - [`target::Target`]: a resolved sky position with its ordered visits, built from a
//!   [`target::TargetSpec`] through the collaborators of an [`env_state::SchedulerEnv`].
//! - [`sequencer`]: hands the visits out in order and reports exhaustion.
//! - [`tracking`]: measures the drift of each new image from the target's reference
//!   image, by plate solution first and by phase correlation otherwise.
//! - [`coordinates`]: frames, positions and name resolution (CDS Sesame).

pub mod config;
pub mod constants;
mod conversion;
pub mod coordinates;
pub mod env_state;
pub mod observations;
pub mod scheduler_errors;
pub mod sequencer;
pub mod target;
pub mod time;
pub mod tracking;
