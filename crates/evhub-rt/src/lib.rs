//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Runtime helpers supporting the refresh driver."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Scheduling helpers for the Solar EV Hub runtime.

pub mod scheduling;

pub use scheduling::{PeriodicTimer, RateLimiter, SchedulerError, TimerReport};
