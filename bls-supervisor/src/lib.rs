//! Supervises the responder executable: restarts it on the deterministic proactive-reboot
//! schedule from [`bls_scheduler`], or execs it directly when rebooting is disabled.

pub mod error;
pub mod runner;

pub use error::SupervisorError;
pub use runner::{run_with_timeout, RunOutcome};
