//! Deterministic proactive-reboot scheduling.
//!
//! [`permutation`] builds the shared pseudo-random node ordering every node reconstructs
//! identically; [`reboot`] turns that ordering plus the attack/reboot timing parameters into a
//! concrete per-reboot delay.

pub mod permutation;
pub mod reboot;

pub use permutation::RandomNodePicker;
pub use reboot::{attack_intervals, next_reboot_delay, OVERLAP_SECONDS};
