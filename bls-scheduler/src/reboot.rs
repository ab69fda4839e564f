//! Reboot-delay formulas (§4.6): how long a node waits before its next voluntary restart,
//! computed so that no `attackTime`-bounded capture window ever sees `t+1` shares
//! simultaneously live.
//!
//! Implemented verbatim against the two regimes the base algorithm distinguishes; the two
//! formulas are not simplified or unified even though they look like they could be, per the
//! open-question note in DESIGN.md.

use crate::permutation::RandomNodePicker;

/// Extra seconds added to a subprocess timeout so the responder has time to exit cleanly
/// before being killed, and to every non-initial reboot delay as slack for process teardown.
pub const OVERLAP_SECONDS: f64 = 1.0;

/// `max(1, floor(attackTime / rebootTime))`: the number of reboot-length slots an attacker is
/// assumed to hold a captured node for.
pub fn attack_intervals(attack_time_secs: f64, reboot_time_secs: f64) -> usize {
    ((attack_time_secs / reboot_time_secs).floor() as i64).max(1) as usize
}

fn ceil_div(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

/// Computes the delay (in seconds) before `node_index`'s `r`-th reboot (0-based: `r = 0` is the
/// first scheduled reboot after the unconditional initial run).
///
/// `node_index` is the node's 0-based index, matching [`RandomNodePicker`]'s output.
pub fn next_reboot_delay(
    n: usize,
    t: usize,
    attack_time_secs: f64,
    reboot_time_secs: f64,
    node_index: usize,
    r: usize,
) -> f64 {
    let m_intervals = attack_intervals(attack_time_secs, reboot_time_secs);
    let k = RandomNodePicker::new(n).position_of(node_index);
    let big_n = r * n + k;

    if t < m_intervals {
        small_threshold_delay(big_n, n, t, m_intervals, reboot_time_secs, r)
    } else {
        let s = ceil_div(t, m_intervals);
        large_threshold_delay(big_n, n, s, reboot_time_secs, r)
    }
}

fn small_threshold_delay(
    big_n: usize,
    n: usize,
    s: usize,
    m_intervals: usize,
    reboot_time_secs: f64,
    r: usize,
) -> f64 {
    let term = |value: usize| (value / s) * m_intervals + (value % s);
    if r == 0 {
        term(big_n) as f64 * reboot_time_secs
    } else {
        let m = big_n - n;
        (term(big_n) as i64 - term(m) as i64 - 1) as f64 * reboot_time_secs + OVERLAP_SECONDS * 10.0
    }
}

fn large_threshold_delay(big_n: usize, n: usize, s: usize, reboot_time_secs: f64, r: usize) -> f64 {
    if r == 0 {
        (big_n / s) as f64 * reboot_time_secs
    } else {
        let m_prime = ((big_n - n) / s) * s + s;
        let n_prime = (big_n / s) * s;
        ((n_prime as i64 - m_prime as i64) as f64 / s as f64) * reboot_time_secs
            + OVERLAP_SECONDS * 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_intervals_floors_and_floors_to_at_least_one() {
        assert_eq!(attack_intervals(60.0, 30.0), 2);
        assert_eq!(attack_intervals(10.0, 30.0), 1);
        assert_eq!(attack_intervals(100.0, 30.0), 3);
    }

    #[test]
    fn small_threshold_first_reboot_matches_worked_example() {
        // n=8, t=3, attackTime=60, rebootTime=30, node index 0, r=0: mIntervals=2, s=3.
        let delay = next_reboot_delay(8, 3, 60.0, 30.0, 0, 0);
        let m_intervals = attack_intervals(60.0, 30.0);
        assert_eq!(m_intervals, 2);
        let k = RandomNodePicker::new(8).position_of(0);
        let expected = ((k / 3) * m_intervals + (k % 3)) as f64 * 30.0;
        assert_eq!(delay, expected);
    }

    #[test]
    fn large_threshold_regime_is_selected_when_t_meets_m_intervals() {
        // t=4 >= mIntervals=2 selects the large-threshold regime (s = ceil(4/2) = 2).
        let delay = next_reboot_delay(8, 4, 60.0, 30.0, 0, 0);
        assert!(delay >= 0.0);
    }

    #[test]
    fn delay_is_deterministic_across_repeated_calls() {
        for n in 2..12 {
            for t in 1..n {
                for r in 0..3 {
                    for node in 0..n {
                        let a = next_reboot_delay(n, t, 60.0, 30.0, node, r);
                        let b = next_reboot_delay(n, t, 60.0, 30.0, node, r);
                        assert_eq!(a, b, "non-deterministic delay for n={n} t={t} r={r} node={node}");
                    }
                }
            }
        }
    }
}
