/*
 * Multi-level feedback queue scheduler.
 *
 * Pure formulas over `Fp`/thread fields; the caller (manager/tick) decides
 * when to invoke these and holds the interrupt gate around them. Mirrors
 * `recalculate_priority` / `recalculate_recent_cpu` / `thread_recalculate_load_avg`
 * / `get_num_ready_threads` from the source.
 */

use super::fixed_point::{Fp, Round};
use super::{PRI_MAX, PRI_MIN};

/// `load_avg <- (59/60)*load_avg + (1/60)*ready_threads`.
pub fn recalculate_load_avg(load_avg: Fp, ready_threads: i32) -> Fp {
    let fifty_nine_sixtieths = Fp::from_int(59).div(Fp::from_int(60));
    let one_sixtieth = Fp::from_int(1).div(Fp::from_int(60));
    fifty_nine_sixtieths.mul(load_avg).add(one_sixtieth.mul_int(ready_threads))
}

/// `recent_cpu <- (2*load_avg)/(2*load_avg+1) * recent_cpu + nice`.
pub fn recalculate_recent_cpu(recent_cpu: Fp, load_avg: Fp, nice: i32) -> Fp {
    let two_load_avg = load_avg.mul_int(2);
    let coefficient = two_load_avg.div(two_load_avg.add_int(1));
    coefficient.mul(recent_cpu).add_int(nice)
}

/// `priority <- PRI_MAX - recent_cpu/4 - nice*2`, truncated then clamped.
pub fn recalculate_priority(recent_cpu: Fp, nice: i32) -> u8 {
    let raw = Fp::from_int(PRI_MAX as i32).sub(recent_cpu.div_int(4)).sub_int(nice * 2);
    let truncated = raw.to_int(Round::Trunc);
    truncated.clamp(PRI_MIN as i32, PRI_MAX as i32) as u8
}

/// `|ready_queue| + 1 if current is running and isn't idle`.
pub fn num_ready_threads(ready_len: usize, current_is_running_non_idle: bool) -> i32 {
    ready_len as i32 + if current_is_running_non_idle { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_avg_with_no_ready_threads_decays_toward_zero() {
        let mut avg = Fp::from_int(1);
        for _ in 0..1000 {
            avg = recalculate_load_avg(avg, 0);
        }
        assert_eq!(avg.to_int(Round::Nearest), 0);
    }

    #[test]
    fn recent_cpu_with_no_load_and_zero_nice_stays_zero() {
        let rc = recalculate_recent_cpu(Fp::ZERO, Fp::ZERO, 0);
        assert_eq!(rc, Fp::ZERO);
    }

    #[test]
    fn priority_clamps_to_pri_max_when_recent_cpu_and_nice_are_zero() {
        let p = recalculate_priority(Fp::ZERO, 0);
        assert_eq!(p, PRI_MAX);
    }

    #[test]
    fn priority_clamps_to_pri_min_under_heavy_cpu_usage() {
        // S4: recent_cpu ~= 400, nice = 0 => 63 - 100 - 0, clamped to 0.
        let p = recalculate_priority(Fp::from_int(400), 0);
        assert_eq!(p, PRI_MIN);
    }

    #[test]
    fn property_p7_bounded_by_one_from_the_real_valued_formula() {
        for recent_cpu in [0, 4, 40, 400] {
            for nice in [-20, 0, 20] {
                let computed = recalculate_priority(Fp::from_int(recent_cpu), nice);
                let ideal = 63.0 - (recent_cpu as f64) / 4.0 - (nice as f64) * 2.0;
                let ideal_clamped = ideal.clamp(PRI_MIN as f64, PRI_MAX as f64);
                assert!((computed as f64 - ideal_clamped).abs() <= 1.0);
            }
        }
    }

    #[test]
    fn num_ready_threads_counts_current_when_running_and_not_idle() {
        assert_eq!(num_ready_threads(3, true), 4);
        assert_eq!(num_ready_threads(3, false), 3);
    }
}
