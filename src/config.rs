/*
 * Boot-time scheduler configuration.
 *
 * Decided once by the embedder before `SchedulerManager::init()` runs,
 * rather than threaded through as a scatter of global mutable statics.
 */

use crate::scheduler::{FRACTION_BITS, PRI_DEFAULT, PRI_MAX, PRI_MIN, THREAD_MAGIC, TIME_SLICE};

/// Boot-time parameters for the scheduling core.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Enables the multi-level feedback queue scheduler. When `false`,
    /// priority donation drives scheduling and `set_priority` is honored
    /// directly; when `true`, priority is computed and `set_priority` is a
    /// no-op (spec ยง4.5).
    pub mlfqs_mode: bool,
    /// Timer ticks per second; MLFQS recomputes `load_avg` every this many
    /// ticks.
    pub timer_freq: u32,
    /// Ticks a thread runs before preemption is requested.
    pub time_slice: u32,
    /// Upper bound on the number of live threads the embedder expects to
    /// create; used only to pre-size internal collections.
    pub max_threads: usize,
}

impl SchedulerConfig {
    /// A config with MLFQS disabled (plain priority-donation scheduling).
    pub const fn priority_donation() -> Self {
        Self {
            mlfqs_mode: false,
            timer_freq: 100,
            time_slice: TIME_SLICE,
            max_threads: 64,
        }
    }

    /// A config with MLFQS enabled.
    pub const fn mlfqs() -> Self {
        Self {
            mlfqs_mode: true,
            timer_freq: 100,
            time_slice: TIME_SLICE,
            max_threads: 64,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::priority_donation()
    }
}

const _: () = assert!(PRI_MIN == 0);
const _: () = assert!(PRI_MAX == 63);
const _: () = assert!(PRI_DEFAULT == 31);
const _: () = assert!(FRACTION_BITS == 14);
const _: () = assert!(THREAD_MAGIC == 0xcd6abf4b);
