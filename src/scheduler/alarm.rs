/*
 * Alarm service.
 *
 * Sleeping threads are tracked as a flat list of records rather than an
 * intrusive list entry on the thread record itself, mirroring `alarm.c`'s
 * separate `sleeping_list`. Ordering within the list is not guaranteed,
 * matching ยง4.6.
 */

use alloc::vec::Vec;

use super::thread::ThreadId;

/// `{start_tick, wait_ticks, sleeping_thread}`.
#[derive(Debug, Clone, Copy)]
pub struct AlarmRecord {
    pub start_tick: u64,
    pub wait_ticks: u64,
    pub thread: ThreadId,
}

/// The set of threads currently sleeping on a deadline.
#[derive(Default)]
pub struct AlarmList {
    sleeping: Vec<AlarmRecord>,
}

impl AlarmList {
    pub const fn new() -> Self {
        AlarmList { sleeping: Vec::new() }
    }

    /// Registers `thread` to wake at `start + ticks`. Preconditions (`start
    /// > 0`, `ticks > 0`) are the caller's responsibility per ยง4.6; asserted
    /// here since a violation is a programmer error, not a runtime one.
    pub fn register(&mut self, thread: ThreadId, start: u64, ticks: u64) {
        assert!(start > 0, "alarm start tick must be positive");
        assert!(ticks > 0, "alarm wait must be positive");
        self.sleeping.push(AlarmRecord { start_tick: start, wait_ticks: ticks, thread });
    }

    /// Removes and returns every alarm whose deadline has elapsed as of
    /// `now`, i.e. `now - start_tick >= wait_ticks`.
    pub fn expire(&mut self, now: u64) -> Vec<AlarmRecord> {
        assert!(now > 0, "tick count must be positive");
        let mut expired = Vec::new();
        self.sleeping.retain(|alarm| {
            if now - alarm.start_tick >= alarm.wait_ticks {
                expired.push(*alarm);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn is_empty(&self) -> bool {
        self.sleeping.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sleeping.len()
    }
}
