/*
 * Thread record.
 *
 * Arena-allocated and referenced by handle (`ThreadId`) rather than by
 * pointer or `Arc`, so the donor/donee graph can hold references into
 * itself without reference cycles: `donor_list` and `donee` are plain
 * `ThreadId`s resolved back through the scheduler's thread table.
 */

use alloc::string::String;
use alloc::vec::Vec;

use super::fixed_point::Fp;
use super::{PRI_MAX, PRI_MIN, THREAD_MAGIC};

/// Unique, monotonically increasing thread identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ThreadId(pub u64);

/// Opaque identity of the lock a thread is waiting on, for matching in
/// `reverse(lock)`. The scheduling core never looks inside a `LockId`; the
/// embedder picks a value that's stable for the lifetime of the lock (e.g.
/// the lock's address or a table index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadStatus {
    Running,
    Ready,
    Blocked,
    Dying,
}

/// Per-thread usage counters split by the context the tick occurred in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadTicks {
    pub idle: u64,
    pub kernel: u64,
    pub user: u64,
}

/// Per-thread control block.
pub struct ThreadRecord {
    pub id: ThreadId,
    pub name: String,
    pub status: ThreadStatus,
    pub priority: u8,
    pub original_priority: u8,
    pub nice: i32,
    pub recent_cpu: Fp,
    pub donor_list: Vec<ThreadId>,
    pub donee: Option<ThreadId>,
    pub donor_lock: Option<LockId>,
    pub is_a_donor: bool,
    pub is_a_donee: bool,
    /// Current top of this thread's kernel stack, opaque to the core;
    /// consumed only by the `ContextSwitch` seam.
    pub stack: usize,
    pub magic: u32,
    pub ticks: ThreadTicks,
}

impl ThreadRecord {
    pub fn new(id: ThreadId, name: String, priority: u8, nice: i32) -> Self {
        debug_assert!(priority >= PRI_MIN && priority <= PRI_MAX);
        ThreadRecord {
            id,
            name,
            status: ThreadStatus::Blocked,
            priority,
            original_priority: priority,
            nice,
            recent_cpu: Fp::ZERO,
            donor_list: Vec::new(),
            donee: None,
            donor_lock: None,
            is_a_donor: false,
            is_a_donee: false,
            stack: 0,
            magic: THREAD_MAGIC,
            ticks: ThreadTicks::default(),
        }
    }

    /// I3/I4: effective priority is never below what donation or
    /// `original_priority` demands.
    pub fn invariants_hold(&self) -> bool {
        self.priority >= self.original_priority
            && self.priority <= PRI_MAX
            && self.priority >= PRI_MIN
            && self.magic == THREAD_MAGIC
    }
}
