/*
 * Public scheduling API.
 *
 * `SchedulerManager` is a zero-sized type whose associated functions are
 * the crate's public surface; all mutable state lives behind a single
 * `Mutex<Option<SchedulerState>>` singleton, the same shape the teacher
 * kernel uses for its own subsystem managers (a ZST namespace plus a
 * lazily-initialized `Mutex<Option<T>>`).
 */

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use lazy_static::lazy_static;
use spin::Mutex;

use crate::arch;
use crate::config::SchedulerConfig;
use crate::error::SchedError;

use super::alarm::AlarmList;
use super::donation::{self, ThreadTable};
use super::dispatcher;
use super::fixed_point::{Fp, Round};
use super::ready_queue::ReadyQueue;
use super::seams::{ContextSwitch, PageAllocator};
use super::thread::{LockId, ThreadId, ThreadRecord, ThreadStatus};
use super::{tick, PRI_DEFAULT, PRI_MAX, PRI_MIN};

lazy_static! {
    static ref SCHEDULER: Mutex<Option<SchedulerState>> = Mutex::new(None);
}

/// All scheduler-owned state, guarded by the single lock above.
pub struct SchedulerState {
    pub threads: BTreeMap<u64, ThreadRecord>,
    pub ready_queue: ReadyQueue,
    pub alarms: AlarmList,
    pub current: ThreadId,
    pub idle: ThreadId,
    pub boot_thread: ThreadId,
    pub next_tid: u64,
    pub load_avg: Fp,
    pub config: SchedulerConfig,
    pub tick_count: u64,
    pub thread_ticks: u32,
    pub context_switch: Box<dyn ContextSwitch>,
    pub page_allocator: Box<dyn PageAllocator>,
}

impl SchedulerState {
    pub fn thread(&self, id: ThreadId) -> &ThreadRecord {
        self.threads.get(&id.0).expect("unknown thread id")
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> &mut ThreadRecord {
        self.threads.get_mut(&id.0).expect("unknown thread id")
    }

    pub fn reposition_if_ready(&mut self, id: ThreadId) {
        if self.thread(id).status != ThreadStatus::Ready {
            return;
        }
        self.ready_queue.remove(id);
        let threads = &self.threads;
        self.ready_queue.insert_ordered(id, |other| threads.get(&other.0).unwrap().priority);
    }

    fn allocate_tid(&mut self) -> ThreadId {
        let id = ThreadId(self.next_tid);
        self.next_tid += 1;
        id
    }
}

impl ThreadTable for SchedulerState {
    fn get(&self, id: ThreadId) -> &ThreadRecord {
        self.thread(id)
    }
    fn get_mut(&mut self, id: ThreadId) -> &mut ThreadRecord {
        self.thread_mut(id)
    }
    fn reposition_if_ready(&mut self, id: ThreadId) {
        SchedulerState::reposition_if_ready(self, id)
    }
}

/// Namespace for the scheduling core's public operations. A zero-sized
/// type, never instantiated; every method is an associated function
/// operating on the process-wide singleton.
pub struct SchedulerManager;

impl SchedulerManager {
    /// Converts the currently running code into the initial (boot) thread
    /// and initializes the scheduler singleton. Must run exactly once,
    /// before `start()` and before any other call.
    pub fn init(config: SchedulerConfig, context_switch: Box<dyn ContextSwitch>, page_allocator: Box<dyn PageAllocator>) {
        let mut guard = SCHEDULER.lock();
        assert!(guard.is_none(), "SchedulerManager::init called twice");

        let boot_id = ThreadId(0);
        let mut boot = ThreadRecord::new(boot_id, String::from("main"), PRI_DEFAULT, 0);
        boot.status = ThreadStatus::Running;

        let mut threads = BTreeMap::new();
        threads.insert(boot_id.0, boot);

        *guard = Some(SchedulerState {
            threads,
            ready_queue: ReadyQueue::new(),
            alarms: AlarmList::new(),
            current: boot_id,
            idle: boot_id,
            boot_thread: boot_id,
            next_tid: 1,
            load_avg: Fp::ZERO,
            config,
            tick_count: 0,
            thread_ticks: 0,
            context_switch,
            page_allocator,
        });
        log::info!("scheduler initialized, boot thread id={}", boot_id.0);
    }

    /// Tears down the scheduler singleton so a subsequent `init()` starts
    /// clean. The core only ever supports one live scheduler instance;
    /// this exists for hosted test harnesses that exercise several
    /// independent scenarios in one process, not for production use.
    pub fn reset_for_tests() {
        *SCHEDULER.lock() = None;
    }

    /// Creates the idle thread and marks the scheduler ready to accept
    /// preemption. Interrupts are expected to be enabled by the embedder
    /// immediately after this returns.
    pub fn start(idle_fn_stub: usize) {
        let mut guard = SCHEDULER.lock();
        let state = guard.as_mut().expect("SchedulerManager::init was not called");
        assert_eq!(state.idle, state.boot_thread, "start() called twice");

        let idle_id = state.allocate_tid();
        let mut idle = ThreadRecord::new(idle_id, String::from("idle"), PRI_MIN, 0);
        idle.stack = idle_fn_stub;
        idle.status = ThreadStatus::Blocked;
        state.threads.insert(idle_id.0, idle);
        state.idle = idle_id;
        log::info!("scheduler started, idle thread id={}", idle_id.0);
    }

    /// `create(name, priority, ...) -> id | ERROR`. The caller supplies the
    /// entry point and stack by way of the page allocator seam; this core
    /// only reserves the thread record and its ready-queue slot. The new
    /// thread inherits the creator's `nice` and `recent_cpu` (source's
    /// `thread_create`); under MLFQS, its priority is then recalculated from
    /// those inherited values rather than taking the caller-supplied
    /// `priority` verbatim (source's `init_thread` calling
    /// `recalculate_priority` when `thread_mlfqs` is set). If the newly
    /// created thread outranks the caller, the caller yields before
    /// `create` returns (S1).
    pub fn create(name: &str, priority: u8) -> Result<ThreadId, SchedError> {
        assert!(priority >= PRI_MIN && priority <= PRI_MAX, "priority out of range");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");

            let page = state.page_allocator.alloc_page().ok_or(SchedError::OutOfMemory)?;

            let id = state.allocate_tid();
            let creator = state.thread(state.current);
            let current_nice = creator.nice;
            let current_recent_cpu = creator.recent_cpu;
            let mut t = ThreadRecord::new(id, String::from(name), priority, current_nice);
            t.recent_cpu = current_recent_cpu;
            if state.config.mlfqs_mode {
                t.priority = super::mlfqs::recalculate_priority(t.recent_cpu, t.nice);
                t.original_priority = t.priority;
            }
            t.stack = page;
            t.status = ThreadStatus::Ready;
            state.threads.insert(id.0, t);
            let threads = &state.threads;
            state.ready_queue.insert_ordered(id, |other| threads.get(&other.0).unwrap().priority);

            let created_priority = state.thread(id).priority;
            log::debug!("created thread '{}' id={} priority={}", name, id.0, created_priority);

            let current_priority = state.thread(state.current).priority;
            if created_priority > current_priority {
                dispatcher::yield_now(state);
            }

            Ok(id)
        })
    }

    pub fn current() -> ThreadId {
        let guard = SCHEDULER.lock();
        guard.as_ref().expect("scheduler not initialized").current
    }

    pub fn tid() -> u64 {
        Self::current().0
    }

    pub fn name(id: ThreadId) -> String {
        let guard = SCHEDULER.lock();
        guard.as_ref().expect("scheduler not initialized").thread(id).name.clone()
    }

    /// `block()`: suspends the current thread. Precondition: not in
    /// interrupt context.
    pub fn block() {
        assert!(!arch::in_interrupt_context(), "block() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            dispatcher::block_current(state);
        });
    }

    pub fn unblock(t: ThreadId) {
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            dispatcher::unblock(state, t);
        });
    }

    /// `yield()`: precondition - not in interrupt context.
    pub fn yield_now() {
        assert!(!arch::in_interrupt_context(), "yield_now() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            dispatcher::yield_now(state);
        });
    }

    /// `exit()`: never returns.
    pub fn exit() -> ! {
        assert!(!arch::in_interrupt_context(), "exit() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            dispatcher::exit(state);
        })
    }

    /// `set_priority(p)`. No-op under MLFQS (ยง4.5); otherwise applies the
    /// donee/non-donee policy from ยง4.4 and yields if the caller's priority
    /// dropped (after interrupts are restored, matching the source's
    /// documented preemption window; see the open-question decision).
    pub fn set_priority(new_priority: u8) {
        assert!(new_priority >= PRI_MIN && new_priority <= PRI_MAX);
        let mut should_yield = false;
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            if state.config.mlfqs_mode {
                return;
            }
            let current = state.current;
            let is_a_donee = state.thread(current).is_a_donee;
            if is_a_donee {
                state.thread_mut(current).original_priority = new_priority;
                if new_priority > state.thread(current).priority {
                    state.thread_mut(current).priority = new_priority;
                    state.reposition_if_ready(current);
                }
            } else {
                let old_effective = state.thread(current).priority;
                state.thread_mut(current).original_priority = new_priority;
                state.thread_mut(current).priority = new_priority;
                state.reposition_if_ready(current);
                should_yield = new_priority < old_effective;
            }
        });
        if should_yield {
            Self::yield_now();
        }
    }

    pub fn get_priority() -> u8 {
        let guard = SCHEDULER.lock();
        let state = guard.as_ref().expect("scheduler not initialized");
        state.thread(state.current).priority
    }

    /// `set_nice(n)`: clamps to `[-20, 20]`, recomputes the current
    /// thread's priority, and yields if it dropped.
    pub fn set_nice(n: i32) {
        let clamped = n.clamp(super::NICE_MIN, super::NICE_MAX);
        let mut should_yield = false;
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            let current = state.current;
            let old_priority = state.thread(current).priority;
            state.thread_mut(current).nice = clamped;
            let recent_cpu = state.thread(current).recent_cpu;
            let new_priority = super::mlfqs::recalculate_priority(recent_cpu, clamped);
            state.thread_mut(current).priority = new_priority;
            state.reposition_if_ready(current);
            should_yield = new_priority < old_priority;
        });
        if should_yield {
            Self::yield_now();
        }
    }

    pub fn get_nice() -> i32 {
        let guard = SCHEDULER.lock();
        let state = guard.as_ref().expect("scheduler not initialized");
        state.thread(state.current).nice
    }

    /// `get_load_avg() -> int` (x100). The whole read-and-scale runs under
    /// the interrupt gate (see the recorded open-question decision).
    pub fn get_load_avg() -> i32 {
        arch::without_interrupts(|| {
            let guard = SCHEDULER.lock();
            let state = guard.as_ref().expect("scheduler not initialized");
            state.load_avg.mul_int(100).to_int(Round::Nearest)
        })
    }

    pub fn get_recent_cpu() -> i32 {
        arch::without_interrupts(|| {
            let guard = SCHEDULER.lock();
            let state = guard.as_ref().expect("scheduler not initialized");
            state.thread(state.current).recent_cpu.mul_int(100).to_int(Round::Nearest)
        })
    }

    /// `foreach(fn, aux)`: iterates all threads with interrupts OFF.
    pub fn foreach<F: FnMut(ThreadId, &ThreadRecord)>(mut f: F) {
        arch::without_interrupts(|| {
            let guard = SCHEDULER.lock();
            let state = guard.as_ref().expect("scheduler not initialized");
            for (&id, t) in state.threads.iter() {
                f(ThreadId(id), t);
            }
        });
    }

    /// `donate(donee, lock)`. Precondition: not in interrupt context.
    pub fn donate(donee: ThreadId, lock: LockId) {
        assert!(!arch::in_interrupt_context(), "donate() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            let donor = state.current;
            donation::donate(state, donor, donee, lock);
        });
    }

    /// `reverse(lock)`. Precondition: not in interrupt context.
    pub fn reverse(lock: LockId) {
        assert!(!arch::in_interrupt_context(), "reverse() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            let holder = state.current;
            donation::reverse(state, holder, lock);
        });
    }

    /// `sleep(start, ticks)`. Preconditions: interrupts ON, `start > 0`,
    /// `ticks > 0`.
    pub fn sleep(start: u64, ticks: u64) {
        assert!(!arch::in_interrupt_context(), "sleep() called from interrupt context");
        arch::without_interrupts(|| {
            let mut guard = SCHEDULER.lock();
            let state = guard.as_mut().expect("scheduler not initialized");
            let current = state.current;
            state.alarms.register(current, start, ticks);
            dispatcher::block_current(state);
        });
    }

    /// Timer tick entry point, called from interrupt context. Returns
    /// `true` if the interrupt epilogue should request a yield on return.
    pub fn on_tick() -> bool {
        let _guard = arch::InterruptContextGuard::enter();
        let mut sched_guard = SCHEDULER.lock();
        let state = sched_guard.as_mut().expect("scheduler not initialized");
        tick::on_tick(state)
    }

    /// Snapshot of every thread's id, name, and status; convenience built
    /// on `foreach`, used by tests and diagnostic tooling rather than by
    /// the scheduling algorithms themselves.
    pub fn snapshot() -> Vec<(ThreadId, String, ThreadStatus)> {
        let mut out = Vec::new();
        Self::foreach(|id, t| out.push((id, t.name.clone(), t.status)));
        out
    }
}
