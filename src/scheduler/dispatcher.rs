/*
 * Dispatcher.
 *
 * The state machine per thread: NEW -> READY -> RUNNING <-> READY,
 * RUNNING -> BLOCKED -> READY, RUNNING -> DYING -> (reaped). Every
 * operation here assumes interrupts are already disabled by the caller
 * (`SchedulerManager` holds the interrupt gate around these calls) except
 * where noted.
 */

use super::manager::SchedulerState;
use super::thread::{ThreadId, ThreadStatus};
use super::TIME_SLICE;

/// `block_current()`: precondition - not in interrupt context (checked by
/// the caller), interrupts OFF. Marks current BLOCKED and reschedules.
pub fn block_current(state: &mut SchedulerState) {
    let current = state.current;
    state.thread_mut(current).status = ThreadStatus::Blocked;
    schedule(state);
}

/// `unblock(t)`: precondition `t.status == BLOCKED`. Inserts into the
/// ready queue and marks READY. Never preempts.
pub fn unblock(state: &mut SchedulerState, t: ThreadId) {
    assert_eq!(
        state.thread(t).status,
        ThreadStatus::Blocked,
        "unblock called on a thread that wasn't blocked"
    );
    state.thread_mut(t).status = ThreadStatus::Ready;
    let threads = &state.threads;
    state.ready_queue.insert_ordered(t, |id| threads.get(&id.0).unwrap().priority);
}

/// `yield_now()`: precondition - not in interrupt context (checked by the
/// caller). If current isn't idle, reinserts it into the ready queue, then
/// reschedules.
pub fn yield_now(state: &mut SchedulerState) {
    let current = state.current;
    if current != state.idle {
        let threads = &state.threads;
        state.ready_queue.insert_ordered(current, |id| threads.get(&id.0).unwrap().priority);
    }
    // Status moves to READY regardless of whether the idle thread was
    // reinserted: `schedule()` asserts the outgoing thread isn't RUNNING,
    // and the idle thread (never queued) is simply picked again when the
    // ready queue is empty.
    state.thread_mut(current).status = ThreadStatus::Ready;
    schedule(state);
}

/// `exit()`: removes current from the all-threads list, marks DYING, and
/// reschedules. Never returns to the caller; freeing is deferred to
/// `schedule_tail`.
pub fn exit(state: &mut SchedulerState) -> ! {
    let current = state.current;
    state.thread_mut(current).status = ThreadStatus::Dying;
    schedule(state);
    unreachable!("schedule() switched away from a DYING thread and never switched back");
}

/// `schedule()`: preconditions - interrupts OFF, current.status != RUNNING
/// is checked by the time this runs via the transitions above (the current
/// thread is always BLOCKED/READY/DYING by the time `schedule` is called).
/// Picks the next thread (idle if the ready queue is empty), switches iff
/// it differs from current, then runs `schedule_tail`.
pub fn schedule(state: &mut SchedulerState) {
    let prev = state.current;
    assert_ne!(
        state.thread(prev).status,
        ThreadStatus::Running,
        "schedule() called with current thread still RUNNING"
    );

    let next = state.ready_queue.pop_front().unwrap_or(state.idle);

    let actual_prev = if next != prev {
        state.current = next;
        state.context_switch.switch(prev, next)
    } else {
        prev
    };

    schedule_tail(state, actual_prev);
}

/// `schedule_tail(prev)`: marks current RUNNING, resets the time-slice
/// counter, and frees `prev`'s page if it died and isn't the boot thread.
pub fn schedule_tail(state: &mut SchedulerState, prev: ThreadId) {
    let current = state.current;
    state.thread_mut(current).status = ThreadStatus::Running;
    state.thread_ticks = 0;

    if prev != state.boot_thread && state.thread(prev).status == ThreadStatus::Dying {
        let page = state.thread(prev).stack;
        state.threads.remove(&prev.0);
        if page != 0 {
            state.page_allocator.free_page(page);
        }
    }
}

/// Called by the tick handler when the time-slice counter reaches
/// `TIME_SLICE`. Not a suspension point itself: it only raises the
/// "yield on return" flag the interrupt epilogue honors.
pub fn note_tick_for_preemption(state: &mut SchedulerState) -> bool {
    state.thread_ticks += 1;
    state.thread_ticks >= TIME_SLICE
}
