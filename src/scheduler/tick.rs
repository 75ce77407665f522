/*
 * Tick handler.
 *
 * Runs in interrupt context on every timer tick. Never switches threads
 * synchronously; it only raises a "yield on return" flag for the interrupt
 * epilogue to honor, per ยง4.7.
 */

use super::dispatcher;
use super::manager::SchedulerState;
use super::mlfqs;
use super::thread::ThreadStatus;

/// Advances the current tick. Returns `true` if the interrupt epilogue
/// should request a yield before resuming cooperative context.
pub fn on_tick(state: &mut SchedulerState) -> bool {
    state.tick_count += 1;
    let tick = state.tick_count;

    account_usage_tick(state);

    if state.config.mlfqs_mode {
        run_mlfqs_accounting(state, tick);
    }

    let woken = state.alarms.expire(tick);
    for alarm in woken {
        dispatcher::unblock(state, alarm.thread);
    }

    dispatcher::note_tick_for_preemption(state)
}

fn account_usage_tick(state: &mut SchedulerState) {
    let current = state.current;
    let idle = state.idle;
    let t = state.thread_mut(current);
    if current == idle {
        t.ticks.idle += 1;
    } else {
        // User/kernel split is not observable from this core (syscall
        // dispatch is out of scope); every non-idle tick is counted as
        // kernel time.
        t.ticks.kernel += 1;
    }
}

fn run_mlfqs_accounting(state: &mut SchedulerState, tick: u64) {
    let current = state.current;
    let idle = state.idle;
    if current != idle {
        let t = state.thread_mut(current);
        t.recent_cpu = t.recent_cpu.add_int(1);
    }

    let timer_freq = state.config.timer_freq as u64;
    if tick % timer_freq == 0 {
        recompute_load_avg(state);
        recompute_all_recent_cpu(state);
        recompute_all_priorities(state);
    } else if tick % 4 == 0 {
        recompute_all_priorities(state);
    }
}

fn recompute_load_avg(state: &mut SchedulerState) {
    let ready_len = state.ready_queue.len();
    let current_running_non_idle = state.current != state.idle;
    let n = mlfqs::num_ready_threads(ready_len, current_running_non_idle);
    state.load_avg = mlfqs::recalculate_load_avg(state.load_avg, n);
}

fn recompute_all_recent_cpu(state: &mut SchedulerState) {
    let load_avg = state.load_avg;
    let ids: alloc::vec::Vec<_> = state.threads.keys().copied().collect();
    for id in ids {
        let t = state.threads.get_mut(&id).unwrap();
        t.recent_cpu = mlfqs::recalculate_recent_cpu(t.recent_cpu, load_avg, t.nice);
    }
}

fn recompute_all_priorities(state: &mut SchedulerState) {
    let ids: alloc::vec::Vec<_> = state.threads.keys().copied().collect();
    for id in ids {
        let t = state.threads.get_mut(&id).unwrap();
        if t.status == ThreadStatus::Dying {
            continue;
        }
        let new_priority = mlfqs::recalculate_priority(t.recent_cpu, t.nice);
        t.priority = new_priority;
        let thread_id = super::ThreadId(id);
        state.reposition_if_ready(thread_id);
    }
}
