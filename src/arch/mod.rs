/*
 * Interrupt gate.
 *
 * Disabling interrupts is this kernel's only mutual-exclusion primitive
 * between cooperative thread context and the timer interrupt. Every
 * mutation of the ready queue, the all-threads list, the sleeping list,
 * the donation graph, or a thread's status/priority/recent_cpu runs inside
 * one of these scopes.
 */

use core::sync::atomic::{AtomicUsize, Ordering};

/// Tracks interrupt-context nesting so `in_interrupt_context()` can answer
/// without touching hardware state. The tick handler bumps this on entry
/// and drops it on exit; see `scheduler::tick`.
static INTERRUPT_DEPTH: AtomicUsize = AtomicUsize::new(0);

/// Runs `f` with interrupts disabled, restoring the prior level on return.
///
/// Mirrors `x86_64::instructions::interrupts::without_interrupts`, which the
/// teacher kernel already calls at every scheduler-adjacent critical section
/// (e.g. thread exit, panic handling). Nesting is safe: an inner call
/// observes interrupts already disabled and restores them to "disabled" on
/// exit, matching the outer scope's expectation.
#[cfg(not(test))]
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    x86_64::instructions::interrupts::without_interrupts(f)
}

/// Host-side stand-in used by `#[cfg(test)]` builds, where there is no real
/// interrupt flag to mask. Tests run single-threaded, so the critical
/// section is already exclusive without hardware support.
#[cfg(test)]
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    f()
}

/// True while executing on behalf of the timer interrupt. Several
/// dispatcher operations (`block_current`, `yield_now`, `exit`, `donate`,
/// `reverse`) assert this is false, since they suspend the caller and must
/// run in cooperative context.
pub fn in_interrupt_context() -> bool {
    INTERRUPT_DEPTH.load(Ordering::Acquire) > 0
}

/// Marks entry into interrupt context. Called once by the tick handler
/// before it touches scheduler state.
pub struct InterruptContextGuard;

impl InterruptContextGuard {
    pub fn enter() -> Self {
        INTERRUPT_DEPTH.fetch_add(1, Ordering::AcqRel);
        InterruptContextGuard
    }
}

impl Drop for InterruptContextGuard {
    fn drop(&mut self) {
        INTERRUPT_DEPTH.fetch_sub(1, Ordering::AcqRel);
    }
}
