/*
 * Scheduler error surface.
 *
 * Every failure in the scheduling core is either a programmer error
 * (precondition violation, corrupted invariant) or resource exhaustion.
 * `create()` is the only operation that reports failure to its caller
 * instead of aborting the kernel; the rest are asserted against in debug
 * builds and documented here so callers know what they're assuming.
 */

use core::fmt;

/// Recoverable and documented-fatal error conditions of the scheduling core.
///
/// Only [`SchedError::OutOfMemory`] is ever returned from a public API call
/// (`SchedulerManager::create`). The remaining variants name conditions that
/// the core instead enforces with `assert!`/`debug_assert!` at the point of
/// violation; they exist on this enum so the failure table in the crate's
/// specification has a concrete Rust type to point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedError {
    /// `create()` could not obtain a page for the new thread's stack/TCB.
    OutOfMemory,
    /// A precondition was violated (wrong interrupt level, bad thread
    /// status, interrupt-context call where cooperative context was
    /// required). Surfaced as a panic, never returned.
    PreconditionViolation,
    /// The `magic` sentinel at the base of a thread's stack didn't match on
    /// `current()` — the stack overflowed into the thread record.
    StackOverflow,
    /// Division by zero inside fixed-point arithmetic.
    DivisionByZero,
    /// `donate()` was called on a thread that is already marked as a donor.
    AlreadyDonor,
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            SchedError::OutOfMemory => "out of memory allocating thread",
            SchedError::PreconditionViolation => "scheduler precondition violated",
            SchedError::StackOverflow => "thread stack overflow (magic sentinel mismatch)",
            SchedError::DivisionByZero => "division by zero in fixed-point arithmetic",
            SchedError::AlreadyDonor => "thread already marked as a donor",
        };
        f.write_str(msg)
    }
}
