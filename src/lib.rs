//! Pintos-style preemptive thread scheduler core.
//!
//! Three tightly coupled subsystems live here: thread lifecycle and
//! dispatch (`scheduler::dispatcher`), nested priority donation
//! (`scheduler::donation`), and a multi-level feedback queue scheduler
//! (`scheduler::mlfqs`) driven by deterministic fixed-point arithmetic
//! (`scheduler::fixed_point`). The timer device, the page/frame allocator,
//! and the context-switch assembly primitive are external collaborators;
//! this crate only consumes the narrow seams in `scheduler::seams`.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::new_without_default)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod error;
pub mod logging;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::SchedError;
pub use scheduler::seams::{BumpPageAllocator, ContextSwitch, NullContextSwitch, PageAllocator};
pub use scheduler::thread::{LockId, ThreadId, ThreadStatus};
pub use scheduler::SchedulerManager;
