/*
 * Ready queue.
 *
 * Priority-descending, FIFO within a priority group. Backed by a
 * `VecDeque` of handles rather than an intrusive list: priority lookups go
 * through a caller-supplied closure so this module stays independent of
 * the thread table's storage.
 */

use alloc::collections::VecDeque;

use super::thread::ThreadId;

/// Ordered sequence of runnable thread handles.
#[derive(Default)]
pub struct ReadyQueue {
    queue: VecDeque<ThreadId>,
}

impl ReadyQueue {
    pub const fn new() -> Self {
        ReadyQueue { queue: VecDeque::new() }
    }

    /// Inserts `id` at the first position whose successor has strictly
    /// lower priority, i.e. after every existing thread of priority
    /// `>= priority(id)` and before the first of lower priority. This keeps
    /// FIFO order within an equal-priority run (mirrors
    /// `insert_thread_ordered` from the source scheduler).
    pub fn insert_ordered<F>(&mut self, id: ThreadId, priority_of: F)
    where
        F: Fn(ThreadId) -> u8,
    {
        let p = priority_of(id);
        let pos = self.queue.iter().position(|&other| priority_of(other) < p);
        match pos {
            Some(idx) => self.queue.insert(idx, id),
            None => self.queue.push_back(id),
        }
    }

    pub fn pop_front(&mut self) -> Option<ThreadId> {
        self.queue.pop_front()
    }

    pub fn remove(&mut self, id: ThreadId) -> bool {
        if let Some(idx) = self.queue.iter().position(|&other| other == id) {
            self.queue.remove(idx);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: ThreadId) -> bool {
        self.queue.iter().any(|&other| other == id)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThreadId> {
        self.queue.iter()
    }
}
