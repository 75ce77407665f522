/*
 * Priority donation engine.
 *
 * Operates on the shared thread table through `ThreadTable`, a thin
 * indirection so `manager.rs` can hold the lock once per public call while
 * this module does the graph walking. Mirrors `thread_donate_priority` /
 * `thread_reverse_priority_donation` / `get_max_priority_donor`.
 */

use super::thread::{LockId, ThreadId, ThreadRecord};

/// Minimal view the donation engine needs of the shared thread table.
/// Implemented by `manager::SchedulerState` so this module never needs to
/// know the table's concrete storage.
pub trait ThreadTable {
    fn get(&self, id: ThreadId) -> &ThreadRecord;
    fn get_mut(&mut self, id: ThreadId) -> &mut ThreadRecord;
    /// Called whenever a READY thread's priority changes, so the ready
    /// queue can be reordered. No-op for non-READY threads.
    fn reposition_if_ready(&mut self, id: ThreadId);
}

/// `donate(donee, lock)`: `donor` (the caller) is about to block on `lock`,
/// held by `donee`. Preconditions (asserted by the caller per ยง4.4): not in
/// interrupt context, `donor.donee` is null, `donor.is_a_donor` is false.
pub fn donate<T: ThreadTable>(table: &mut T, donor: ThreadId, donee: ThreadId, lock: LockId) {
    {
        let d = table.get(donor);
        assert!(d.donee.is_none(), "donor already waiting on a lock");
        assert!(!d.is_a_donor, "donor already marked as a donor");
    }

    let donor_priority = table.get(donor).priority;

    {
        let d = table.get_mut(donor);
        d.donor_lock = Some(lock);
        d.donee = Some(donee);
        d.is_a_donor = true;
    }
    table.get_mut(donee).donor_list.push(donor);

    raise_priority(table, donee, donor_priority);

    // Walk the chain while the next link is itself a donor, raising each
    // subsequent donee's priority up to the original donor's, stopping at
    // the first link whose priority already dominates or at the chain end.
    let mut current = donee;
    loop {
        if !table.get(current).is_a_donor {
            break;
        }
        let next = match table.get(current).donee {
            Some(next) => next,
            None => break,
        };
        if donor_priority <= table.get(next).priority {
            break;
        }
        raise_priority(table, next, donor_priority);
        current = next;
    }
}

fn raise_priority<T: ThreadTable>(table: &mut T, id: ThreadId, priority: u8) {
    let t = table.get_mut(id);
    if priority > t.priority {
        t.priority = priority;
    }
    t.is_a_donee = true;
    table.reposition_if_ready(id);
}

/// `reverse(lock)`: the caller is releasing `lock`. Removes every donor in
/// the caller's `donor_list` whose `donor_lock == lock`, then recomputes
/// the caller's effective priority from whatever donors remain.
pub fn reverse<T: ThreadTable>(table: &mut T, holder: ThreadId, lock: LockId) {
    let released: alloc::vec::Vec<ThreadId> = {
        let h = table.get(holder);
        h.donor_list
            .iter()
            .copied()
            .filter(|&d| table.get(d).donor_lock == Some(lock))
            .collect()
    };

    table.get_mut(holder).donor_list.retain(|d| !released.contains(d));

    for donor in &released {
        let d = table.get_mut(*donor);
        d.is_a_donor = false;
        d.donee = None;
        d.donor_lock = None;
    }

    let original = table.get(holder).original_priority;
    let new_priority = if table.get(holder).donor_list.is_empty() {
        original
    } else {
        max_priority_donor(table, holder).max(original)
    };
    let h = table.get_mut(holder);
    h.priority = new_priority;
    h.is_a_donee = new_priority > original;
    table.reposition_if_ready(holder);
}

/// `get_max_priority_donor`: highest priority among `holder`'s donors.
/// Asserts the donor list is non-empty, matching the source, which treats
/// calling this on an un-donated thread as a programmer error.
fn max_priority_donor<T: ThreadTable>(table: &T, holder: ThreadId) -> u8 {
    let h = table.get(holder);
    assert!(!h.donor_list.is_empty(), "no donors to select a maximum from");
    h.donor_list.iter().map(|&d| table.get(d).priority).max().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::string::ToString;

    struct TestTable {
        threads: BTreeMap<u64, ThreadRecord>,
    }

    impl TestTable {
        fn new() -> Self {
            TestTable { threads: BTreeMap::new() }
        }

        fn add(&mut self, id: u64, priority: u8) {
            self.threads.insert(id, ThreadRecord::new(ThreadId(id), id.to_string(), priority, 0));
        }
    }

    impl ThreadTable for TestTable {
        fn get(&self, id: ThreadId) -> &ThreadRecord {
            self.threads.get(&id.0).unwrap()
        }
        fn get_mut(&mut self, id: ThreadId) -> &mut ThreadRecord {
            self.threads.get_mut(&id.0).unwrap()
        }
        fn reposition_if_ready(&mut self, _id: ThreadId) {}
    }

    #[test]
    fn single_donation_raises_and_links() {
        let mut t = TestTable::new();
        t.add(1, 20); // L
        t.add(2, 40); // H
        donate(&mut t, ThreadId(2), ThreadId(1), LockId(0xA));

        assert_eq!(t.get(ThreadId(1)).priority, 40);
        assert!(t.get(ThreadId(1)).is_a_donee);
        assert_eq!(t.get(ThreadId(2)).donee, Some(ThreadId(1)));
    }

    #[test]
    fn reverse_restores_original_when_no_donors_remain() {
        let mut t = TestTable::new();
        t.add(1, 20);
        t.add(2, 40);
        donate(&mut t, ThreadId(2), ThreadId(1), LockId(0xA));
        reverse(&mut t, ThreadId(1), LockId(0xA));

        assert_eq!(t.get(ThreadId(1)).priority, 20);
        assert!(!t.get(ThreadId(1)).is_a_donee);
        assert!(!t.get(ThreadId(2)).is_a_donor);
        assert_eq!(t.get(ThreadId(2)).donee, None);
    }

    #[test]
    fn nested_donation_propagates_through_chain() {
        let mut t = TestTable::new();
        t.add(1, 10); // A
        t.add(2, 20); // B
        t.add(3, 30); // C

        // B holds Y, A waits on Y: donates 10, ignored since 10 < 20.
        donate(&mut t, ThreadId(1), ThreadId(2), LockId(0xY));
        assert_eq!(t.get(ThreadId(2)).priority, 20);

        // C waits on Z held by B: donates 30, propagates to B.
        donate(&mut t, ThreadId(3), ThreadId(2), LockId(0xZ));
        assert_eq!(t.get(ThreadId(2)).priority, 30);

        // B releases Z: falls back to max(20, whatever A still donates) = 20.
        reverse(&mut t, ThreadId(2), LockId(0xZ));
        assert_eq!(t.get(ThreadId(2)).priority, 20);
    }

    #[test]
    fn lower_priority_donor_does_not_lower_existing_priority() {
        let mut t = TestTable::new();
        t.add(1, 5);
        t.add(2, 50);
        donate(&mut t, ThreadId(1), ThreadId(2), LockId(1));
        assert_eq!(t.get(ThreadId(2)).priority, 50);
    }
}
