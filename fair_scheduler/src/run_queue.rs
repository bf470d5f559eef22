//! # Run Queue
//!
//! Ordered index of runnable processes keyed by `(vruntime, id)`.
//!
//! The queue holds only keys, never records. A location index maps each
//! id to the key it was inserted under, so a process can be removed or
//! repositioned in O(log n) without scanning. Removing an entry drops its
//! index entry in the same call, so a stale location cannot outlive it.

use core_types::ProcessId;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

/// Ordering key of a queued process
pub type RunKey = (Duration, ProcessId);

/// Run queue ordered by virtual runtime, ties broken by id
#[derive(Debug, Default)]
pub struct RunQueue {
    tree: BTreeSet<RunKey>,
    locations: HashMap<ProcessId, Duration>,
}

impl RunQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a process at `vruntime`
    ///
    /// Returns `false` without modifying the queue if the id is already
    /// queued or the key is taken.
    pub fn insert(&mut self, id: ProcessId, vruntime: Duration) -> bool {
        if self.locations.contains_key(&id) || !self.tree.insert((vruntime, id)) {
            return false;
        }
        self.locations.insert(id, vruntime);
        true
    }

    /// Removes a process, returning the vruntime it was queued at
    pub fn remove(&mut self, id: ProcessId) -> Option<Duration> {
        let vruntime = self.locations.remove(&id)?;
        self.tree.remove(&(vruntime, id));
        Some(vruntime)
    }

    /// Returns the next process to run
    pub fn head(&self) -> Option<RunKey> {
        self.tree.first().copied()
    }

    /// Returns the smallest queued virtual runtime
    pub fn min_vruntime(&self) -> Option<Duration> {
        self.head().map(|(vruntime, _)| vruntime)
    }

    /// Returns the key a process is queued under
    pub fn location(&self, id: ProcessId) -> Option<Duration> {
        self.locations.get(&id).copied()
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.locations.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Iterates keys in scheduling order
    pub fn iter(&self) -> impl Iterator<Item = RunKey> + '_ {
        self.tree.iter().copied()
    }

    /// Returns true if the tree and the location index agree
    pub fn is_consistent(&self) -> bool {
        self.tree.len() == self.locations.len()
            && self
                .tree
                .iter()
                .all(|(vruntime, id)| self.locations.get(id) == Some(vruntime))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(raw: i32) -> ProcessId {
        ProcessId::new(raw)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_empty_queue() {
        let queue = RunQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.head(), None);
        assert_eq!(queue.min_vruntime(), None);
    }

    #[test]
    fn test_head_is_minimum_vruntime() {
        let mut queue = RunQueue::new();
        assert!(queue.insert(pid(1), ms(30)));
        assert!(queue.insert(pid(2), ms(10)));
        assert!(queue.insert(pid(3), ms(20)));

        assert_eq!(queue.head(), Some((ms(10), pid(2))));
        let order: Vec<_> = queue.iter().map(|(_, id)| id).collect();
        assert_eq!(order, vec![pid(2), pid(3), pid(1)]);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let mut queue = RunQueue::new();
        queue.insert(pid(2), ms(0));
        queue.insert(pid(1), ms(0));
        assert_eq!(queue.head(), Some((ms(0), pid(1))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut queue = RunQueue::new();
        assert!(queue.insert(pid(1), ms(5)));
        assert!(!queue.insert(pid(1), ms(9)));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.location(pid(1)), Some(ms(5)));
    }

    #[test]
    fn test_remove_invalidates_location() {
        let mut queue = RunQueue::new();
        queue.insert(pid(1), ms(5));
        queue.insert(pid(2), ms(7));

        assert_eq!(queue.remove(pid(1)), Some(ms(5)));
        assert!(!queue.contains(pid(1)));
        assert_eq!(queue.location(pid(1)), None);
        assert_eq!(queue.remove(pid(1)), None);
        assert_eq!(queue.head(), Some((ms(7), pid(2))));
        assert!(queue.is_consistent());
    }

    #[test]
    fn test_reposition() {
        let mut queue = RunQueue::new();
        queue.insert(pid(1), ms(0));
        queue.insert(pid(2), ms(3));

        let old = queue.remove(pid(1)).unwrap();
        assert!(queue.insert(pid(1), old + ms(10)));
        assert_eq!(queue.head(), Some((ms(3), pid(2))));
        assert!(queue.is_consistent());
    }
}
