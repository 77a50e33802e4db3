//! FIFO of assistant entries still waiting for agent content.
//!
//! The wire protocol carries no turn identifier, so inbound frames are matched
//! to the head of this queue: the oldest outstanding turn.

use std::collections::VecDeque;

use crate::conversation::EntryId;

#[derive(Debug, Clone, Default)]
pub struct PendingReplies {
    queue: VecDeque<EntryId>,
}

impl PendingReplies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, id: EntryId) {
        self.queue.push_back(id);
    }

    /// Drop the head slot.
    pub fn dequeue(&mut self) -> Option<EntryId> {
        self.queue.pop_front()
    }

    pub fn peek(&self) -> Option<EntryId> {
        self.queue.front().copied()
    }

    /// Remove `id` wherever it sits. Returns whether it was present.
    pub fn remove(&mut self, id: EntryId) -> bool {
        match self.queue.iter().position(|queued| *queued == id) {
            Some(pos) => {
                self.queue.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Point the head slot at a different entry; enqueues if the tracker is empty.
    pub fn replace_head(&mut self, id: EntryId) {
        match self.queue.front_mut() {
            Some(head) => *head = id,
            None => self.queue.push_back(id),
        }
    }

    pub fn clear(&mut self) -> Vec<EntryId> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.queue.iter().copied()
    }
}
