use std::collections::VecDeque;

use tracing::debug;

/// Default capacity shared by the history and lookahead queues.
pub const QUEUE_CAPACITY: usize = 100;

/// Capacity-bounded deque of wallpaper URIs.
///
/// New entries go in at the back; once the queue is full the oldest entries
/// fall off the front. `dequeue` pops from the back, so the queue behaves
/// like a bounded stack with silent tail-end expiry.
#[derive(Debug, Clone, Default)]
pub struct BoundedDeque {
    items: VecDeque<String>,
    capacity: usize,
}

impl BoundedDeque {
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.min(QUEUE_CAPACITY)),
            capacity,
        }
    }

    /// Append `uri`, evicting from the front while over capacity.
    pub fn enqueue(&mut self, uri: String) {
        self.items.push_back(uri);
        while self.items.len() > self.capacity {
            if let Some(evicted) = self.items.pop_front() {
                debug!(uri = %evicted, "queue full, dropping oldest entry");
            }
        }
    }

    /// Remove and return the most recently enqueued entry.
    pub fn dequeue(&mut self) -> Option<String> {
        self.items.pop_back()
    }

    /// Linear membership scan; the capacity bound keeps this cheap.
    pub fn contains(&self, uri: &str) -> bool {
        self.items.iter().any(|item| item == uri)
    }

    /// Remove the first (front-most) occurrence of `uri`.
    pub fn remove(&mut self, uri: &str) -> bool {
        match self.items.iter().position(|item| item == uri) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace the contents wholesale. Restored state is trusted: no
    /// capacity trimming is applied.
    pub fn restore(&mut self, items: Vec<String>) {
        self.items = VecDeque::from(items);
    }

    /// The most recently enqueued entry, if any.
    pub fn preview(&self) -> Option<&str> {
        self.items.back().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(n: usize) -> String {
        format!("file:///wallpapers/{n}.jpg")
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut queue = BoundedDeque::new();
        for n in 0..250 {
            queue.enqueue(uri(n));
            assert!(queue.len() <= QUEUE_CAPACITY);
        }
        assert_eq!(queue.len(), QUEUE_CAPACITY);
    }

    #[test]
    fn eviction_drops_oldest_entries() {
        let mut queue = BoundedDeque::new();
        let inserted = 130;
        for n in 0..inserted {
            queue.enqueue(uri(n));
        }
        // Oldest survivor is the one at position inserted - capacity.
        assert!(!queue.contains(&uri(inserted - QUEUE_CAPACITY - 1)));
        assert!(queue.contains(&uri(inserted - QUEUE_CAPACITY)));
        assert_eq!(queue.preview(), Some(uri(inserted - 1).as_str()));
    }

    #[test]
    fn dequeue_on_empty_returns_none() {
        let mut queue = BoundedDeque::new();
        assert_eq!(queue.dequeue(), None);
        queue.enqueue(uri(1));
        assert_eq!(queue.dequeue(), Some(uri(1)));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn dequeue_pops_most_recent() {
        let mut queue = BoundedDeque::new();
        queue.enqueue(uri(1));
        queue.enqueue(uri(2));
        assert_eq!(queue.dequeue(), Some(uri(2)));
        assert_eq!(queue.dequeue(), Some(uri(1)));
    }

    #[test]
    fn restore_replaces_contents_and_sets_preview() {
        let mut queue = BoundedDeque::new();
        queue.enqueue(uri(9));
        queue.restore(vec![uri(1), uri(2)]);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.preview(), Some(uri(2).as_str()));
        assert!(!queue.contains(&uri(9)));
    }

    #[test]
    fn remove_takes_first_occurrence_only() {
        let mut queue = BoundedDeque::new();
        queue.enqueue(uri(1));
        queue.enqueue(uri(2));
        queue.enqueue(uri(1));
        assert!(queue.remove(&uri(1)));
        assert_eq!(queue.len(), 2);
        assert!(queue.contains(&uri(1)));
        assert!(!queue.remove(&uri(7)));
    }
}
