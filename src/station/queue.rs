//! Job queues
//!
//! Used both as station waiting lines and as the holding and rework queues the
//! orchestrator parks jobs in between gates.

use crate::entities::Queued;
use crate::types::QueueDiscipline;
use std::collections::VecDeque;

/// Ordered collection of waiting jobs
#[derive(Debug)]
pub struct JobQueue<T> {
    items: VecDeque<T>,
    discipline: QueueDiscipline,
}

impl<T> Default for JobQueue<T> {
    fn default() -> Self {
        Self::fifo()
    }
}

impl<T> JobQueue<T> {
    /// Queue served in arrival order
    pub fn fifo() -> Self {
        Self::new(QueueDiscipline::Fifo)
    }

    /// Queue with the given discipline
    pub fn new(discipline: QueueDiscipline) -> Self {
        Self { items: VecDeque::new(), discipline }
    }

    /// Discipline of this queue
    pub fn discipline(&self) -> QueueDiscipline {
        self.discipline
    }

    /// Append a job
    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    /// Remove every job in arrival order
    pub fn drain_all(&mut self) -> Vec<T> {
        self.items.drain(..).collect()
    }

    /// Number of waiting jobs
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Waiting jobs in arrival order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }
}

impl<T: Queued> JobQueue<T> {
    /// Remove the job the discipline selects next
    ///
    /// Under priority discipline the highest priority wins and arrival order
    /// breaks ties.
    pub fn remove_next(&mut self) -> Option<T> {
        match self.discipline {
            QueueDiscipline::Fifo => self.items.pop_front(),
            QueueDiscipline::Priority => {
                let mut best: Option<(usize, i32)> = None;
                for (index, item) in self.items.iter().enumerate() {
                    let priority = item.priority();
                    if best.map_or(true, |(_, top)| priority > top) {
                        best = Some((index, priority));
                    }
                }
                best.and_then(|(index, _)| self.items.remove(index))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item(u32, i32);

    impl Queued for Item {
        fn priority(&self) -> i32 {
            self.1
        }
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = JobQueue::fifo();
        queue.enqueue(Item(1, 1));
        queue.enqueue(Item(2, 5));
        queue.enqueue(Item(3, 1));
        assert_eq!(queue.remove_next(), Some(Item(1, 1)));
        assert_eq!(queue.remove_next(), Some(Item(2, 5)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_priority_order_with_fifo_ties() {
        let mut queue = JobQueue::new(QueueDiscipline::Priority);
        queue.enqueue(Item(1, 1));
        queue.enqueue(Item(2, 3));
        queue.enqueue(Item(3, 3));
        queue.enqueue(Item(4, 2));
        let order: Vec<u32> =
            std::iter::from_fn(|| queue.remove_next()).map(|item| item.0).collect();
        assert_eq!(order, vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_drain_all_empties_in_order() {
        let mut queue = JobQueue::new(QueueDiscipline::Priority);
        queue.enqueue(Item(1, 1));
        queue.enqueue(Item(2, 9));
        let drained: Vec<u32> = queue.drain_all().into_iter().map(|item| item.0).collect();
        assert_eq!(drained, vec![1, 2]);
        assert!(queue.is_empty());
        assert!(queue.remove_next().is_none());
    }
}
