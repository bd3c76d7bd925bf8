//! Event calendar
//!
//! A single-threaded future-event list. Events fire in non-decreasing time
//! order; events scheduled for the same instant fire in insertion order.
//! Rescheduling moves a pending event instead of adding a second copy.

use super::{SimulationError, SimulationResult};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::fmt;

/// Handle of a scheduled event, valid until the event fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

impl fmt::Display for EventHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EVT_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct Key {
    time: f64,
    seq: u64,
    handle: EventHandle,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time.total_cmp(&other.time).then(self.seq.cmp(&other.seq))
    }
}

#[derive(Debug)]
struct Entry<E> {
    seq: u64,
    time: f64,
    event: E,
}

/// Future-event list with a simulated clock
#[derive(Debug)]
pub struct EventCalendar<E> {
    now: f64,
    heap: BinaryHeap<Reverse<Key>>,
    live: HashMap<EventHandle, Entry<E>>,
    next_seq: u64,
    next_handle: u64,
}

impl<E> Default for EventCalendar<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventCalendar<E> {
    /// Empty calendar at time zero
    pub fn new() -> Self {
        Self { now: 0.0, heap: BinaryHeap::new(), live: HashMap::new(), next_seq: 0, next_handle: 0 }
    }

    /// Current simulated time
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    fn check_delay(delay: f64) -> SimulationResult<()> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimulationError::calendar_error(format!(
                "delay must be finite and non-negative, got {}",
                delay
            )));
        }
        Ok(())
    }

    fn push(&mut self, handle: EventHandle, time: f64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Key { time, seq, handle }));
        seq
    }

    /// Schedule `event` to fire `delay` seconds from now
    pub fn schedule(&mut self, delay: f64, event: E) -> SimulationResult<EventHandle> {
        Self::check_delay(delay)?;
        let handle = EventHandle(self.next_handle);
        self.next_handle += 1;
        let time = self.now + delay;
        let seq = self.push(handle, time);
        self.live.insert(handle, Entry { seq, time, event });
        Ok(handle)
    }

    /// Schedule `event` at absolute time `time` (not in the past)
    pub fn schedule_at(&mut self, time: f64, event: E) -> SimulationResult<EventHandle> {
        self.schedule(time - self.now, event)
    }

    /// Move a pending event to fire `new_delay` seconds from now
    ///
    /// The event is ordered as if newly inserted among events of equal time.
    pub fn reschedule(&mut self, handle: EventHandle, new_delay: f64) -> SimulationResult<()> {
        Self::check_delay(new_delay)?;
        if !self.live.contains_key(&handle) {
            return Err(SimulationError::calendar_error(format!(
                "cannot reschedule {}: not pending",
                handle
            )));
        }
        let time = self.now + new_delay;
        let seq = self.push(handle, time);
        if let Some(entry) = self.live.get_mut(&handle) {
            entry.seq = seq;
            entry.time = time;
        }
        Ok(())
    }

    /// Whether `handle` is still waiting to fire
    pub fn is_pending(&self, handle: EventHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Scheduled time of a pending event
    pub fn time_of(&self, handle: EventHandle) -> Option<f64> {
        self.live.get(&handle).map(|entry| entry.time)
    }

    /// Time of the next event, if any
    pub fn peek_time(&mut self) -> Option<f64> {
        self.discard_stale();
        self.heap.peek().map(|Reverse(key)| key.time)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse(key)) = self.heap.peek() {
            match self.live.get(&key.handle) {
                Some(entry) if entry.seq == key.seq => break,
                _ => {
                    self.heap.pop();
                }
            }
        }
    }

    /// Remove the next event and advance the clock to its time
    pub fn pop_next(&mut self) -> Option<(f64, EventHandle, E)> {
        self.discard_stale();
        let Reverse(key) = self.heap.pop()?;
        let entry = self.live.remove(&key.handle)?;
        self.now = entry.time;
        Some((entry.time, key.handle, entry.event))
    }

    /// Pending events in no particular order
    pub fn pending(&self) -> impl Iterator<Item = &E> {
        self.live.values().map(|entry| &entry.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_fire_in_time_order() {
        let mut calendar = EventCalendar::new();
        calendar.schedule(5.0, "late").unwrap();
        calendar.schedule(1.0, "early").unwrap();
        calendar.schedule(3.0, "middle").unwrap();
        let order: Vec<&str> = std::iter::from_fn(|| calendar.pop_next().map(|(_, _, e)| e)).collect();
        assert_eq!(order, vec!["early", "middle", "late"]);
        assert_eq!(calendar.now(), 5.0);
    }

    #[test]
    fn test_equal_times_fire_in_insertion_order() {
        let mut calendar = EventCalendar::new();
        for i in 0..5 {
            calendar.schedule(2.0, i).unwrap();
        }
        let order: Vec<i32> = std::iter::from_fn(|| calendar.pop_next().map(|(_, _, e)| e)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_reschedule_moves_without_duplicating() {
        let mut calendar = EventCalendar::new();
        let moved = calendar.schedule(10.0, "moved").unwrap();
        calendar.schedule(5.0, "fixed").unwrap();
        calendar.reschedule(moved, 1.0).unwrap();
        assert_eq!(calendar.len(), 2);
        assert_eq!(calendar.time_of(moved), Some(1.0));

        let (time, handle, event) = calendar.pop_next().unwrap();
        assert_eq!((time, handle, event), (1.0, moved, "moved"));
        assert!(!calendar.is_pending(moved));
        assert_eq!(calendar.pop_next().map(|(_, _, e)| e), Some("fixed"));
        assert!(calendar.pop_next().is_none());
    }

    #[test]
    fn test_invalid_delays_are_rejected() {
        let mut calendar: EventCalendar<()> = EventCalendar::new();
        assert!(matches!(calendar.schedule(-1.0, ()), Err(SimulationError::CalendarError(_))));
        assert!(calendar.schedule(f64::NAN, ()).is_err());
        assert!(calendar.is_empty());
    }

    #[test]
    fn test_reschedule_of_fired_event_fails() {
        let mut calendar = EventCalendar::new();
        let handle = calendar.schedule(1.0, ()).unwrap();
        calendar.pop_next();
        assert!(calendar.reschedule(handle, 1.0).is_err());
    }

    #[test]
    fn test_schedule_at_is_relative_to_clock() {
        let mut calendar = EventCalendar::new();
        calendar.schedule(4.0, 'a').unwrap();
        calendar.pop_next();
        calendar.schedule_at(6.0, 'b').unwrap();
        assert_eq!(calendar.peek_time(), Some(6.0));
        assert!(calendar.schedule_at(3.0, 'c').is_err());
    }
}
