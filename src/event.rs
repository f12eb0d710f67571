use std::cmp::Reverse;

use fnv::FnvHashMap;
use log::debug;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

pub type EventId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind<const D: usize> {
    BallBall { i: usize, j: usize },
    BallWall { i: usize, wall: usize },
    GridTransit { i: usize, new_cell: [i64; D] },
    Export,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Event<const D: usize> {
    pub time: f64,
    pub kind: EventKind<D>,
    pub valid: bool,
}

/// Min-heap of events keyed on (time, insertion order).
///
/// The heap holds ids into the record arena; invalidation flips the record's
/// flag in place and the stale entry is discarded when it surfaces. Nothing
/// is ever searched for or deleted from the heap. Ties in time pop in
/// insertion order, which keeps runs reproducible for a given seed.
pub struct EventQueue<const D: usize> {
    heap: PriorityQueue<EventId, Reverse<(OrderedFloat<f64>, EventId)>>,
    records: FnvHashMap<EventId, Event<D>>,
    next_id: EventId,
}

impl<const D: usize> EventQueue<D> {
    pub fn new() -> Self {
        EventQueue {
            heap: PriorityQueue::new(),
            records: FnvHashMap::default(),
            next_id: 0,
        }
    }

    pub fn push(&mut self, time: f64, kind: EventKind<D>) -> EventId {
        let id = self.next_id;
        self.next_id += 1;
        self.records.insert(
            id,
            Event {
                time,
                kind,
                valid: true,
            },
        );
        self.heap.push(id, Reverse((OrderedFloat(time), id)));
        id
    }

    // Invalidating an already-popped event is a no-op.
    pub fn invalidate(&mut self, id: EventId) {
        if let Some(event) = self.records.get_mut(&id) {
            event.valid = false;
        }
    }

    /// Pop the earliest still-valid event; stale records are dropped here.
    pub fn pop(&mut self) -> Option<Event<D>> {
        while let Some((id, _)) = self.heap.pop() {
            let event = self
                .records
                .remove(&id)
                .expect("queued event without a record");
            if event.valid {
                return Some(event);
            }
            debug!("discarding stale event at {}", event.time);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn valid_events(&self) -> impl Iterator<Item = &Event<D>> {
        self.records.values().filter(|event| event.valid)
    }
}

impl<const D: usize> Default for EventQueue<D> {
    fn default() -> Self {
        Self::new()
    }
}
