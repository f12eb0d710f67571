use fnv::FnvHashSet;
use nalgebra::SVector;

use crate::event::EventId;

/// A hard sphere, stored at its own proper time.
///
/// `position` and `velocity` are only meaningful at `time`; between events
/// the ball is in free flight and its state at any later instant follows in
/// closed form.
#[derive(Clone, Debug)]
pub struct Ball<const D: usize> {
    pub position: SVector<f64, D>,
    pub velocity: SVector<f64, D>,
    /// Simulated time at which `position` and `velocity` were stored.
    pub time: f64,
    /// Grid cell containing `position` at `time`.
    pub cell: [i64; D],
    /// Events this ball participates in, for bulk invalidation.
    pub events: FnvHashSet<EventId>,
}

impl<const D: usize> Ball<D> {
    pub fn new(position: SVector<f64, D>, velocity: SVector<f64, D>, cell: [i64; D]) -> Self {
        Ball {
            position,
            velocity,
            time: 0.,
            cell,
            events: FnvHashSet::default(),
        }
    }

    pub fn position_at(&self, t: f64, gravity: &SVector<f64, D>) -> SVector<f64, D> {
        let dt = t - self.time;
        self.position + self.velocity * dt + *gravity * (0.5 * dt * dt)
    }

    pub fn velocity_at(&self, t: f64, gravity: &SVector<f64, D>) -> SVector<f64, D> {
        self.velocity + *gravity * (t - self.time)
    }

    // Free flight up to `t`. Events never move a ball backwards in time.
    pub fn advance_to(&mut self, t: f64, gravity: &SVector<f64, D>) {
        let t = t.max(self.time);
        self.position = self.position_at(t, gravity);
        self.velocity = self.velocity_at(t, gravity);
        self.time = t;
    }
}
