use nalgebra::SVector;

use crate::ball::Ball;
use crate::grid::CELL_SIZE;
use crate::wall::Wall;

pub const EPSILON: f64 = 1e-9;

/// Outcome of a ball-ball contact prediction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PairPrediction {
    /// No future contact on the current trajectories.
    Miss,
    /// Absolute contact time.
    Contact(f64),
    /// Separation already below 2r beyond tolerance; an invariant breach.
    Overlapping,
}

/// Earliest contact time of two balls, or why there is none.
pub fn ball_ball_time<const D: usize>(
    a: &Ball<D>,
    b: &Ball<D>,
    radius: f64,
    gravity: &SVector<f64, D>,
) -> PairPrediction {
    // Advance both to the later proper time; gravity accelerates both
    // equally, so the relative motion from there on is linear.
    let start = a.time.max(b.time);
    let dx = a.position_at(start, gravity) - b.position_at(start, gravity);
    let dv = a.velocity_at(start, gravity) - b.velocity_at(start, gravity);

    // ||dx + dv*tau||^2 = (2r)^2.
    let c = dx.dot(&dx) - 4. * radius * radius;
    if c < -EPSILON {
        return PairPrediction::Overlapping;
    }

    let proj = dx.dot(&dv);
    if proj >= 0. {
        // Moving apart.
        return PairPrediction::Miss;
    }

    let a2 = dv.dot(&dv);
    if a2 <= EPSILON {
        return PairPrediction::Miss;
    }
    let b2 = 2. * proj;
    let disc = b2 * b2 - 4. * a2 * c;
    if disc <= 0. {
        return PairPrediction::Miss;
    }

    // Entry time is the first root; a hair negative means touching now.
    let tau = (-b2 - disc.sqrt()) / (2. * a2);
    PairPrediction::Contact(start + tau.max(0.))
}

/// Earliest time the ball's surface reaches the wall plane, strictly after
/// its proper time.
pub fn ball_wall_time<const D: usize>(
    ball: &Ball<D>,
    wall: &Wall,
    radius: f64,
    gravity: &SVector<f64, D>,
) -> Option<f64> {
    let k = wall.axis;
    // Contact when normal*(x_k - offset) drops to r.
    let gap = wall.normal * (ball.position[k] - wall.offset) - radius;
    let approach = wall.normal * ball.velocity[k];
    if gap <= EPSILON && approach < 0. {
        // Already at contact distance and still closing in; never schedule
        // in the past.
        return Some(ball.time);
    }
    let tau = smallest_positive_root(0.5 * wall.normal * gravity[k], approach, gap)?;
    Some(ball.time + tau)
}

/// The face crossing that ends a ball's residence in its current cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellExit {
    pub time: f64,
    pub axis: usize,
    pub direction: i64,
}

/// Earliest time the ball's center crosses a face of its current cell.
///
/// Returns `None` only for a ball that never moves (zero velocity and no
/// gravity component on any axis).
pub fn cell_exit<const D: usize>(ball: &Ball<D>, gravity: &SVector<f64, D>) -> Option<CellExit> {
    let mut best: Option<CellExit> = None;
    for k in 0..D {
        let x = ball.position[k];
        let v = ball.velocity[k];
        let g = gravity[k];
        let lo = ball.cell[k] as f64 * CELL_SIZE;
        let hi = lo + CELL_SIZE;

        if g.abs() <= EPSILON {
            // Only the face ahead of the velocity is reachable.
            if v > EPSILON {
                offer(&mut best, ball.time, (hi - x) / v, k, 1);
            } else if v < -EPSILON {
                offer(&mut best, ball.time, (lo - x) / v, k, -1);
            }
        } else {
            // The parabola can cross either face; keep roots whose crossing
            // velocity points out through that face.
            for &(face, direction) in &[(hi, 1i64), (lo, -1i64)] {
                // x + v*tau + g*tau^2/2 = face.
                let disc = v * v - 2. * g * (x - face);
                if disc < 0. {
                    continue;
                }
                let sqrt_disc = disc.sqrt();
                for &tau in &[(-v - sqrt_disc) / g, (-v + sqrt_disc) / g] {
                    let crossing_velocity = v + g * tau;
                    if direction as f64 * crossing_velocity > 0. {
                        offer(&mut best, ball.time, tau, k, direction);
                    }
                }
            }
        }
    }
    best
}

// Keep the earliest crossing. A hair negative means the ball sits exactly on
// a face and has just transited; clamp instead of scheduling in the past.
fn offer(best: &mut Option<CellExit>, now: f64, tau: f64, axis: usize, direction: i64) {
    if tau <= -EPSILON {
        return;
    }
    let time = now + tau.max(0.);
    if best.map_or(true, |exit| time < exit.time) {
        *best = Some(CellExit {
            time,
            axis,
            direction,
        });
    }
}

/// Smallest root of `a*tau^2 + b*tau + c = 0` strictly greater than EPSILON.
pub fn smallest_positive_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if a.abs() <= EPSILON {
        if b.abs() <= EPSILON {
            return None;
        }
        let root = -c / b;
        return if root > EPSILON { Some(root) } else { None };
    }
    let disc = b * b - 4. * a * c;
    if disc < 0. {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let root0 = (-b - sqrt_disc) / (2. * a);
    let root1 = (-b + sqrt_disc) / (2. * a);
    let (first, second) = if root0 <= root1 {
        (root0, root1)
    } else {
        (root1, root0)
    };
    if first > EPSILON {
        Some(first)
    } else if second > EPSILON {
        Some(second)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector2;

    fn ball(position: (f64, f64), velocity: (f64, f64)) -> Ball<2> {
        let position = Vector2::new(position.0, position.1);
        let cell = crate::grid::Grid::cell_of(&position);
        Ball::new(position, Vector2::new(velocity.0, velocity.1), cell)
    }

    fn no_gravity() -> Vector2<f64> {
        Vector2::zeros()
    }

    fn gravity() -> Vector2<f64> {
        Vector2::new(0., -1.)
    }

    #[test]
    fn head_on_pair_contact_time() {
        let a = ball((2., 1.5), (1., 0.));
        let b = ball((4., 1.5), (-1., 0.));
        match ball_ball_time(&a, &b, 0.4, &no_gravity()) {
            PairPrediction::Contact(t) => assert_relative_eq!(t, 0.6, max_relative = 1e-12),
            other => panic!("expected contact, got {:?}", other),
        }
    }

    #[test]
    fn staggered_proper_times_agree() {
        // Same trajectories as the head-on pair, but b is stored 0.2 later.
        let a = ball((2., 1.5), (1., 0.));
        let mut b = ball((3.8, 1.5), (-1., 0.));
        b.time = 0.2;
        match ball_ball_time(&a, &b, 0.4, &no_gravity()) {
            PairPrediction::Contact(t) => assert_relative_eq!(t, 0.6, max_relative = 1e-12),
            other => panic!("expected contact, got {:?}", other),
        }
    }

    #[test]
    fn receding_pair_misses() {
        let a = ball((2., 1.5), (-1., 0.));
        let b = ball((4., 1.5), (1., 0.));
        assert_eq!(ball_ball_time(&a, &b, 0.4, &no_gravity()), PairPrediction::Miss);
    }

    #[test]
    fn parallel_flight_misses() {
        let a = ball((2., 1.5), (1., 0.));
        let b = ball((4., 1.5), (1., 0.));
        assert_eq!(ball_ball_time(&a, &b, 0.4, &no_gravity()), PairPrediction::Miss);
    }

    #[test]
    fn overlap_is_reported() {
        let a = ball((2., 1.5), (1., 0.));
        let b = ball((2.5, 1.5), (-1., 0.));
        assert_eq!(
            ball_ball_time(&a, &b, 0.4, &no_gravity()),
            PairPrediction::Overlapping
        );
    }

    #[test]
    fn gravity_cancels_in_relative_motion() {
        let a = ball((2., 1.5), (1., 0.));
        let b = ball((4., 1.5), (-1., 0.));
        match ball_ball_time(&a, &b, 0.4, &gravity()) {
            PairPrediction::Contact(t) => assert_relative_eq!(t, 0.6, max_relative = 1e-12),
            other => panic!("expected contact, got {:?}", other),
        }
    }

    #[test]
    fn glancing_offset_pair_still_collides() {
        // Vertical offset below 2r, horizontal approach.
        let a = ball((1., 1.5), (1., 0.));
        let b = ball((4., 1.9), (0., 0.));
        match ball_ball_time(&a, &b, 0.4, &no_gravity()) {
            PairPrediction::Contact(t) => {
                // At contact the centers are exactly 2r apart.
                let dx = a.position_at(t, &no_gravity()) - b.position_at(t, &no_gravity());
                assert_relative_eq!(dx.norm(), 0.8, max_relative = 1e-9);
            }
            other => panic!("expected contact, got {:?}", other),
        }
    }

    #[test]
    fn wall_bounce_time() {
        let b = ball((0.5, 1.5), (-1., 0.));
        let wall = Wall {
            axis: 0,
            offset: 0.01,
            normal: 1.,
            restitution: 1.,
        };
        let t = ball_wall_time(&b, &wall, 0.3, &no_gravity()).unwrap();
        assert_relative_eq!(t, 0.19, max_relative = 1e-12);
    }

    #[test]
    fn receding_wall_has_no_event() {
        let b = ball((0.5, 1.5), (1., 0.));
        let wall = Wall {
            axis: 0,
            offset: 0.01,
            normal: 1.,
            restitution: 1.,
        };
        assert!(ball_wall_time(&b, &wall, 0.3, &no_gravity()).is_none());
    }

    #[test]
    fn free_fall_floor_time() {
        let b = ball((1.5, 2.5), (0., 0.));
        let floor = Wall {
            axis: 1,
            offset: 0.01,
            normal: 1.,
            restitution: 1.,
        };
        let t = ball_wall_time(&b, &floor, 0.3, &gravity()).unwrap();
        // 0.5*t^2 = 2.5 - 0.3 - 0.01.
        assert_relative_eq!(t, 4.38f64.sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn slow_ball_never_reaches_ceiling() {
        let b = ball((1.5, 1.5), (0., 0.5));
        let ceiling = Wall {
            axis: 1,
            offset: 2.99,
            normal: -1.,
            restitution: 1.,
        };
        assert!(ball_wall_time(&b, &ceiling, 0.3, &gravity()).is_none());
    }

    #[test]
    fn contact_while_approaching_fires_immediately() {
        let mut b = ball((0.31, 1.5), (-1., 0.));
        b.time = 3.;
        let wall = Wall {
            axis: 0,
            offset: 0.01,
            normal: 1.,
            restitution: 1.,
        };
        assert_eq!(ball_wall_time(&b, &wall, 0.3, &no_gravity()), Some(3.));
    }

    #[test]
    fn cell_exit_straight_line() {
        let b = ball((0.5, 0.5), (1., 0.));
        let exit = cell_exit(&b, &no_gravity()).unwrap();
        assert_relative_eq!(exit.time, 0.5);
        assert_eq!((exit.axis, exit.direction), (0, 1));
    }

    #[test]
    fn cell_exit_on_face_is_immediate() {
        let mut b = ball((1.0, 0.5), (1., 0.));
        // The grid still carries the cell the ball is leaving.
        b.cell = [0, 0];
        let exit = cell_exit(&b, &no_gravity()).unwrap();
        assert_eq!(exit.time, 0.);
        assert_eq!((exit.axis, exit.direction), (0, 1));
    }

    #[test]
    fn cell_exit_under_gravity_from_rest() {
        let b = ball((1.5, 2.5), (0., 0.));
        let exit = cell_exit(&b, &gravity()).unwrap();
        // Falls 0.5 to the lower face: 0.5*tau^2 = 0.5.
        assert_relative_eq!(exit.time, 1.);
        assert_eq!((exit.axis, exit.direction), (1, -1));
    }

    #[test]
    fn thrown_ball_exits_upward_first() {
        let b = ball((1.5, 2.2), (0., 3.));
        let exit = cell_exit(&b, &gravity()).unwrap();
        assert_eq!((exit.axis, exit.direction), (1, 1));
        // 3*tau - tau^2/2 = 0.8.
        assert!(exit.time > 0. && exit.time < 0.3);
    }

    #[test]
    fn apex_below_face_falls_back_through_floor_face() {
        let b = ball((1.5, 2.2), (0., 1.));
        // Apex at 2.7, below the face at 3.
        let exit = cell_exit(&b, &gravity()).unwrap();
        assert_eq!((exit.axis, exit.direction), (1, -1));
        // Returns to 2.2 at tau = 2, then falls 0.2 more.
        assert!(exit.time > 2.);
    }

    #[test]
    fn motionless_ball_never_exits() {
        let b = ball((0.5, 0.5), (0., 0.));
        assert!(cell_exit(&b, &no_gravity()).is_none());
    }

    #[test]
    fn quadratic_root_selection() {
        // Roots 1 and 2: pick the smaller.
        assert_relative_eq!(smallest_positive_root(1., -3., 2.).unwrap(), 1.);
        // Roots -1 and 2: skip the negative one.
        assert_relative_eq!(smallest_positive_root(1., -1., -2.).unwrap(), 2.);
        // Complex roots.
        assert!(smallest_positive_root(1., 0., 1.).is_none());
        // Linear fallback.
        assert_relative_eq!(smallest_positive_root(0., 2., -1.).unwrap(), 0.5);
        assert!(smallest_positive_root(0., 2., 1.).is_none());
        // Degenerate.
        assert!(smallest_positive_root(0., 0., 1.).is_none());
    }
}
