use crate::ball::Ball;
use crate::wall::Wall;

/// Restitution impulse between two equal-mass balls already advanced to the
/// impact time. Returns false when the pair is not approaching; a popped
/// event can be a hair late after float noise.
pub fn collide_ball_ball<const D: usize>(
    a: &mut Ball<D>,
    b: &mut Ball<D>,
    restitution: f64,
) -> bool {
    let delta = b.position - a.position;
    let normal = delta / delta.norm();
    let proj = (b.velocity - a.velocity).dot(&normal);
    if proj > 0. {
        return false;
    }
    // Equal unit masses: J = (1 + e) * (dv.n) / 2 along the normal.
    let impulse = (1. + restitution) * proj / 2.;
    a.velocity += normal * impulse;
    b.velocity -= normal * impulse;
    true
}

/// Reflect the wall-normal velocity component.
pub fn collide_ball_wall<const D: usize>(ball: &mut Ball<D>, wall: &Wall) -> bool {
    let proj = wall.normal * ball.velocity[wall.axis];
    if proj >= 0. {
        return false;
    }
    ball.velocity[wall.axis] = -wall.restitution * ball.velocity[wall.axis];
    true
}
