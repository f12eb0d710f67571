use nalgebra::SVector;

/// Walls sit slightly inside the domain boundary.
pub const WALL_INSET: f64 = 0.01;

/// An axis-aligned wall plane with an inward-facing normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub axis: usize,
    pub offset: f64,
    /// +1 when the interior lies above `offset`, -1 when below.
    pub normal: f64,
    pub restitution: f64,
}

/// The 2*d walls enclosing the domain, each inset by `WALL_INSET`.
pub fn enclosing_walls<const D: usize>(domain: &SVector<f64, D>, restitution: f64) -> Vec<Wall> {
    let mut walls = Vec::with_capacity(2 * D);
    for axis in 0..D {
        walls.push(Wall {
            axis,
            offset: WALL_INSET,
            normal: 1.,
            restitution,
        });
        walls.push(Wall {
            axis,
            offset: domain[axis] - WALL_INSET,
            normal: -1.,
            restitution,
        });
    }
    walls
}
