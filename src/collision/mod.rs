pub mod response;
pub mod solvers;

pub use response::{collide_ball_ball, collide_ball_wall};
pub use solvers::{ball_ball_time, ball_wall_time, cell_exit, CellExit, PairPrediction, EPSILON};
