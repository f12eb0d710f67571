//! Event-driven hard-sphere dynamics in an axis-aligned box.
//!
//! Time advances from event to event (ball-ball and ball-wall collisions,
//! grid transits, frame exports) instead of by fixed steps; between events
//! every ball is in closed-form free flight.

pub mod ball;
pub mod collision;
pub mod config;
pub mod error;
pub mod event;
pub mod grid;
pub mod output;
pub mod simulation;
pub mod wall;

pub use config::RunConfig;
pub use error::{ConfigError, SimulationError};
pub use simulation::{run, Simulation};
