use thiserror::Error;

/// Rejected run parameters; raised before any simulation state is built.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ndim must be 2 or 3, got {0}")]
    BadDimension(usize),
    #[error("domain_size must have {ndim} entries, got {got}")]
    DomainArity { ndim: usize, got: usize },
    #[error("ball_radius must be in (0, 0.5], got {0}")]
    BadRadius(f64),
    #[error("ball diameter {diameter} must be smaller than the cell size {cell}")]
    DiameterExceedsCell { diameter: f64, cell: f64 },
    #[error("domain extent along axis {axis} must exceed {min}, got {size}")]
    DomainTooSmall { axis: usize, size: f64, min: f64 },
    #[error("simulation_time must be positive, got {0}")]
    BadDuration(f64),
    #[error("output_rate must be positive, got {0}")]
    BadOutputRate(f64),
    #[error("restitution must be in (0, 1], got {0}")]
    BadRestitution(f64),
    #[error("cannot place {requested} balls in {capacity} interior cells")]
    TooManyBalls { requested: usize, capacity: usize },
}

/// Fatal runtime failures. The driver raises these and never continues; an
/// invariant breach here points at a bug worth diagnosing, not masking.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("initial position of ball {ball} penetrates a wall")]
    MisplacedBall { ball: usize },
    #[error("balls {i} and {j} overlap at time {time}")]
    OverlappingPair { i: usize, j: usize, time: f64 },
    #[error("degenerate event time {time} predicted for ball {ball} at time {now}")]
    DegenerateTime { ball: usize, time: f64, now: f64 },
    #[error("event at time {event} popped after time {now}")]
    TimeReversal { event: f64, now: f64 },
    #[error("frame output failed: {0}")]
    Io(#[from] std::io::Error),
}
