use log::{debug, info};
use nalgebra::SVector;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand_pcg::Pcg64;

use crate::ball::Ball;
use crate::collision::response::{collide_ball_ball, collide_ball_wall};
use crate::collision::solvers::{
    ball_ball_time, ball_wall_time, cell_exit, PairPrediction, EPSILON,
};
use crate::config::RunConfig;
use crate::error::SimulationError;
use crate::event::{EventKind, EventQueue};
use crate::grid::{cells_around, Grid, CELL_SIZE};
use crate::output::FrameWriter;
use crate::wall::{enclosing_walls, Wall};

/// Runs the configured simulation to completion, dispatching on `ndim`.
pub fn run(config: &RunConfig) -> Result<(), SimulationError> {
    config.validate()?;
    match config.ndim {
        2 => Simulation::<2>::new(config)?.run(),
        3 => Simulation::<3>::new(config)?.run(),
        _ => unreachable!("ndim was validated"),
    }
}

/// Processed-event counters for the completion summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct RunStats {
    pub ball_ball: u64,
    pub ball_wall: u64,
    pub transits: u64,
}

// Which partners to scan when generating ball-ball events.
#[derive(Clone, Copy, Debug, PartialEq)]
enum PairScan {
    All,
    // Initial seeding only: avoids duplicate (i,j)/(j,i) pairs.
    HigherIndexOnly,
}

pub struct Simulation<const D: usize> {
    balls: Vec<Ball<D>>,
    walls: Vec<Wall>,
    grid: Grid<D>,
    queue: EventQueue<D>,
    writer: FrameWriter,
    gravity: SVector<f64, D>,
    radius: f64,
    ball_restitution: f64,
    time: f64,
    end_time: f64,
    stats: RunStats,
}

impl<const D: usize> Simulation<D> {
    /// One ball per interior cell center, row-major, with velocity
    /// components drawn i.i.d. from a unit Gaussian.
    pub fn new(config: &RunConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let cells = config.cells_per_axis();
        let mut rng = Pcg64::seed_from_u64(config.random_seed);
        let mut states = Vec::with_capacity(config.num_balls);
        for flat in 0..config.num_balls {
            // Row-major over interior cells, last axis fastest.
            let mut cell = [0i64; D];
            let mut rest = flat;
            for k in (0..D).rev() {
                let n = cells[k] as usize;
                cell[k] = (rest % n) as i64;
                rest /= n;
            }
            let mut position = SVector::<f64, D>::zeros();
            let mut velocity = SVector::<f64, D>::zeros();
            for k in 0..D {
                position[k] = (cell[k] as f64 + 0.5) * CELL_SIZE;
                velocity[k] = rng.sample(StandardNormal);
            }
            states.push((position, velocity));
        }
        Self::with_state(config, states)
    }

    /// Build a simulation from explicit `(position, velocity)` pairs
    /// instead of the gridded default placement.
    pub fn from_initial_conditions(
        config: &RunConfig,
        states: Vec<(SVector<f64, D>, SVector<f64, D>)>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        Self::with_state(config, states)
    }

    fn with_state(
        config: &RunConfig,
        states: Vec<(SVector<f64, D>, SVector<f64, D>)>,
    ) -> Result<Self, SimulationError> {
        debug_assert_eq!(config.ndim, D);
        let mut domain = SVector::<f64, D>::zeros();
        for k in 0..D {
            domain[k] = config.domain_size[k];
        }

        let mut sim = Simulation {
            balls: Vec::with_capacity(states.len()),
            walls: enclosing_walls(&domain, config.wall_restitution),
            grid: Grid::new(),
            queue: EventQueue::new(),
            writer: FrameWriter::create(&config.output_dir)?,
            gravity: gravity_vector(config.gravity),
            radius: config.ball_radius,
            ball_restitution: config.ball_restitution,
            time: 0.,
            end_time: config.simulation_time,
            stats: RunStats::default(),
        };

        for (i, (position, velocity)) in states.into_iter().enumerate() {
            for wall in &sim.walls {
                if wall.normal * (position[wall.axis] - wall.offset) < sim.radius - EPSILON {
                    return Err(SimulationError::MisplacedBall { ball: i });
                }
            }
            let cell = Grid::cell_of(&position);
            sim.grid.insert(i, cell);
            sim.balls.push(Ball::new(position, velocity, cell));
        }

        // Seed the queue. Overlapping initial states surface here as
        // OverlappingPair, since every neighbor pair gets predicted.
        for i in 0..sim.balls.len() {
            sim.schedule_ball_events(i, PairScan::HigherIndexOnly)?;
        }
        let mut frame = 0u64;
        loop {
            let t = frame as f64 * config.output_rate;
            if t >= config.simulation_time {
                break;
            }
            sim.queue.push(t, EventKind::Export);
            frame += 1;
        }
        sim.queue.push(config.simulation_time, EventKind::End);

        info!(
            "initialized {} balls, {} queued events",
            sim.balls.len(),
            sim.queue.len()
        );
        Ok(sim)
    }

    /// Pop and process events until the End event.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        info!("running to t = {}", self.end_time);
        while self.step()? {}
        Ok(())
    }

    /// Process the next valid event. Returns false once End has been
    /// handled (or the queue is exhausted, which only happens without one).
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        let event = match self.queue.pop() {
            Some(event) => event,
            None => return Ok(false),
        };
        if event.time + EPSILON < self.time {
            return Err(SimulationError::TimeReversal {
                event: event.time,
                now: self.time,
            });
        }
        self.time = self.time.max(event.time);
        match event.kind {
            EventKind::BallBall { i, j } => {
                self.handle_ball_ball(i, j, event.time)?;
            }
            EventKind::BallWall { i, wall } => {
                self.handle_ball_wall(i, wall, event.time)?;
            }
            EventKind::GridTransit { i, new_cell } => {
                self.handle_transit(i, new_cell, event.time)?;
            }
            EventKind::Export => {
                self.writer
                    .write_frame(event.time, &self.balls, &self.gravity)?;
            }
            EventKind::End => {
                self.writer
                    .write_frame(event.time, &self.balls, &self.gravity)?;
                info!(
                    "finished at t = {}: {} ball-ball, {} ball-wall, {} transits, {} frames",
                    self.time,
                    self.stats.ball_ball,
                    self.stats.ball_wall,
                    self.stats.transits,
                    self.writer.frames_written()
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn handle_ball_ball(&mut self, i: usize, j: usize, t: f64) -> Result<(), SimulationError> {
        debug!("ball {} hits ball {} at {}", i, j, t);
        let (lo, hi) = (i.min(j), i.max(j));
        let (left, right) = self.balls.split_at_mut(hi);
        let (a, b) = (&mut left[lo], &mut right[0]);
        a.advance_to(t, &self.gravity);
        b.advance_to(t, &self.gravity);
        collide_ball_ball(a, b, self.ball_restitution);
        self.stats.ball_ball += 1;
        self.invalidate_ball_events(i);
        self.invalidate_ball_events(j);
        self.schedule_ball_events(i, PairScan::All)?;
        self.schedule_ball_events(j, PairScan::All)
    }

    fn handle_ball_wall(&mut self, i: usize, wall: usize, t: f64) -> Result<(), SimulationError> {
        debug!("ball {} hits wall {} at {}", i, wall, t);
        let ball = &mut self.balls[i];
        ball.advance_to(t, &self.gravity);
        collide_ball_wall(ball, &self.walls[wall]);
        self.stats.ball_wall += 1;
        self.invalidate_ball_events(i);
        self.schedule_ball_events(i, PairScan::All)
    }

    fn handle_transit(
        &mut self,
        i: usize,
        new_cell: [i64; D],
        t: f64,
    ) -> Result<(), SimulationError> {
        let old_cell = self.balls[i].cell;
        self.balls[i].advance_to(t, &self.gravity);
        self.grid.remove(i, old_cell);
        self.grid.insert(i, new_cell);
        self.balls[i].cell = new_cell;
        self.stats.transits += 1;
        // A transit applies no impulse: the trajectory is unchanged and all
        // events against the old neighborhood stay valid. Only the cells
        // uncovered by the move need scanning, plus the successor transit.
        self.schedule_after_transit(i, old_cell)
    }

    fn invalidate_ball_events(&mut self, i: usize) {
        let queue = &mut self.queue;
        for id in self.balls[i].events.drain() {
            queue.invalidate(id);
        }
    }

    // Enumerate candidate events for ball `i` against its neighborhood, the
    // walls, and its cell faces, then push and register them.
    fn schedule_ball_events(&mut self, i: usize, scan: PairScan) -> Result<(), SimulationError> {
        let mut found = self.pair_candidates(i, scan, None)?;
        let ball = &self.balls[i];
        for (w, wall) in self.walls.iter().enumerate() {
            if let Some(t) = ball_wall_time(ball, wall, self.radius, &self.gravity) {
                found.push((t, EventKind::BallWall { i, wall: w }));
            }
        }
        if let Some(exit) = cell_exit(ball, &self.gravity) {
            let mut new_cell = ball.cell;
            new_cell[exit.axis] += exit.direction;
            found.push((exit.time, EventKind::GridTransit { i, new_cell }));
        }
        self.push_events(i, found)
    }

    // After a transit only the cells that just entered the neighborhood can
    // hold unseen partners; wall events survive untouched.
    fn schedule_after_transit(&mut self, i: usize, old_cell: [i64; D]) -> Result<(), SimulationError> {
        let mut found = self.pair_candidates(i, PairScan::All, Some(old_cell))?;
        let ball = &self.balls[i];
        if let Some(exit) = cell_exit(ball, &self.gravity) {
            let mut new_cell = ball.cell;
            new_cell[exit.axis] += exit.direction;
            found.push((exit.time, EventKind::GridTransit { i, new_cell }));
        }
        self.push_events(i, found)
    }

    fn pair_candidates(
        &self,
        i: usize,
        scan: PairScan,
        entering_from: Option<[i64; D]>,
    ) -> Result<Vec<(f64, EventKind<D>)>, SimulationError> {
        let ball = &self.balls[i];
        let mut found = Vec::new();
        for cell in cells_around(ball.cell) {
            if let Some(old) = entering_from {
                if chebyshev(&cell, &old) <= 1 {
                    continue;
                }
            }
            if let Some(members) = self.grid.members(&cell) {
                for &j in members {
                    if j == i || (scan == PairScan::HigherIndexOnly && j < i) {
                        continue;
                    }
                    match ball_ball_time(ball, &self.balls[j], self.radius, &self.gravity) {
                        PairPrediction::Contact(t) => {
                            found.push((t, EventKind::BallBall { i, j }));
                        }
                        PairPrediction::Overlapping => {
                            return Err(SimulationError::OverlappingPair {
                                i,
                                j,
                                time: self.time,
                            });
                        }
                        PairPrediction::Miss => {}
                    }
                }
            }
        }
        Ok(found)
    }

    fn push_events(
        &mut self,
        i: usize,
        found: Vec<(f64, EventKind<D>)>,
    ) -> Result<(), SimulationError> {
        for (t, kind) in found {
            if !t.is_finite() || t + EPSILON < self.time {
                return Err(SimulationError::DegenerateTime {
                    ball: i,
                    time: t,
                    now: self.time,
                });
            }
            let id = self.queue.push(t, kind);
            self.balls[i].events.insert(id);
            if let EventKind::BallBall { j, .. } = kind {
                self.balls[j].events.insert(id);
            }
        }
        Ok(())
    }

    pub fn balls(&self) -> &[Ball<D>] {
        &self.balls
    }

    pub fn current_time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }
}

fn gravity_vector<const D: usize>(enabled: bool) -> SVector<f64, D> {
    let mut gravity = SVector::zeros();
    if enabled {
        gravity[1] = -1.;
    }
    gravity
}

fn chebyshev<const D: usize>(a: &[i64; D], b: &[i64; D]) -> i64 {
    let mut max = 0;
    for k in 0..D {
        max = max.max((a[k] - b[k]).abs());
    }
    max
}
