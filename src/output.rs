use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use nalgebra::SVector;

use crate::ball::Ball;

/// Writes ordinal-named textual frames under the output directory.
pub struct FrameWriter {
    dir: PathBuf,
    frames_written: usize,
}

impl FrameWriter {
    pub fn create(dir: &Path) -> io::Result<FrameWriter> {
        fs::create_dir_all(dir)?;
        Ok(FrameWriter {
            dir: dir.to_path_buf(),
            frames_written: 0,
        })
    }

    /// Emit one frame at `time`: positions extrapolated along the free
    /// flight, velocities as stored (piecewise constant between events).
    pub fn write_frame<const D: usize>(
        &mut self,
        time: f64,
        balls: &[Ball<D>],
        gravity: &SVector<f64, D>,
    ) -> io::Result<()> {
        let path = self
            .dir
            .join(format!("frame_{:06}.dat", self.frames_written));
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "# Time: {}", time)?;
        writeln!(out, "# Balls: {}", balls.len())?;
        for (i, ball) in balls.iter().enumerate() {
            let position = ball.position_at(time, gravity);
            write!(out, "{}", i)?;
            for k in 0..D {
                write!(out, " {}", position[k])?;
            }
            for k in 0..D {
                write!(out, " {}", ball.velocity[k])?;
            }
            writeln!(out)?;
        }
        out.flush()?;
        debug!("wrote {} at t = {}", path.display(), time);
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}
