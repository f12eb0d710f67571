use fnv::{FnvHashMap, FnvHashSet};
use nalgebra::SVector;

pub const CELL_SIZE: f64 = 1.;

/// Uniform cell decomposition mapping each cell to the balls inside it.
///
/// With ball diameters below `CELL_SIZE`, any colliding partner of a ball
/// lives in the 3^d neighborhood of its cell.
#[derive(Clone, Debug, Default)]
pub struct Grid<const D: usize> {
    cells: FnvHashMap<[i64; D], FnvHashSet<usize>>,
}

impl<const D: usize> Grid<D> {
    pub fn new() -> Self {
        Grid {
            cells: FnvHashMap::default(),
        }
    }

    pub fn cell_of(position: &SVector<f64, D>) -> [i64; D] {
        let mut cell = [0i64; D];
        for k in 0..D {
            cell[k] = (position[k] / CELL_SIZE).floor() as i64;
        }
        cell
    }

    pub fn insert(&mut self, ball: usize, cell: [i64; D]) {
        self.cells.entry(cell).or_default().insert(ball);
    }

    pub fn remove(&mut self, ball: usize, cell: [i64; D]) {
        if let Some(members) = self.cells.get_mut(&cell) {
            members.remove(&ball);
            if members.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn members(&self, cell: &[i64; D]) -> Option<&FnvHashSet<usize>> {
        self.cells.get(cell)
    }
}

/// The 3^d cells around `center`, center included.
pub fn cells_around<const D: usize>(center: [i64; D]) -> impl Iterator<Item = [i64; D]> {
    (0..3i64.pow(D as u32)).map(move |code| {
        let mut cell = center;
        let mut rest = code;
        for k in 0..D {
            cell[k] += rest % 3 - 1;
            rest /= 3;
        }
        cell
    })
}
