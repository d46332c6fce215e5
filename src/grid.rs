//! Escape-time grid generation.
//!
//! Every pixel of a [`Viewport`] is mapped to a sample point `c` and the orbit
//! of `z <- z^2 + c` starting from `z = 0` is followed until `|z|^2 > 4` or the
//! [`IterationBudget`] runs out. The iteration index at which that happened is
//! stored in a row-major [`SampleGrid`].

use std::{
    ops::Index,
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

use log::debug;
use rayon::prelude::{IndexedParallelIterator, ParallelIterator, ParallelSliceMut};

use crate::{
    complex::Complex,
    error::{Error, Result},
    screen::Size,
    viewport::Viewport,
};

/// Orbits with `|z|^2` strictly above this have escaped.
pub const ESCAPE_RADIUS_SQUARED: f64 = 4.0;

/// What to store for a pixel whose orbit never escaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Exhaustion {
    /// The last loop index, `max_iter - 1`. A pixel escaping on the final
    /// step is indistinguishable from one that never escaped.
    #[default]
    LastIndex,
    /// The budget itself, `max_iter`.
    Budget,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IterationBudget {
    max_iter: u32,
    exhaustion: Exhaustion,
}

impl IterationBudget {
    pub fn new(max_iter: u32) -> Result<Self> {
        if max_iter == 0 {
            return Err(Error::invalid("max_iter", "must be at least 1"));
        }
        Ok(Self {
            max_iter,
            exhaustion: Exhaustion::default(),
        })
    }

    pub fn with_exhaustion(mut self, exhaustion: Exhaustion) -> Self {
        self.exhaustion = exhaustion;
        self
    }

    pub fn max_iter(&self) -> u32 {
        self.max_iter
    }

    pub fn exhaustion(&self) -> Exhaustion {
        self.exhaustion
    }

    /// Value stored for orbits that stayed bounded for the whole budget.
    pub fn exhausted_value(&self) -> u32 {
        match self.exhaustion {
            Exhaustion::LastIndex => self.max_iter - 1,
            Exhaustion::Budget => self.max_iter,
        }
    }
}

/// Iteration index at which the orbit of `c` first left `|z| <= 2`.
///
/// The update happens before the test, so index `k` means `z_{k+1}` was the
/// first iterate outside the disc.
pub fn escape_count(c: Complex, budget: IterationBudget) -> u32 {
    let mut z = Complex::ZERO;
    for k in 0..budget.max_iter {
        z = z.square() + c;
        if z.norm_sqr() > ESCAPE_RADIUS_SQUARED {
            return k;
        }
    }
    budget.exhausted_value()
}

/// Height x width iteration counts, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleGrid {
    viewport: Viewport,
    budget: IterationBudget,
    cells: Vec<u32>,
}

impl SampleGrid {
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn budget(&self) -> IterationBudget {
        self.budget
    }

    pub fn size(&self) -> Size {
        self.viewport.size()
    }

    pub fn width(&self) -> usize {
        self.viewport.width() as usize
    }

    pub fn height(&self) -> usize {
        self.viewport.height() as usize
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row < self.height() && col < self.width() {
            Some(self.cells[row * self.width() + col])
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> &[u32] {
        let width = self.width();
        &self.cells[row * width..(row + 1) * width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u32]> + '_ {
        self.cells.chunks_exact(self.width())
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<u32> {
        self.cells
    }

    /// Whether a cell holds the value stored for non-escaping orbits.
    pub fn is_interior(&self, value: u32) -> bool {
        value == self.budget.exhausted_value()
    }
}

impl Index<(usize, usize)> for SampleGrid {
    type Output = u32;

    fn index(&self, (row, col): (usize, usize)) -> &u32 {
        assert!(col < self.width(), "column {col} out of bounds");
        &self.cells[row * self.width() + col]
    }
}

/// Validates the parameters and fills a grid on the calling thread.
pub fn generate(
    center: Complex,
    max_iter: u32,
    width: u32,
    height: u32,
    scale: f64,
) -> Result<SampleGrid> {
    let budget = IterationBudget::new(max_iter)?;
    let viewport = Viewport::new(center, Size::new(width, height), scale)?;
    Ok(generate_viewport(&viewport, budget))
}

pub fn generate_viewport(viewport: &Viewport, budget: IterationBudget) -> SampleGrid {
    log_start(viewport, budget, 1);
    let start = Instant::now();

    let mut cells = vec![0; viewport.size().area()];
    for (j, row) in cells.chunks_exact_mut(viewport.width() as usize).enumerate() {
        fill_row(viewport, budget, j as u32, row);
    }

    debug!("grid generated in {:?}", start.elapsed());
    SampleGrid {
        viewport: *viewport,
        budget,
        cells,
    }
}

/// Same output as [`generate_viewport`], with rows spread over the current
/// rayon thread pool.
pub fn generate_parallel(viewport: &Viewport, budget: IterationBudget) -> SampleGrid {
    log_start(viewport, budget, rayon::current_num_threads());
    let start = Instant::now();

    let mut cells = vec![0; viewport.size().area()];
    cells
        .par_chunks_mut(viewport.width() as usize)
        .enumerate()
        .for_each(|(j, row)| fill_row(viewport, budget, j as u32, row));

    debug!("grid generated in {:?}", start.elapsed());
    SampleGrid {
        viewport: *viewport,
        budget,
        cells,
    }
}

/// Parallel generation that checks `cancel` before starting each row.
pub fn generate_cancellable(
    viewport: &Viewport,
    budget: IterationBudget,
    cancel: &AtomicBool,
) -> Result<SampleGrid> {
    generate_checked(viewport, budget, cancel, |_| {})
}

/// Runs `after_row` with the row index once each row is filled.
fn generate_checked(
    viewport: &Viewport,
    budget: IterationBudget,
    cancel: &AtomicBool,
    after_row: impl Fn(usize) + Send + Sync,
) -> Result<SampleGrid> {
    log_start(viewport, budget, rayon::current_num_threads());
    let start = Instant::now();

    let mut cells = vec![0; viewport.size().area()];
    cells
        .par_chunks_mut(viewport.width() as usize)
        .enumerate()
        .try_for_each(|(j, row)| {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::Cancelled);
            }
            fill_row(viewport, budget, j as u32, row);
            after_row(j);
            Ok(())
        })
        .map_err(|err| {
            debug!("grid generation cancelled after {:?}", start.elapsed());
            err
        })?;

    debug!("grid generated in {:?}", start.elapsed());
    Ok(SampleGrid {
        viewport: *viewport,
        budget,
        cells,
    })
}

fn log_start(viewport: &Viewport, budget: IterationBudget, threads: usize) {
    debug!(
        "generating {}x{} grid around {} at scale {:e}, max_iter {} on {} threads",
        viewport.width(),
        viewport.height(),
        viewport.center(),
        viewport.scale(),
        budget.max_iter(),
        threads
    );
}

fn fill_row(viewport: &Viewport, budget: IterationBudget, j: u32, row: &mut [u32]) {
    for (i, cell) in row.iter_mut().enumerate() {
        *cell = escape_count(viewport.sample_point(i as u32, j), budget);
    }
}
