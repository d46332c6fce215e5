//! Colouring algorithms.
//!
//! Turns a [`SampleGrid`] of iteration counts into grayscale levels in
//! `[0, 1]`, laid out for an image whose origin is the bottom-left corner:
//! grid row 0 becomes the last image row.

use std::str::FromStr;

use fnv::FnvHashMap;
use log::trace;
use rayon::prelude::{IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator};

use crate::{grid::SampleGrid, screen::Size};

/// Remap applied to iteration counts before normalisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Transform {
    Linear,
    /// `count^(1/3)`, which spreads the low counts near the set boundary.
    #[default]
    CubeRoot,
    /// Histogram equalisation over escaped cells ([Wikipedia](https://en.wikipedia.org/wiki/Plotting_algorithms_for_the_Mandelbrot_set#Histogram_coloring)).
    Histogram,
}

impl FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Transform::Linear),
            "cbrt" | "cube-root" => Ok(Transform::CubeRoot),
            "histogram" => Ok(Transform::Histogram),
            other => Err(format!(
                "unknown transform `{other}`, expected linear, cbrt or histogram"
            )),
        }
    }
}

/// Grayscale colour maps, named after their matplotlib counterparts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColourMap {
    /// Low values black, high values white.
    Gray,
    /// Low values white, high values black.
    #[default]
    GrayReversed,
}

impl ColourMap {
    pub fn apply(self, value: f32) -> f32 {
        match self {
            ColourMap::Gray => value,
            ColourMap::GrayReversed => 1.0 - value,
        }
    }

    /// 8-bit luma for a level this map produced.
    ///
    /// The unmapped value is binned into a 256-entry table first, so `gray_r`
    /// yields `255 - index` rather than the index of the inverted level.
    pub fn luma(self, level: f32) -> u8 {
        match self {
            ColourMap::Gray => lut_index(level),
            ColourMap::GrayReversed => 255 - lut_index(1.0 - level),
        }
    }
}

const LUT_SIZE: f32 = 256.0;

/// `min(floor(value * 256), 255)`, matplotlib's binning of `[0, 1]`.
fn lut_index(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * LUT_SIZE)
        .floor()
        .min(LUT_SIZE - 1.0) as u8
}

impl FromStr for ColourMap {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gray" | "grey" => Ok(ColourMap::Gray),
            "gray_r" | "grey_r" => Ok(ColourMap::GrayReversed),
            other => Err(format!(
                "unknown colour map `{other}`, expected gray or gray_r"
            )),
        }
    }
}

/// Grayscale levels ready for display or export.
#[derive(Clone, Debug, PartialEq)]
pub struct Rendering {
    pub size: Size,
    /// Row-major, top image row first. Each value in `[0, 1]`.
    pub levels: Vec<f32>,
    /// The map that produced `levels`.
    pub colour_map: ColourMap,
}

impl Rendering {
    pub fn to_luma8(&self) -> Vec<u8> {
        self.levels
            .iter()
            .map(|&level| self.colour_map.luma(level))
            .collect()
    }
}

pub fn render(grid: &SampleGrid, transform: Transform, colour_map: ColourMap) -> Rendering {
    trace!("begin render");

    let values = match transform {
        Transform::Linear => normalise(grid.cells().iter().map(|&count| count as f32).collect()),
        Transform::CubeRoot => normalise(
            grid.cells()
                .iter()
                .map(|&count| (count as f32).cbrt())
                .collect(),
        ),
        Transform::Histogram => HistogramColouring::new().colour(grid),
    };

    let width = grid.width();
    let height = grid.height();
    let mut levels = vec![0.0; values.len()];
    levels
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, level)| {
            let image_row = index / width;
            let col = index % width;
            let grid_row = height - 1 - image_row;
            *level = colour_map.apply(values[grid_row * width + col]);
        });

    trace!("end render");
    Rendering {
        size: grid.size(),
        levels,
        colour_map,
    }
}

/// Min/max normalisation; constant input maps to 0.
fn normalise(mut values: Vec<f32>) -> Vec<f32> {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });
    let range = max - min;
    for value in values.iter_mut() {
        *value = if range > 0.0 {
            (*value - min) / range
        } else {
            0.0
        };
    }
    values
}

/// Histogram-based colouring.
///
/// Each escaped cell gets the fraction of escaped cells that escaped strictly
/// earlier than it did. Interior cells get 1.
pub struct HistogramColouring {
    total_samples: usize,
    bucket_labels: Vec<u32>,
    histogram: FnvHashMap<u32, u32>,
    histogram_ranges: FnvHashMap<u32, f32>,
}

impl HistogramColouring {
    pub fn new() -> Self {
        Self {
            total_samples: 0,
            bucket_labels: Vec::new(),
            histogram: FnvHashMap::default(),
            histogram_ranges: FnvHashMap::default(),
        }
    }

    pub fn reset(&mut self) {
        self.total_samples = 0;
        self.bucket_labels.clear();
        self.histogram.clear();
        self.histogram_ranges.clear();
    }

    /// Colour values for every cell of `grid`, in grid order.
    pub fn colour(&mut self, grid: &SampleGrid) -> Vec<f32> {
        trace!("begin histogram colouring");
        self.reset();

        for &count in grid.cells() {
            if grid.is_interior(count) {
                continue;
            }
            let value = self.histogram.entry(count).or_insert_with(|| {
                self.bucket_labels.push(count);
                0
            });
            *value += 1;
            self.total_samples += 1;
        }

        debug_assert_eq!(
            self.total_samples,
            self.histogram.values().map(|value| *value as usize).sum()
        );
        self.bucket_labels.sort_unstable();

        let mut acc = 0;
        let total_samples = self.total_samples as f32;
        for bucket_label in &self.bucket_labels {
            self.histogram_ranges
                .insert(*bucket_label, acc as f32 / total_samples);
            acc += self.histogram[bucket_label];
        }

        let mut values = vec![0.0; grid.cells().len()];
        values
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, value)| {
                let count = grid.cells()[index];
                *value = if grid.is_interior(count) {
                    1.0
                } else {
                    self.histogram_ranges[&count]
                };
            });

        trace!("end histogram colouring");
        values
    }
}

impl Default for HistogramColouring {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{complex::Complex, grid::generate};

    // Rows, bottom to top: [2, 9, 1], [9, 9, 2], [2, 9, 1].
    fn small_grid() -> SampleGrid {
        generate(Complex::ZERO, 10, 3, 3, 1.0).unwrap()
    }

    #[test]
    fn linear_gray_normalises_to_unit_range() {
        let rendering = render(&small_grid(), Transform::Linear, ColourMap::Gray);
        let max = rendering.levels.iter().cloned().fold(f32::MIN, f32::max);
        let min = rendering.levels.iter().cloned().fold(f32::MAX, f32::min);
        assert_eq!(max, 1.0);
        assert_eq!(min, 0.0);
    }

    #[test]
    fn bottom_grid_row_becomes_last_image_row() {
        let grid = generate(Complex::ZERO, 10, 3, 2, 1.0).unwrap();
        let rendering = render(&grid, Transform::Linear, ColourMap::Gray);
        let top_first: Vec<u32> = grid.row(1).iter().chain(grid.row(0)).copied().collect();
        let expected = normalise(top_first.iter().map(|&c| c as f32).collect());
        assert_eq!(rendering.levels, expected);
    }

    #[test]
    fn reversed_map_inverts_levels() {
        let grid = small_grid();
        let gray = render(&grid, Transform::CubeRoot, ColourMap::Gray);
        let reversed = render(&grid, Transform::CubeRoot, ColourMap::GrayReversed);
        for (a, b) in gray.levels.iter().zip(&reversed.levels) {
            assert_eq!(*b, 1.0 - *a);
        }
    }

    #[test]
    fn interior_is_black_with_reversed_gray() {
        let rendering = render(&small_grid(), Transform::CubeRoot, ColourMap::GrayReversed);
        // Center cell is the origin.
        assert_eq!(rendering.to_luma8()[4], 0);
    }

    #[test]
    fn luma_bins_like_a_256_entry_table() {
        assert_eq!(ColourMap::Gray.luma(0.0), 0);
        assert_eq!(ColourMap::Gray.luma(0.5), 128);
        assert_eq!(ColourMap::Gray.luma(254.5 / 256.0), 254);
        assert_eq!(ColourMap::Gray.luma(1.0), 255);

        // gray_r reverses the table, not the level.
        let reversed = |value| ColourMap::GrayReversed.luma(ColourMap::GrayReversed.apply(value));
        assert_eq!(reversed(0.5), 127);
        assert_eq!(reversed(0.0), 255);
        assert_eq!(reversed(1.0), 0);
    }

    #[test]
    fn rendering_luma_uses_its_colour_map() {
        let grid = generate(Complex::new(1.0, 0.0), 10, 2, 1, 1.0).unwrap();
        // c = 0 never escapes, c = 1 escapes at k = 2.
        assert_eq!(grid.cells(), &[9, 2]);

        let gray = render(&grid, Transform::Linear, ColourMap::Gray);
        assert_eq!(gray.to_luma8(), vec![255, 0]);
        let reversed = render(&grid, Transform::Linear, ColourMap::GrayReversed);
        assert_eq!(reversed.to_luma8(), vec![0, 255]);
    }

    #[test]
    fn constant_grid_maps_to_zero() {
        let grid = generate(Complex::new(10.0, 10.0), 10, 2, 2, 0.1).unwrap();
        let rendering = render(&grid, Transform::Linear, ColourMap::Gray);
        assert!(rendering.levels.iter().all(|&level| level == 0.0));
    }

    #[test]
    fn histogram_ranks_escape_counts() {
        let mut colouring = HistogramColouring::new();
        let values = colouring.colour(&small_grid());
        // Escaped counts: 1 (x2), 2 (x3); interior cells are 1.0.
        assert_eq!(
            values,
            vec![0.4, 1.0, 0.0, 1.0, 1.0, 0.4, 0.4, 1.0, 0.0]
        );
    }

    #[test]
    fn parses_names() {
        assert_eq!("gray_r".parse(), Ok(ColourMap::GrayReversed));
        assert_eq!("gray".parse(), Ok(ColourMap::Gray));
        assert_eq!("cbrt".parse(), Ok(Transform::CubeRoot));
        assert_eq!("histogram".parse(), Ok(Transform::Histogram));
        assert!("viridis".parse::<ColourMap>().is_err());
    }
}
