//! Escape-time rendering of the Mandelbrot set.
//!
//! [`grid`] holds the kernel: it maps each pixel of a [`Viewport`] to a point
//! of the complex plane and records how many iterations of `z <- z^2 + c` it
//! takes to leave the disc of radius 2. [`colour`] and [`export`] turn the
//! resulting [`SampleGrid`] into grayscale pixels.

pub mod colour;
pub mod complex;
pub mod config;
pub mod error;
pub mod export;
pub mod grid;
pub mod screen;
pub mod viewport;

pub use complex::Complex;
pub use config::Config;
pub use error::{Error, Result};
pub use grid::{
    escape_count, generate, generate_cancellable, generate_parallel, generate_viewport,
    Exhaustion, IterationBudget, SampleGrid,
};
pub use screen::Size;
pub use viewport::{PlaneExtent, Viewport};
