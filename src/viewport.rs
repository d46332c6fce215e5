//! Mapping between pixel indices and points of the complex plane.

use crate::{
    complex::Complex,
    error::{Error, Result},
    screen::Size,
};

/// Fraction of the requested extent kept when deriving a scale from it.
pub const EXTENT_FILL: f64 = 0.75;

/// A window onto the complex plane, sampled once per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    center: Complex,
    size: Size,
    scale: f64,
}

/// Bottom-left (`z1`) and top-right (`z2`) corners of the rendered window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneExtent {
    pub z1: Complex,
    pub z2: Complex,
}

impl Viewport {
    pub fn new(center: Complex, size: Size, scale: f64) -> Result<Self> {
        if !center.is_finite() {
            return Err(Error::invalid("center", format!("{center} is not finite")));
        }
        if size.width == 0 {
            return Err(Error::invalid("width", "must be at least 1"));
        }
        if size.height == 0 {
            return Err(Error::invalid("height", "must be at least 1"));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::invalid(
                "scale",
                format!("{scale} is not a positive finite number"),
            ));
        }

        Ok(Self {
            center,
            size,
            scale,
        })
    }

    /// Builds a viewport whose scale is derived from a desired plane extent.
    pub fn fit_extent(center: Complex, size: Size, extent: Complex) -> Result<Self> {
        if size.is_empty() {
            // Let `new` report which dimension is zero.
            return Self::new(center, size, 1.0);
        }
        Self::new(center, size, scale_for_extent(extent, size))
    }

    pub fn center(&self) -> Complex {
        self.center
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// The plane point sampled by column `i`, row `j`.
    ///
    /// Offsets are taken from `width / 2` and `height / 2` with integer
    /// division, so pixel `(width / 2, height / 2)` lands exactly on the
    /// center and even-sized grids reach one pixel further on the negative
    /// side than on the positive one.
    pub fn sample_point(&self, i: u32, j: u32) -> Complex {
        let dx = i64::from(i) - i64::from(self.size.width / 2);
        let dy = i64::from(j) - i64::from(self.size.height / 2);
        Complex {
            real: self.center.real + dx as f64 * self.scale,
            imaginary: self.center.imaginary + dy as f64 * self.scale,
        }
    }

    /// Corners used to label the rendered image's axes.
    pub fn plane_extent(&self) -> PlaneExtent {
        let plot = Complex::new(
            f64::from(self.size.width) * self.scale,
            f64::from(self.size.height) * self.scale,
        );
        let half = Complex::new(plot.real / 2.0, plot.imaginary / 2.0);
        let z1 = self.center - half;
        PlaneExtent { z1, z2: z1 + plot }
    }
}

/// `max(extent.re / width, extent.im / height) * 0.75`.
pub fn scale_for_extent(extent: Complex, size: Size) -> f64 {
    let horizontal = extent.real / f64::from(size.width) * EXTENT_FILL;
    let vertical = extent.imaginary / f64::from(size.height) * EXTENT_FILL;
    horizontal.max(vertical)
}
