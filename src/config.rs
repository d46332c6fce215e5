//! Run configuration, read from `MANDELBROT_*` environment variables.
//!
//! Every variable is optional; the defaults render the seahorse-valley
//! detail around `-1.1195 + 0.2718i` at 1080x1080 with 4000 iterations.

use std::{fmt, path::PathBuf, str::FromStr};

use log::info;

use crate::{
    colour::{ColourMap, Transform},
    complex::Complex,
    error,
    grid::{Exhaustion, IterationBudget},
    screen::Size,
    viewport::Viewport,
};

pub const DEFAULT_CENTER: Complex = Complex::new(-1.1195, 0.2718);
pub const DEFAULT_EXTENT: Complex = Complex::new(0.005, 0.005);
pub const DEFAULT_SIZE: Size = Size::new(1080, 1080);
pub const DEFAULT_MAX_ITER: u32 = 4000;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub center: Complex,
    /// Plane window the scale is derived from, unless `scale` is set.
    pub extent: Complex,
    pub scale: Option<f64>,
    pub size: Size,
    pub max_iter: u32,
    pub exhaustion: Exhaustion,
    pub transform: Transform,
    pub colour_map: ColourMap,
    pub output: Option<PathBuf>,
    pub display: bool,
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            extent: DEFAULT_EXTENT,
            scale: None,
            size: DEFAULT_SIZE,
            max_iter: DEFAULT_MAX_ITER,
            exhaustion: Exhaustion::LastIndex,
            transform: Transform::CubeRoot,
            colour_map: ColourMap::GrayReversed,
            output: None,
            display: true,
            threads: num_cpus::get(),
        }
    }
}

/// A variable was set but could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={:?} is invalid: {}",
            self.variable, self.value, self.reason
        )
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self::from_lookup(|name| std::env::var(name).ok())?;
        info!(
            "center {}, {}x{}, max_iter {}, {} threads",
            config.center, config.size.width, config.size.height, config.max_iter, config.threads
        );
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(center) = parse_var(&lookup, "MANDELBROT_CENTER", parse_complex)? {
            config.center = center;
        }
        if let Some(extent) = parse_var(&lookup, "MANDELBROT_EXTENT", parse_complex)? {
            config.extent = extent;
        }
        config.scale = parse_var(&lookup, "MANDELBROT_SCALE", parse_from_str::<f64>)?;
        if let Some(width) = parse_var(&lookup, "MANDELBROT_WIDTH", parse_from_str::<u32>)? {
            config.size.width = width;
        }
        if let Some(height) = parse_var(&lookup, "MANDELBROT_HEIGHT", parse_from_str::<u32>)? {
            config.size.height = height;
        }
        if let Some(max_iter) = parse_var(&lookup, "MANDELBROT_MAX_ITER", parse_from_str::<u32>)? {
            config.max_iter = max_iter;
        }
        if let Some(exhaustion) = parse_var(&lookup, "MANDELBROT_EXHAUSTION", parse_exhaustion)? {
            config.exhaustion = exhaustion;
        }
        if let Some(transform) = parse_var(&lookup, "MANDELBROT_TRANSFORM", parse_from_str)? {
            config.transform = transform;
        }
        if let Some(colour_map) = parse_var(&lookup, "MANDELBROT_CMAP", parse_from_str)? {
            config.colour_map = colour_map;
        }
        config.output = lookup("MANDELBROT_OUTPUT")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);
        if let Some(display) = parse_var(&lookup, "MANDELBROT_DISPLAY", parse_flag)? {
            config.display = display;
        }
        if let Some(threads) = parse_var(&lookup, "MANDELBROT_THREADS", parse_from_str::<usize>)? {
            config.threads = threads.max(1);
        }

        Ok(config)
    }

    pub fn viewport(&self) -> error::Result<Viewport> {
        match self.scale {
            Some(scale) => Viewport::new(self.center, self.size, scale),
            None => Viewport::fit_extent(self.center, self.size, self.extent),
        }
    }

    pub fn budget(&self) -> error::Result<IterationBudget> {
        Ok(IterationBudget::new(self.max_iter)?.with_exhaustion(self.exhaustion))
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &'static str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<Option<T>, ConfigError> {
    match lookup(variable) {
        None => Ok(None),
        Some(value) => parse(value.trim())
            .map(Some)
            .map_err(|reason| ConfigError {
                variable,
                value,
                reason,
            }),
    }
}

fn parse_from_str<T>(value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|err: T::Err| err.to_string())
}

/// `re,im`, or a bare real number.
fn parse_complex(value: &str) -> Result<Complex, String> {
    let mut parts = value.split(',');
    let real = parts.next().unwrap_or_default().trim();
    let imaginary = parts.next().map(str::trim).unwrap_or("0");
    if parts.next().is_some() {
        return Err("expected `re,im`".to_string());
    }
    Ok(Complex::new(
        parse_from_str(real)?,
        parse_from_str(imaginary)?,
    ))
}

fn parse_exhaustion(value: &str) -> Result<Exhaustion, String> {
    match value {
        "last-index" => Ok(Exhaustion::LastIndex),
        "budget" => Ok(Exhaustion::Budget),
        other => Err(format!(
            "unknown convention `{other}`, expected last-index or budget"
        )),
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("`{other}` is not a boolean")),
    }
}
