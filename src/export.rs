use std::{fmt, path::Path};

use image::{GrayImage, ImageError};
use log::info;

use crate::colour::Rendering;

/// Errors raised while writing a rendering to disk.
#[derive(Debug)]
pub enum ExportError {
    /// The level buffer does not match the rendering's size.
    SizeMismatch { expected: usize, actual: usize },
    Encode(ImageError),
}

impl From<ImageError> for ExportError {
    fn from(err: ImageError) -> Self {
        Self::Encode(err)
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "expected {expected} levels, got {actual}")
            }
            Self::Encode(err) => write!(f, "image encode error: {err}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::SizeMismatch { .. } => None,
        }
    }
}

pub fn to_image(rendering: &Rendering) -> Result<GrayImage, ExportError> {
    let expected = rendering.size.area();
    let actual = rendering.levels.len();
    if expected != actual {
        return Err(ExportError::SizeMismatch { expected, actual });
    }
    GrayImage::from_raw(
        rendering.size.width,
        rendering.size.height,
        rendering.to_luma8(),
    )
    .ok_or(ExportError::SizeMismatch { expected, actual })
}

/// Writes `rendering` as an 8-bit grayscale image; the format follows the
/// file extension.
pub fn save_png(rendering: &Rendering, path: &Path) -> Result<(), ExportError> {
    let image = to_image(rendering)?;
    image.save(path)?;
    info!(
        "saved {}x{} image to {}",
        rendering.size.width,
        rendering.size.height,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{colour::ColourMap, screen::Size};

    #[test]
    fn image_matches_levels() {
        let rendering = Rendering {
            size: Size::new(2, 1),
            levels: vec![0.0, 1.0],
            colour_map: ColourMap::Gray,
        };
        let image = to_image(&rendering).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [0]);
        assert_eq!(image.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn short_level_buffer_is_rejected() {
        let rendering = Rendering {
            size: Size::new(2, 2),
            levels: vec![0.0; 3],
            colour_map: ColourMap::Gray,
        };
        assert!(matches!(
            to_image(&rendering),
            Err(ExportError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn writes_png_file() {
        let path = std::env::temp_dir().join(format!(
            "mandelbrot-image-export-{}.png",
            std::process::id()
        ));
        let rendering = Rendering {
            size: Size::new(3, 2),
            levels: vec![0.0, 0.5, 1.0, 1.0, 0.5, 0.0],
            colour_map: ColourMap::Gray,
        };
        save_png(&rendering, &path).unwrap();
        let decoded = image::open(&path).unwrap().into_luma8();
        std::fs::remove_file(&path).ok();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(2, 0).0, [255]);
    }
}
