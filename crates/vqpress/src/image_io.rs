//! Luminance image I/O
//!
//! Color is collapsed to one intensity per pixel on the way in (the largest
//! of the red, green and blue channels) and expanded to equal channels on
//! the way out.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use tracing::debug;

use crate::{Result, SampleGrid, VqError};

/// Convert a decoded image to a sample grid
pub fn luminance_of(image: &DynamicImage) -> SampleGrid {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    SampleGrid::from_fn(height as usize, width as usize, |r, c| {
        let Rgb([red, green, blue]) = *rgb.get_pixel(c as u32, r as u32);
        red.max(green).max(blue) as f32
    })
}

/// Convert a sample grid to an RGB image with equal channels.
///
/// Samples are truncated toward zero and saturate at 0 and 255.
pub fn image_of(grid: &SampleGrid) -> Result<RgbImage> {
    let width = u32::try_from(grid.width())
        .map_err(|_| VqError::dimensions(format!("width {} too large", grid.width())))?;
    let height = u32::try_from(grid.height())
        .map_err(|_| VqError::dimensions(format!("height {} too large", grid.height())))?;

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let v = grid.get(y as usize, x as usize).unwrap_or(0.0) as u8;
        Rgb([v, v, v])
    }))
}

/// Read an image file as a luminance grid
pub fn read_luminance(path: impl AsRef<Path>) -> Result<SampleGrid> {
    let path = path.as_ref();
    let image = image::open(path)?;
    let grid = luminance_of(&image);
    debug!(path = %path.display(), height = grid.height(), width = grid.width(), "read image");
    Ok(grid)
}

/// Write a luminance grid as an image file; the format follows the extension
pub fn write_luminance(grid: &SampleGrid, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    image_of(grid)?.save(path)?;
    debug!(path = %path.display(), height = grid.height(), width = grid.width(), "wrote image");
    Ok(())
}
