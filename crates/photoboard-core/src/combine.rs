//! Split-and-recombine of two pictures.
//!
//! The output canvas is `max(widths) x max(heights)` and starts black. The left
//! half of the first picture is pasted at the origin, then the right half of
//! the second picture is pasted at its own midpoint. Halves use integer
//! division, so for odd widths the right half is one column wider.

use std::path::Path;

use image::{GenericImageView, RgbImage, imageops};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Combine the left half of `left` with the right half of `right`.
pub fn combine_halves(left: &RgbImage, right: &RgbImage) -> RgbImage {
    let (lw, lh) = left.dimensions();
    let (rw, rh) = right.dimensions();

    let mut canvas = RgbImage::new(lw.max(rw), lh.max(rh));

    let left_half = imageops::crop_imm(left, 0, 0, lw / 2, lh).to_image();
    imageops::replace(&mut canvas, &left_half, 0, 0);

    let right_start = rw / 2;
    let right_half = imageops::crop_imm(right, right_start, 0, rw - right_start, rh).to_image();
    imageops::replace(&mut canvas, &right_half, i64::from(right_start), 0);

    canvas
}

/// Open two pictures, combine them and save the result.
///
/// The output format follows the extension of `output`.
pub fn combine_files(left: &Path, right: &Path, output: &Path) -> Result<(u32, u32)> {
    let left_img = open_rgb(left)?;
    let right_img = open_rgb(right)?;
    debug!(
        left = %left.display(),
        left_size = ?left_img.dimensions(),
        right = %right.display(),
        right_size = ?right_img.dimensions(),
        "combining images"
    );

    let combined = combine_halves(&left_img, &right_img);
    combined.save(output).map_err(|e| Error::Image {
        message: format!("failed to save {}: {}", output.display(), e),
    })?;

    let size = combined.dimensions();
    info!(output = %output.display(), width = size.0, height = size.1, "saved combined image");
    Ok(size)
}

fn open_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).map_err(|e| Error::Image {
        message: format!("failed to open {}: {}", path.display(), e),
    })?;
    if img.width() == 0 || img.height() == 0 {
        return Err(Error::Image {
            message: format!("{} has no pixels", path.display()),
        });
    }
    Ok(img.to_rgb8())
}
