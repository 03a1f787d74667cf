//! Utility functions for loading and converting images.
//!
//! Image decoding is the only fatal precondition of a detection run, so every
//! loader here reports failures as [`RegionError::ImageLoad`].

use crate::core::config::ParallelPolicy;
use crate::core::{RegionError, RegionResult};
use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns [`RegionError::ImageLoad`] if the file cannot be opened or decoded.
pub fn load_image(path: &Path) -> RegionResult<RgbImage> {
    let img = image::open(path).map_err(RegionError::ImageLoad)?;
    debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        "image loaded"
    );
    Ok(dynamic_to_rgb(img))
}

/// Loads a batch of images, in parallel when the policy allows it.
///
/// Each path gets its own result so one unreadable file does not hide the
/// others.
pub fn load_images_batch_with_policy<P: AsRef<Path> + Send + Sync>(
    paths: &[P],
    policy: &ParallelPolicy,
) -> Vec<RegionResult<RgbImage>> {
    if policy.should_parallelize(paths.len()) {
        paths.par_iter().map(|p| load_image(p.as_ref())).collect()
    } else {
        paths.iter().map(|p| load_image(p.as_ref())).collect()
    }
}
