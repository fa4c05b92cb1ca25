use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::PixelGrid;
use crate::plan::Dimensions;

/// Lanczos3 resampler for [`PixelGrid`]s. Keeps its scratch buffers between calls.
pub struct GridResizer {
    resizer: Resizer,
    options: ResizeOptions,
}

impl Default for GridResizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GridResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
        }
    }

    /// Resample `grid` to exactly `target`. The input is never modified; a
    /// same-size target yields a copy.
    pub fn resize(&mut self, grid: &PixelGrid, target: Dimensions) -> Result<PixelGrid> {
        if target.is_empty() {
            return Err(Error::Resampling(format!(
                "target size must be at least 1x1, got {target}"
            )));
        }

        if grid.dimensions() == target {
            debug!(size = %target, "grid already at target size, skipping resample");
            return Ok(grid.clone());
        }

        debug!(from = %grid.dimensions(), to = %target, "resampling grid");

        let src_image = Image::from_vec_u8(
            grid.width(),
            grid.height(),
            grid.as_bytes().to_vec(),
            PixelType::U8x3,
        )
        .map_err(|e| Error::Resampling(format!("failed to create source image: {e}")))?;

        let mut dst_image = Image::new(target.width, target.height, PixelType::U8x3);

        self.resizer
            .resize(&src_image, &mut dst_image, &self.options)
            .map_err(|e| Error::Resampling(format!("resize failed: {e}")))?;

        PixelGrid::from_rgb(target.width, target.height, dst_image.into_vec())
    }
}

/// One-shot [`GridResizer::resize`].
pub fn resample(grid: &PixelGrid, target: Dimensions) -> Result<PixelGrid> {
    GridResizer::new().resize(grid, target)
}
