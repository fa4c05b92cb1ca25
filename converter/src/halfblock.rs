use pixelsheet_core::{PixelGrid, Rgb};

/// One terminal cell showing two stacked pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TermCell {
    /// Top pixel (background colour)
    pub top: Rgb,
    /// Bottom pixel (foreground colour of the lower half block)
    pub bottom: Rgb,
}

/// Pack a pixel grid into terminal cells using the half-block trick.
/// Each cell = 2 vertical pixels: bg = top pixel, fg = bottom pixel.
///
/// Output: `width x ceil(height / 2)` cells, row-major. With an odd height
/// the last row repeats its top pixel.
pub fn grid_to_cells(grid: &PixelGrid) -> Vec<TermCell> {
    let cols = grid.width();
    let rows = grid.height().div_ceil(2);
    let mut cells = Vec::with_capacity(cols as usize * rows as usize);

    for row in 0..rows {
        let top_y = row * 2;
        let bot_y = (top_y + 1).min(grid.height() - 1);

        for col in 0..cols {
            cells.push(TermCell {
                top: grid.pixel(col, top_y),
                bottom: grid.pixel(col, bot_y),
            });
        }
    }

    cells
}
