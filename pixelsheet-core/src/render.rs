use tracing::debug;

use crate::color;
use crate::grid::PixelGrid;

/// Pixels per spreadsheet character-width unit.
pub const PIXELS_PER_WIDTH_UNIT: f64 = 7.0;
/// Points per pixel for row heights.
pub const POINTS_PER_PIXEL: f64 = 0.75;
/// Column width used when no cell width is requested, in character units.
pub const DEFAULT_COLUMN_WIDTH: f64 = 2.0;
/// Row height used when no cell height is requested, in points.
pub const DEFAULT_ROW_HEIGHT: f64 = 15.0;

/// One output cell: 1-based position and its fill colour token.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellStyle {
    pub row: u32,
    pub column: u32,
    pub color: String,
}

/// Requested on-screen cell size in pixels. Applies to every row/column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SheetGeometry {
    pub cell_width_px: Option<u32>,
    pub cell_height_px: Option<u32>,
}

impl SheetGeometry {
    pub fn new(cell_width_px: Option<u32>, cell_height_px: Option<u32>) -> Self {
        Self {
            cell_width_px,
            cell_height_px,
        }
    }

    /// Convert to spreadsheet units. A zero size counts as unset.
    pub fn resolve(&self) -> ResolvedGeometry {
        let column_width = match self.cell_width_px {
            Some(px) if px > 0 => px as f64 / PIXELS_PER_WIDTH_UNIT,
            _ => DEFAULT_COLUMN_WIDTH,
        };
        let row_height = match self.cell_height_px {
            Some(px) if px > 0 => px as f64 * POINTS_PER_PIXEL,
            _ => DEFAULT_ROW_HEIGHT,
        };
        ResolvedGeometry {
            column_width,
            row_height,
        }
    }
}

/// Column width in character units, row height in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedGeometry {
    pub column_width: f64,
    pub row_height: f64,
}

/// Everything the sheet writer needs: one style per pixel plus sizing.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedSheet {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellStyle>,
    pub geometry: ResolvedGeometry,
}

/// Map every pixel of `grid` to a [`CellStyle`], row by row.
///
/// Pixel `(x, y)` becomes cell `(row y+1, column x+1)`.
pub fn render(grid: &PixelGrid, geometry: &SheetGeometry) -> RenderedSheet {
    let mut cells = Vec::with_capacity(grid.dimensions().cell_count() as usize);

    for y in 0..grid.height() {
        for (x, pixel) in grid.row(y).enumerate() {
            cells.push(CellStyle {
                row: y + 1,
                column: x as u32 + 1,
                color: color::encode(pixel),
            });
        }
    }

    let geometry = geometry.resolve();
    debug!(
        width = grid.width(),
        height = grid.height(),
        cells = cells.len(),
        column_width = geometry.column_width,
        row_height = geometry.row_height,
        "rendered grid"
    );

    RenderedSheet {
        width: grid.width(),
        height: grid.height(),
        cells,
        geometry,
    }
}
