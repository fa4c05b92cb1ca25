//! Image to spreadsheet pixel art.
//!
//! Each pixel of a (resampled) image becomes one solid-filled cell of an
//! `.xlsx` worksheet.

pub mod color;
pub mod convert;
pub mod error;
pub mod grid;
pub mod plan;
pub mod render;
pub mod resize;
pub mod util;
pub mod worker;
pub mod xlsx;

pub use convert::{plan_only, probe_dimensions, ConvertOptions, ImageInfo, PixelArtConverter, Stage};
pub use error::{Error, Result};
pub use grid::{PixelGrid, Rgb};
pub use plan::{Dimensions, SizeConstraint};
pub use render::SheetGeometry;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::color;
    use crate::grid::{PixelGrid, Rgb};
    use crate::plan::{plan, Dimensions, SizeConstraint};
    use crate::render::{render, SheetGeometry};
    use crate::resize::resample;

    #[test]
    fn pipeline_keeps_ratio_and_covers_grid() {
        // Left half red, right half blue.
        let source = PixelGrid::from_fn(200, 100, |x, _| {
            if x < 100 {
                Rgb::new(255, 0, 0)
            } else {
                Rgb::new(0, 0, 255)
            }
        })
        .unwrap();

        let target = plan(source.dimensions(), &SizeConstraint::new().with_max_width(20)).unwrap();
        assert_eq!(target, Dimensions::new(20, 10));

        let resized = resample(&source, target).unwrap();
        let sheet = render(&resized, &SheetGeometry::default());

        assert_eq!(sheet.cells.len(), 200);
        let coords: HashSet<(u32, u32)> = sheet.cells.iter().map(|c| (c.row, c.column)).collect();
        assert_eq!(coords.len(), 200);

        // Far edges keep their colour after Lanczos filtering.
        let first = sheet.cells.iter().find(|c| c.row == 5 && c.column == 1).unwrap();
        let last = sheet.cells.iter().find(|c| c.row == 5 && c.column == 20).unwrap();
        let close = |token: &str, want: Rgb| {
            let got = color::decode(token).unwrap();
            got.r.abs_diff(want.r) <= 1 && got.g.abs_diff(want.g) <= 1 && got.b.abs_diff(want.b) <= 1
        };
        assert!(close(&first.color, Rgb::new(255, 0, 0)), "{}", first.color);
        assert!(close(&last.color, Rgb::new(0, 0, 255)), "{}", last.color);
    }
}
