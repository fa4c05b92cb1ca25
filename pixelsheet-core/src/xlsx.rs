//! Writes a [`RenderedSheet`] as a single-worksheet `.xlsx` workbook.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook, XlsxError};
use tracing::{debug, info};

use crate::color;
use crate::error::{Error, Result};
use crate::plan::Dimensions;
use crate::render::RenderedSheet;

/// Excel's column limit (XFD).
pub const MAX_COLUMNS: u32 = 16_384;
/// Excel's row limit.
pub const MAX_ROWS: u32 = 1_048_576;

/// Fail with `Write` for `path` when `size` does not fit in one worksheet.
pub fn check_fits(size: Dimensions, path: &Path) -> Result<()> {
    if size.width > MAX_COLUMNS || size.height > MAX_ROWS {
        return Err(Error::Write {
            path: path.to_path_buf(),
            source: format!("{size} cells exceed the worksheet limit of {MAX_COLUMNS}x{MAX_ROWS}").into(),
        });
    }
    Ok(())
}

/// Write `sheet` to `path`.
///
/// The workbook is built in memory and moved into place only once it has
/// been fully written, so a failure never leaves a partial file at `path`.
pub fn write_sheet(sheet: &RenderedSheet, sheet_name: &str, path: &Path) -> Result<()> {
    check_fits(Dimensions::new(sheet.width, sheet.height), path)?;

    let buffer = build_workbook(sheet, sheet_name).map_err(|e| match e {
        BuildError::Xlsx(source) => Error::Write {
            path: path.to_path_buf(),
            source: source.to_string().into(),
        },
        BuildError::Color(e) => e,
    })?;
    debug!(bytes = buffer.len(), "serialized workbook");

    persist(path, &buffer)?;
    info!(path = %path.display(), cells = sheet.cells.len(), "wrote workbook");
    Ok(())
}

enum BuildError {
    Xlsx(XlsxError),
    Color(Error),
}

impl From<XlsxError> for BuildError {
    fn from(e: XlsxError) -> Self {
        BuildError::Xlsx(e)
    }
}

fn build_workbook(sheet: &RenderedSheet, sheet_name: &str) -> std::result::Result<Vec<u8>, BuildError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(sheet_name)?;

    for col in 0..sheet.width {
        worksheet.set_column_width(col as u16, sheet.geometry.column_width)?;
    }
    for row in 0..sheet.height {
        worksheet.set_row_height(row, sheet.geometry.row_height)?;
    }

    // One format per distinct colour.
    let mut formats: HashMap<&str, Format> = HashMap::new();
    for cell in &sheet.cells {
        if !formats.contains_key(cell.color.as_str()) {
            let rgb = color::decode(&cell.color).map_err(BuildError::Color)?;
            let format = Format::new()
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(rgb.to_u32()));
            formats.insert(cell.color.as_str(), format);
        }
        let format = &formats[cell.color.as_str()];
        // rust_xlsxwriter is 0-based
        worksheet.write_blank(cell.row - 1, (cell.column - 1) as u16, format)?;
    }
    debug!(distinct_colors = formats.len(), "built worksheet");

    Ok(workbook.save_to_buffer()?)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    path.with_file_name(format!(".{name}.partial"))
}

fn persist(path: &Path, buffer: &[u8]) -> Result<()> {
    let write_err = |e: std::io::Error| Error::Write {
        path: path.to_path_buf(),
        source: Box::new(e),
    };

    let tmp = temp_path_for(path);
    if let Err(e) = fs::write(&tmp, buffer) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{PixelGrid, Rgb};
    use crate::render::{render, CellStyle, SheetGeometry};

    fn sample_sheet() -> RenderedSheet {
        let grid = PixelGrid::from_fn(4, 3, |x, y| Rgb::new(x as u8 * 60, y as u8 * 80, 10)).unwrap();
        render(&grid, &SheetGeometry::new(Some(14), Some(20)))
    }

    #[test]
    fn writes_zip_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.xlsx");
        write_sheet(&sample_sheet(), "PixelArt", &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn unwritable_destination_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("art.xlsx");
        let err = write_sheet(&sample_sheet(), "PixelArt", &path).unwrap_err();

        assert!(matches!(err, Error::Write { .. }));
        assert!(!path.exists());
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn failed_write_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.xlsx");
        fs::write(&path, b"previous").unwrap();

        // '/' is not allowed in a worksheet name.
        let err = write_sheet(&sample_sheet(), "bad/name", &path).unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"previous");
    }

    #[test]
    fn malformed_token_is_a_format_error() {
        let mut sheet = sample_sheet();
        sheet.cells[0] = CellStyle {
            row: 1,
            column: 1,
            color: "nothex".into(),
        };
        let dir = tempfile::tempdir().unwrap();
        let err = write_sheet(&sheet, "PixelArt", &dir.path().join("x.xlsx")).unwrap_err();
        assert!(matches!(err, Error::Format { .. }));
    }

    #[test]
    fn oversized_sheet_is_rejected() {
        let sheet = RenderedSheet {
            width: MAX_COLUMNS + 1,
            height: 1,
            cells: Vec::new(),
            geometry: SheetGeometry::default().resolve(),
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.xlsx");
        assert!(matches!(
            write_sheet(&sheet, "PixelArt", &path),
            Err(Error::Write { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn limits_are_inclusive() {
        let path = Path::new("x.xlsx");
        assert!(check_fits(Dimensions::new(MAX_COLUMNS, MAX_ROWS), path).is_ok());
        assert!(check_fits(Dimensions::new(1, MAX_ROWS + 1), path).is_err());
        assert!(check_fits(Dimensions::new(u32::MAX, u32::MAX), path).is_err());
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        let tmp = temp_path_for(Path::new("/out/dir/art.xlsx"));
        assert_eq!(tmp, Path::new("/out/dir/.art.xlsx.partial"));
    }
}
