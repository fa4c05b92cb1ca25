//! Image -> workbook conversion.
//!
//! A conversion walks [`Stage`]s in a fixed order: the image is `Loaded` by
//! [`PixelArtConverter::open`], then each [`PixelArtConverter::convert`] call
//! goes `Planned -> Resampled -> Rendered -> Persisted`. A failing stage
//! stops the call; nothing after it runs.

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{ColorType, ImageError, ImageFormat, ImageReader};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::grid::PixelGrid;
use crate::plan::{plan, Dimensions, SizeConstraint};
use crate::render::{render, SheetGeometry};
use crate::resize::resample;
use crate::util::is_supported_image;
use crate::xlsx;

/// Worksheet name used when the caller does not pick one.
pub const DEFAULT_SHEET_NAME: &str = "PixelArt";

/// Pipeline stages, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loaded,
    Planned,
    Resampled,
    Rendered,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loaded => "loaded",
            Stage::Planned => "planned",
            Stage::Resampled => "resampled",
            Stage::Rendered => "rendered",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Per-call settings. Built once by the front end and passed by reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertOptions {
    pub constraint: SizeConstraint,
    pub geometry: SheetGeometry,
    pub sheet_name: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            constraint: SizeConstraint::default(),
            geometry: SheetGeometry::default(),
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constraint(mut self, constraint: SizeConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    pub fn with_geometry(mut self, geometry: SheetGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: impl Into<String>) -> Self {
        self.sheet_name = sheet_name.into();
        self
    }
}

/// What was learned about the source image while loading it.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: Option<ImageFormat>,
    pub color: ColorType,
}

impl ImageInfo {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// A decoded source image, ready to be converted any number of times.
pub struct PixelArtConverter {
    info: ImageInfo,
    grid: PixelGrid,
}

impl PixelArtConverter {
    /// Load and decode `path`. Transparency is dropped.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        check_input(path)?;

        let reader = open_reader(path)?;
        let format = reader.format();
        let image = reader.decode().map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let color = image.color();
        let grid = PixelGrid::try_from(image.into_rgb8())?;

        let info = ImageInfo {
            path: path.to_path_buf(),
            width: grid.width(),
            height: grid.height(),
            format,
            color,
        };
        debug!(
            stage = %Stage::Loaded,
            path = %path.display(),
            size = %info.dimensions(),
            format = ?info.format,
            "loaded image"
        );

        Ok(Self { info, grid })
    }

    /// Use an already decoded grid as the source.
    pub fn from_grid(grid: PixelGrid) -> Self {
        let info = ImageInfo {
            path: PathBuf::new(),
            width: grid.width(),
            height: grid.height(),
            format: None,
            color: ColorType::Rgb8,
        };
        Self { info, grid }
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Target size `constraint` would produce, without converting.
    pub fn preview(&self, constraint: &SizeConstraint) -> Result<Dimensions> {
        plan_only(self.grid.dimensions(), constraint)
    }

    /// Convert to a workbook at `output` and return that path.
    pub fn convert(&self, output: impl AsRef<Path>, options: &ConvertOptions) -> Result<PathBuf> {
        self.convert_with_progress(output, options, |_| {})
    }

    /// [`convert`](Self::convert), calling `on_stage` after each completed stage.
    pub fn convert_with_progress(
        &self,
        output: impl AsRef<Path>,
        options: &ConvertOptions,
        mut on_stage: impl FnMut(Stage),
    ) -> Result<PathBuf> {
        let output = output.as_ref();

        let target = plan(self.grid.dimensions(), &options.constraint)?;
        xlsx::check_fits(target, output)?;
        debug!(stage = %Stage::Planned, target = %target);
        on_stage(Stage::Planned);

        let resized = resample(&self.grid, target)?;
        debug!(stage = %Stage::Resampled, size = %resized.dimensions());
        on_stage(Stage::Resampled);

        let sheet = render(&resized, &options.geometry);
        debug!(stage = %Stage::Rendered, cells = sheet.cells.len());
        on_stage(Stage::Rendered);

        xlsx::write_sheet(&sheet, &options.sheet_name, output)?;
        debug!(stage = %Stage::Persisted, path = %output.display());
        on_stage(Stage::Persisted);

        info!(
            source = %self.info.path.display(),
            output = %output.display(),
            size = %target,
            "conversion finished"
        );
        Ok(output.to_path_buf())
    }
}

/// Resolve the target size for a source size. Pure; for previews.
pub fn plan_only(source: Dimensions, constraint: &SizeConstraint) -> Result<Dimensions> {
    plan(source, constraint)
}

/// Read only the image header to get its size.
pub fn probe_dimensions(path: impl AsRef<Path>) -> Result<Dimensions> {
    let path = path.as_ref();
    check_input(path)?;

    let (width, height) = open_reader(path)?
        .into_dimensions()
        .map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Dimensions::new(width, height))
}

/// Open `image` and convert it to `output` in one go.
pub fn convert(
    image: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<PathBuf> {
    PixelArtConverter::open(image)?.convert(output, options)
}

fn check_input(path: &Path) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidInput {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    if !path.exists() {
        return Err(invalid("file does not exist"));
    }
    if !path.is_file() {
        return Err(invalid("not a regular file"));
    }
    if !is_supported_image(path) {
        return Err(invalid("unsupported image extension"));
    }
    Ok(())
}

fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>> {
    let load_err = |e: std::io::Error| Error::ImageLoad {
        path: path.to_path_buf(),
        source: ImageError::IoError(e),
    };
    ImageReader::open(path)
        .map_err(load_err)?
        .with_guessed_format()
        .map_err(load_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgb;

    fn gradient(width: u32, height: u32) -> PixelGrid {
        PixelGrid::from_fn(width, height, |x, y| {
            Rgb::new((x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128)
        })
        .unwrap()
    }

    #[test]
    fn stages_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let converter = PixelArtConverter::from_grid(gradient(20, 10));
        let mut stages = Vec::new();
        let options = ConvertOptions::new().with_constraint(SizeConstraint::new().with_max_width(10));

        let out = converter
            .convert_with_progress(dir.path().join("a.xlsx"), &options, |s| stages.push(s))
            .unwrap();

        assert_eq!(
            stages,
            vec![Stage::Planned, Stage::Resampled, Stage::Rendered, Stage::Persisted]
        );
        assert!(out.exists());
    }

    #[test]
    fn failing_stage_stops_the_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let converter = PixelArtConverter::from_grid(gradient(4, 4));
        let mut stages = Vec::new();

        let bad_plan = ConvertOptions::new().with_constraint(SizeConstraint::new().with_max_width(0));
        let err = converter
            .convert_with_progress(dir.path().join("a.xlsx"), &bad_plan, |s| stages.push(s))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions(_)));
        assert!(stages.is_empty());

        let bad_write = ConvertOptions::new();
        let err = converter
            .convert_with_progress(dir.path().join("no/such/dir.xlsx"), &bad_write, |s| stages.push(s))
            .unwrap_err();
        assert!(matches!(err, Error::Write { .. }));
        assert_eq!(stages, vec![Stage::Planned, Stage::Resampled, Stage::Rendered]);
    }

    #[test]
    fn oversized_target_fails_before_resampling() {
        let dir = tempfile::tempdir().unwrap();
        let converter = PixelArtConverter::from_grid(gradient(1, 1));
        let path = dir.path().join("wide.xlsx");

        let too_wide = ConvertOptions::new()
            .with_constraint(SizeConstraint::new().with_max_width(xlsx::MAX_COLUMNS + 1));
        let huge = ConvertOptions::new().with_constraint(
            SizeConstraint::new()
                .with_max_width(u32::MAX)
                .with_max_height(u32::MAX)
                .with_keep_ratio(false),
        );

        for options in [too_wide, huge] {
            let mut stages = Vec::new();
            let err = converter
                .convert_with_progress(&path, &options, |s| stages.push(s))
                .unwrap_err();
            assert!(matches!(err, Error::Write { .. }), "{err}");
            assert!(stages.is_empty(), "{stages:?}");
            assert!(!path.exists());
        }

        let fits = ConvertOptions::new().with_constraint(SizeConstraint::new().with_max_width(16));
        converter.convert(&path, &fits).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn preview_matches_plan() {
        let converter = PixelArtConverter::from_grid(gradient(200, 100));
        let c = SizeConstraint::new().with_max_width(100);
        assert_eq!(converter.preview(&c).unwrap(), Dimensions::new(100, 50));
        assert_eq!(plan_only(Dimensions::new(200, 100), &c).unwrap(), Dimensions::new(100, 50));
    }

    #[test]
    fn plan_only_rejects_zero_area() {
        let err = plan_only(Dimensions::new(0, 50), &SizeConstraint::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions(_)));
    }

    #[test]
    fn missing_file_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.png");
        assert!(matches!(PixelArtConverter::open(&path), Err(Error::InvalidInput { .. })));
        assert!(matches!(probe_dimensions(&path), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn unsupported_extension_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        assert!(matches!(PixelArtConverter::open(&path), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn directory_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folder.png");
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(PixelArtConverter::open(&path), Err(Error::InvalidInput { .. })));
    }

    #[test]
    fn corrupt_bytes_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(PixelArtConverter::open(&path), Err(Error::ImageLoad { .. })));
    }

    #[test]
    fn options_default_sheet_name() {
        let options = ConvertOptions::default();
        assert_eq!(options.sheet_name, "PixelArt");
        assert!(options.constraint.keep_ratio);
        assert_eq!(ConvertOptions::new().with_sheet_name("Art").sheet_name, "Art");
    }

    #[test]
    fn stage_names() {
        assert_eq!(Stage::Loaded.to_string(), "loaded");
        assert!(Stage::Planned < Stage::Persisted);
    }
}
