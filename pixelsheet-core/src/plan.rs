//! Target grid sizing.
//!
//! Turns a source size plus a [`SizeConstraint`] into one concrete
//! [`Dimensions`]. Precedence:
//!
//! 1. `max_cells` set: area budget (see [`plan_for_budget`]), then each axis
//!    is capped by its own bound if one is given.
//! 2. No axis bound: the source size is used unchanged.
//! 3. `keep_ratio`: one uniform scale, the tighter bound wins.
//! 4. Otherwise every axis takes its bound or keeps its source size.
//!
//! All results are at least 1x1.

use std::fmt;

use tracing::debug;

use crate::error::{Error, Result};

/// Absorbs float error such as `49.0 * (2.0 / 49.0) == 1.999...`.
const FLOOR_EPSILON: f64 = 1e-9;

/// A width/height pair in cells (or pixels, for a source image).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Requested output bounds. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeConstraint {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub keep_ratio: bool,
    pub max_cells: Option<u32>,
}

impl Default for SizeConstraint {
    fn default() -> Self {
        Self {
            max_width: None,
            max_height: None,
            keep_ratio: true,
            max_cells: None,
        }
    }
}

impl SizeConstraint {
    /// No bounds, keep ratio.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn with_max_height(mut self, max_height: u32) -> Self {
        self.max_height = Some(max_height);
        self
    }

    pub fn with_keep_ratio(mut self, keep_ratio: bool) -> Self {
        self.keep_ratio = keep_ratio;
        self
    }

    pub fn with_max_cells(mut self, max_cells: u32) -> Self {
        self.max_cells = Some(max_cells);
        self
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("max width", self.max_width),
            ("max height", self.max_height),
            ("max cells", self.max_cells),
        ] {
            if value == Some(0) {
                return Err(Error::InvalidDimensions(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

fn check_source(source: Dimensions) -> Result<()> {
    if source.is_empty() {
        return Err(Error::InvalidDimensions(format!(
            "source image has zero area ({source})"
        )));
    }
    Ok(())
}

fn floor_cells(value: f64) -> u32 {
    ((value + FLOOR_EPSILON).floor() as u32).max(1)
}

/// Resolve `constraint` against a source size.
pub fn plan(source: Dimensions, constraint: &SizeConstraint) -> Result<Dimensions> {
    check_source(source)?;
    constraint.validate()?;

    let target = match (constraint.max_cells, constraint.max_width, constraint.max_height) {
        (Some(max_cells), max_w, max_h) => {
            let budget = plan_for_budget(source, max_cells, constraint.keep_ratio)?;
            Dimensions::new(
                max_w.map_or(budget.width, |w| budget.width.min(w)),
                max_h.map_or(budget.height, |h| budget.height.min(h)),
            )
        }
        (None, None, None) => source,
        (None, max_w, max_h) if constraint.keep_ratio => {
            let ow = source.width as f64;
            let oh = source.height as f64;
            let scale = match (max_w, max_h) {
                (Some(w), Some(h)) => (w as f64 / ow).min(h as f64 / oh),
                (Some(w), None) => w as f64 / ow,
                (None, Some(h)) => h as f64 / oh,
                (None, None) => 1.0,
            };
            Dimensions::new(floor_cells(ow * scale), floor_cells(oh * scale))
        }
        (None, max_w, max_h) => Dimensions::new(
            max_w.unwrap_or(source.width),
            max_h.unwrap_or(source.height),
        ),
    };

    debug!(
        source_width = source.width,
        source_height = source.height,
        target_width = target.width,
        target_height = target.height,
        keep_ratio = constraint.keep_ratio,
        "planned target dimensions"
    );
    Ok(target)
}

/// Size a grid to roughly `max_cells` cells.
///
/// With `keep_ratio` both axes share the scale `sqrt(max_cells / area)`, so
/// the product never exceeds the budget unless an axis had to be raised to 1.
/// Without it the budget is split by aspect ratio: `width =
/// sqrt(max_cells * aspect)`, `height = max_cells / width`. Flooring in that
/// branch can overshoot the budget slightly.
pub fn plan_for_budget(source: Dimensions, max_cells: u32, keep_ratio: bool) -> Result<Dimensions> {
    check_source(source)?;
    if max_cells == 0 {
        return Err(Error::InvalidDimensions("max cells must be positive".into()));
    }

    let ow = source.width as f64;
    let oh = source.height as f64;
    let budget = max_cells as f64;

    let target = if keep_ratio {
        let scale = (budget / (ow * oh)).sqrt();
        Dimensions::new(floor_cells(ow * scale), floor_cells(oh * scale))
    } else {
        let aspect = ow / oh;
        let width = floor_cells((budget * aspect).sqrt());
        let height = floor_cells(budget / width as f64);
        Dimensions::new(width, height)
    };

    debug!(max_cells, keep_ratio, target = %target, "planned budget dimensions");
    Ok(target)
}

/// Reasonable starting bounds for an image, for front ends that pre-fill
/// their size fields.
///
/// The longer side is capped at 100 cells for images up to 500 pixels and
/// 200 beyond that; images up to 100 pixels keep their size.
pub fn suggest_bounds(source: Dimensions, keep_ratio: bool) -> Result<SizeConstraint> {
    check_source(source)?;

    let longest = source.width.max(source.height);
    let suggested = match longest {
        0..=100 => longest,
        101..=500 => 100,
        _ => 200,
    };
    let scaled = |other: u32| floor_cells(other as f64 * suggested as f64 / longest as f64);

    let mut constraint = SizeConstraint::new().with_keep_ratio(keep_ratio);
    if source.width > source.height {
        constraint.max_width = Some(suggested);
        if keep_ratio {
            constraint.max_height = Some(scaled(source.height));
        }
    } else {
        constraint.max_height = Some(suggested);
        if keep_ratio {
            constraint.max_width = Some(scaled(source.width));
        }
    }
    Ok(constraint)
}
