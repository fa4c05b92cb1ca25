use std::io::Write;
use std::path::Path;

use anyhow::Context;
use crossterm::terminal;
use pixelsheet_core::plan::plan;
use pixelsheet_core::resize::resample;
use pixelsheet_core::{Dimensions, PixelArtConverter, SizeConstraint};
use tracing::debug;

use crate::halfblock::grid_to_cells;
use crate::terminal::render_cells;

/// Used when stdout is not a terminal.
const FALLBACK_TERMINAL: (u16, u16) = (80, 24);

/// The three-line size report printed by `--preview`.
pub fn report(source: Dimensions, target: Dimensions, keep_ratio: Option<bool>) -> String {
    let mut out = format!(
        "Original dimensions: {source}\nTarget dimensions: {target}\nTotal cells: {}\n",
        target.cell_count()
    );
    if let Some(keep) = keep_ratio {
        out.push_str(&format!("Keep ratio: {}\n", if keep { "yes" } else { "no" }));
    }
    out
}

/// Largest grid that fits a `cols x rows` terminal with half blocks, one
/// row kept free for the prompt.
pub fn terminal_fit(target: Dimensions, (cols, rows): (u16, u16)) -> anyhow::Result<Dimensions> {
    let max_w = u32::from(cols.max(1));
    let max_h = u32::from(rows.saturating_sub(1).max(1)) * 2;
    if target.width <= max_w && target.height <= max_h {
        return Ok(target);
    }
    let fit = SizeConstraint::new().with_max_width(max_w).with_max_height(max_h);
    Ok(plan(target, &fit)?)
}

/// Draw `input` into the terminal at `target`, or smaller if the terminal
/// cannot fit it. The source is resampled once, straight to the shown size.
pub fn show(input: &Path, target: Dimensions, out: &mut impl Write) -> anyhow::Result<()> {
    let converter = PixelArtConverter::open(input)?;
    let term = terminal::size().unwrap_or(FALLBACK_TERMINAL);
    let shown = terminal_fit(target, term)?;
    debug!(target = %target, shown = %shown, cols = term.0, rows = term.1, "terminal preview");

    let grid = resample(converter.grid(), shown)?;

    let cells = grid_to_cells(&grid);
    let mut buf = Vec::with_capacity(cells.len() * 40);
    render_cells(&cells, grid.width() as usize, &mut buf);

    out.write_all(&buf).context("failed to write preview")?;
    out.flush()?;
    Ok(())
}
