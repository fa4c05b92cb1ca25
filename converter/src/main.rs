mod halfblock;
mod preview;
mod terminal;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pixelsheet_core::convert::DEFAULT_SHEET_NAME;
use pixelsheet_core::util::{default_output_path, format_file_size};
use pixelsheet_core::{
    plan_only, probe_dimensions, ConvertOptions, PixelArtConverter, SheetGeometry, SizeConstraint,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pixelsheet",
    version,
    about = "Convert an image into spreadsheet pixel art (.xlsx)",
    after_help = "Examples:\n  \
        pixelsheet input.jpg output.xlsx\n  \
        pixelsheet input.jpg output.xlsx --max-width 100\n  \
        pixelsheet input.jpg output.xlsx --cell-width 20 --cell-height 20\n  \
        pixelsheet input.jpg output.xlsx --max-width 100 --max-height 50 --no-ratio\n  \
        pixelsheet input.jpg --preview --max-width 100 --show"
)]
struct Cli {
    /// Input image (.jpg .jpeg .png .bmp .gif .tiff .webp)
    input: PathBuf,

    /// Output workbook (default: <input>_pixel_art.xlsx next to the input)
    output: Option<PathBuf>,

    /// Maximum width in cells
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_width: Option<u32>,

    /// Maximum height in cells
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_height: Option<u32>,

    /// Stretch to the given bounds instead of keeping the aspect ratio
    #[arg(long)]
    no_ratio: bool,

    /// Cell width in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    cell_width: Option<u32>,

    /// Cell height in pixels
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    cell_height: Option<u32>,

    /// Worksheet name
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,

    /// Only print the resulting dimensions, do not write a file
    #[arg(long)]
    preview: bool,

    /// Cell budget for sizing; the result is still capped by --max-width/--max-height
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_cells: Option<u32>,

    /// With --preview, also draw the result in the terminal
    #[arg(long, requires = "preview")]
    show: bool,

    /// Print extra details and debug logs
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn constraint(&self) -> SizeConstraint {
        SizeConstraint {
            max_width: self.max_width,
            max_height: self.max_height,
            keep_ratio: !self.no_ratio,
            max_cells: self.max_cells,
        }
    }

    fn options(&self) -> ConvertOptions {
        ConvertOptions::new()
            .with_constraint(self.constraint())
            .with_geometry(SheetGeometry::new(self.cell_width, self.cell_height))
            .with_sheet_name(self.sheet_name.clone())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "pixelsheet=debug,pixelsheet_core=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.preview {
        return run_preview(cli);
    }

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input));

    eprintln!("Converting image: {}", cli.input.display());
    let converter = PixelArtConverter::open(&cli.input)?;

    if cli.verbose {
        let info = converter.info();
        let format = info
            .format
            .map(|f| format!("{f:?}"))
            .unwrap_or_else(|| "unknown".to_string());
        eprintln!("Image: {}, format: {format}, colour: {:?}", info.dimensions(), info.color);
    }

    let options = cli.options();
    let target = converter.preview(&options.constraint)?;
    eprintln!("Target: {target} cells ({} total)", target.cell_count());

    let written = converter
        .convert(&output_path, &options)
        .with_context(|| format!("failed to convert {}", cli.input.display()))?;

    println!("Wrote {}", written.display());
    if cli.verbose {
        let size = fs::metadata(&written)
            .with_context(|| format!("failed to stat {}", written.display()))?
            .len();
        eprintln!("File size: {}", format_file_size(size));
    }

    Ok(())
}

fn run_preview(cli: &Cli) -> anyhow::Result<()> {
    let source = probe_dimensions(&cli.input)?;
    let constraint = cli.constraint();
    let target = plan_only(source, &constraint)?;

    let keep_ratio = cli.verbose.then_some(constraint.keep_ratio);
    print!("{}", preview::report(source, target, keep_ratio));

    if cli.show {
        let stdout = std::io::stdout();
        preview::show(&cli.input, target, &mut stdout.lock())?;
    }
    Ok(())
}
