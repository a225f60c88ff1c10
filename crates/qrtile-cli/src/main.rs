// qrtile: tile one QR code image on a printable PDF sheet

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use qrtile_core::{LayoutRequest, Objective, SheetConfig, SheetGenerator};

#[derive(Parser, Debug)]
#[command(author, version, about = "Tile a QR code on a printable PDF sheet with cut guides")]
struct Args {
    /// QR code image (PNG or JPEG)
    image: PathBuf,

    /// Number of codes to place (tile size is maximized when --size is omitted)
    #[arg(short, long)]
    count: Option<u32>,

    /// Edge length of one code in mm (count is maximized when --count is omitted)
    #[arg(short, long)]
    size: Option<f64>,

    /// Non-printable printer margin in mm
    #[arg(short, long)]
    margin: Option<f64>,

    /// How the grid is chosen
    #[arg(long, value_enum)]
    objective: Option<ObjectiveArg>,

    /// Skip the orientation-swapped grids when maximizing tile size
    #[arg(long)]
    no_rotate: bool,

    /// Draw a millimetre ruler along the top edge
    #[arg(long)]
    ruler: bool,

    /// Number of identical sheets in the document
    #[arg(long)]
    sheets: Option<u32>,

    /// Page width in mm (default A4)
    #[arg(long)]
    page_width: Option<f64>,

    /// Page height in mm (default A4)
    #[arg(long)]
    page_height: Option<f64>,

    /// Directory for the generated PDF
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum ObjectiveArg {
    /// Tiles edge to edge, margin taken once from the page
    TightPack,
    /// Page split into near-square cut pieces, margin kept inside each piece
    SquareCut,
}

impl From<ObjectiveArg> for Objective {
    fn from(arg: ObjectiveArg) -> Self {
        match arg {
            ObjectiveArg::TightPack => Objective::TightPack,
            ObjectiveArg::SquareCut => Objective::SquareCut,
        }
    }
}

fn build_config(args: &Args) -> Result<SheetConfig> {
    let mut config = match &args.config {
        Some(path) => SheetConfig::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => SheetConfig::default(),
    };

    if let Some(margin) = args.margin {
        config.page.margin = margin;
    }
    if let Some(width) = args.page_width {
        config.page.width = width;
    }
    if let Some(height) = args.page_height {
        config.page.height = height;
    }
    if let Some(objective) = args.objective {
        config.layout.objective = objective.into();
    }
    if args.no_rotate {
        config.layout.try_rotated = false;
    }
    if args.ruler {
        config.render.ruler = true;
    }
    if let Some(sheets) = args.sheets {
        config.render.sheets = sheets;
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let config = build_config(&args)?;
    let margin = config.page.margin;
    let generator = SheetGenerator::new(config);

    let request = LayoutRequest::new(args.count, args.size);
    let output = generator
        .generate(&args.image, &request)
        .with_context(|| format!("tiling {}", args.image.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Created {}", output.path.display());
        println!(
            "QR codes: {} per sheet / edge: {:.1} mm / margin: {} mm / sheets: {}",
            output.count, output.tile_size, margin, output.sheets
        );
    }
    log::debug!("Output: {:?}", output);

    Ok(())
}
