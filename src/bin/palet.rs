use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use palet::image::{
    DEFAULT_HISTOGRAM_LIMIT, export_swatches, extract_palette, extract_palette_full,
    extract_palette_kmeans, recolor,
};
use palet::{
    Color, ConversionMap, Euclidean, ImageBuffer, KMeansOptions, OpenOptions, Palette, Selection,
    SwatchSize, maximize_by_average, minimize_by_average,
};

/// Extract, combine and remap image color palettes.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Fail on truncated images instead of decoding what is readable
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the palette of an image
    Extract(ExtractArgs),
    /// Render hex colors as a swatch strip
    Swatch(SwatchArgs),
    /// Recolor an image to the colors of a palette
    Convert(ConvertArgs),
    /// Combine two palettes
    Set(SetArgs),
    /// Derive a palette by averaging neighbouring colors
    Blend(BlendArgs),
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// Input image
    input: PathBuf,

    /// Scan every pixel instead of using the color histogram
    #[arg(long, conflicts_with = "kmeans")]
    full: bool,

    /// With --full, keep only pixels whose alpha is above this value
    #[arg(long, default_value_t = 0)]
    alpha_threshold: u8,

    /// Reduce the image to this many colors with k-means
    #[arg(short = 'k', long)]
    kmeans: Option<usize>,

    /// Seed for k-means
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Distinct color limit for histogram extraction
    #[arg(long, default_value_t = DEFAULT_HISTOGRAM_LIMIT)]
    limit: usize,

    /// Print a hex to channels object instead of a hex list
    #[arg(long)]
    index: bool,

    /// Also write a swatch image of the palette here
    #[arg(long)]
    swatch: Option<PathBuf>,

    #[command(flatten)]
    size: SizeArgs,
}

#[derive(clap::Args, Debug)]
struct SizeArgs {
    /// Swatch width in pixels
    #[arg(long, default_value_t = 8)]
    swatch_width: u32,

    /// Swatch height in pixels
    #[arg(long, default_value_t = 8)]
    swatch_height: u32,
}

impl SizeArgs {
    fn size(&self) -> SwatchSize {
        SwatchSize {
            width: self.swatch_width,
            height: self.swatch_height,
        }
    }
}

#[derive(clap::Args, Debug)]
struct SwatchArgs {
    /// Colors in drawing order
    #[arg(required = true)]
    colors: Vec<String>,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    size: SizeArgs,
}

#[derive(clap::Args, Debug)]
struct ConvertArgs {
    /// Input image
    input: PathBuf,

    /// Target palette: a JSON file or a comma-separated hex list
    #[arg(short, long, required_unless_present = "palette_image")]
    palette: Option<String>,

    /// Take the target palette from every visible pixel of this image
    #[arg(long, conflicts_with = "palette")]
    palette_image: Option<PathBuf>,

    /// Assign target colors at random instead of by distance
    #[arg(long)]
    random: bool,

    /// Seed for --random
    #[arg(long, requires = "random")]
    seed: Option<u64>,

    /// Map each color to the farthest target color instead of the nearest
    #[arg(long, conflicts_with = "random")]
    farthest: bool,

    /// Output image; the input is overwritten when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the applied color map as JSON
    #[arg(long)]
    print_map: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SetOp {
    Union,
    Intersection,
    Difference,
}

#[derive(clap::Args, Debug)]
struct SetArgs {
    op: SetOp,

    /// Left palette: a JSON file or a comma-separated hex list
    left: String,

    /// Right palette: a JSON file or a comma-separated hex list
    right: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BlendOp {
    Maximize,
    Minimize,
}

#[derive(clap::Args, Debug)]
struct BlendArgs {
    op: BlendOp,

    /// Colors in blending order
    #[arg(required = true)]
    colors: Vec<String>,
}

fn parse_colors(literals: &[String]) -> Result<Vec<Color>> {
    literals
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Color>().with_context(|| format!("bad color {s:?}")))
        .collect()
}

/// A palette operand is either a JSON file or an inline hex list.
fn load_palette(operand: &str) -> Result<Palette> {
    let path = Path::new(operand);
    if path.is_file() {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        return Palette::from_value(&value).with_context(|| format!("loading {}", path.display()));
    }
    Ok(parse_colors(&[operand.to_owned()])?.into_iter().collect())
}

fn print_palette(palette: &Palette, index: bool) -> Result<()> {
    let json = if index {
        serde_json::to_string_pretty(&palette.to_index())?
    } else {
        serde_json::to_string_pretty(palette)?
    };
    println!("{json}");
    Ok(())
}

fn run_extract(args: ExtractArgs, open: &OpenOptions) -> Result<()> {
    let buffer = ImageBuffer::open(&args.input, open)?;

    let palette = if let Some(k) = args.kmeans {
        let options = KMeansOptions {
            colors: k,
            seed: args.seed,
            ..KMeansOptions::default()
        };
        extract_palette_kmeans(&buffer, &options)
    } else if args.full {
        extract_palette_full(&buffer, args.alpha_threshold)
    } else {
        extract_palette(&buffer, args.limit).context("exact extraction failed")?
    };
    info!("Extracted {} colors from {}", palette.len(), args.input.display());

    if let Some(path) = &args.swatch {
        export_swatches(&palette.to_list(), args.size.size())?.save(path)?;
        info!("Saved swatch → {}", path.display());
    }
    print_palette(&palette, args.index)
}

fn run_swatch(args: SwatchArgs) -> Result<()> {
    let colors = parse_colors(&args.colors)?;
    export_swatches(&colors, args.size.size())?.save(&args.output)?;
    println!("Saved → {}", args.output.display());
    Ok(())
}

fn run_convert(args: ConvertArgs, open: &OpenOptions) -> Result<()> {
    let target = match (&args.palette, &args.palette_image) {
        (Some(operand), _) => load_palette(operand)?,
        (None, Some(path)) => extract_palette_full(&ImageBuffer::open(path, open)?, 0),
        (None, None) => bail!("a target palette is required"),
    };

    let input = ImageBuffer::open(&args.input, open)?;
    let source = extract_palette_full(&input, 0);
    let cmap = if args.random {
        ConversionMap::random(&source, &target, args.seed)?
    } else {
        let selection = if args.farthest {
            Selection::Farthest
        } else {
            Selection::Nearest
        };
        ConversionMap::build(&source, &target, &Euclidean, selection)?
    };
    info!("Mapped {} colors onto {}", cmap.len(), target.len());

    let output = args.output.as_deref().unwrap_or(&args.input);
    recolor(&input, &cmap)
        .save(output)
        .with_context(|| format!("converting {}", args.input.display()))?;

    if args.print_map {
        println!("{}", serde_json::to_string_pretty(&cmap)?);
    }
    println!("Saved → {}", output.display());
    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let left = load_palette(&args.left)?;
    let right = load_palette(&args.right)?;
    let result = match args.op {
        SetOp::Union => left.union(&right),
        SetOp::Intersection => left.intersection(&right),
        SetOp::Difference => left.difference(&right),
    };
    print_palette(&result, false)
}

fn run_blend(args: BlendArgs) -> Result<()> {
    let colors = parse_colors(&args.colors)?;
    let blended = match args.op {
        BlendOp::Maximize => maximize_by_average(&colors),
        BlendOp::Minimize => minimize_by_average(&colors),
    };
    println!("{}", serde_json::to_string_pretty(&blended)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let cli = Cli::parse();
    let open = OpenOptions {
        load_truncated: !cli.strict,
    };

    match cli.command {
        Command::Extract(args) => run_extract(args, &open),
        Command::Swatch(args) => run_swatch(args),
        Command::Convert(args) => run_convert(args, &open),
        Command::Set(args) => run_set(args),
        Command::Blend(args) => run_blend(args),
    }
}
