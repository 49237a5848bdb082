use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use helio_composite::{
    ArcsecRoi, CatalogIndex, ComposeError, CompositeEngine, CompositeRequest, EngineConfig,
    OutputFormat, parse_layer_selection,
};

#[derive(Parser, Debug)]
#[command(name = "helio-composite", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one composite image (or movie frame) into the cache.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// JSON image catalog.
    #[arg(long)]
    catalog: PathBuf,

    /// JSON engine config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Layer selection, e.g. `[SOHO,EIT,EIT,304,1,100],[SOHO,LASCO,C2,white-light,1,60]`.
    #[arg(long)]
    layers: String,

    /// Observation time (RFC 3339).
    #[arg(long)]
    date: chrono::DateTime<chrono::Utc>,

    /// Region of interest in arcseconds as `x1,x2,y1,y2`.
    #[arg(long, allow_hyphen_values = true)]
    roi: String,

    /// Output scale in arcseconds per pixel.
    #[arg(long)]
    scale: f64,

    #[arg(long, value_enum, default_value_t = FormatChoice::Png)]
    format: FormatChoice,

    /// Frame number for `--format frame`.
    #[arg(long)]
    frame_number: Option<u32>,

    /// Copy the finished image here as well.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Png,
    Jpeg,
    Frame,
}

impl From<FormatChoice> for OutputFormat {
    fn from(v: FormatChoice) -> Self {
        match v {
            FormatChoice::Png => OutputFormat::Png,
            FormatChoice::Jpeg => OutputFormat::Jpeg,
            FormatChoice::Frame => OutputFormat::MovieFrame,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let res = match cli.cmd {
        Command::Render(args) => cmd_render(args),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "render failed");
            let msg = match err.downcast_ref::<ComposeError>() {
                Some(e) => e.user_message(),
                None => format!("{err:#}"),
            };
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(p) => EngineConfig::from_json_file(p)?,
        None => EngineConfig::default(),
    };
    let index = CatalogIndex::from_json_file(&args.catalog)?
        .with_window_secs(config.closest_image_window_secs);

    let layers = parse_layer_selection(&args.layers, args.date)?;
    let roi = parse_roi(&args.roi)?;
    let mut request =
        CompositeRequest::new(layers, roi, args.scale).with_format(args.format.into());
    request.frame_number = args.frame_number;

    let engine = CompositeEngine::new(config, Arc::new(index))?;
    let result = engine.render(&request)?;

    if let Some(out) = &args.out {
        std::fs::copy(&result.output_path, out).with_context(|| {
            format!(
                "copy '{}' to '{}'",
                result.output_path.display(),
                out.display()
            )
        })?;
    }

    println!("{}", result.output_path.display());
    Ok(())
}

fn parse_roi(s: &str) -> anyhow::Result<ArcsecRoi> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ComposeError::invalid(format!("roi '{s}' must be four numbers")))?;
    let [x1, x2, y1, y2] = parts.as_slice() else {
        return Err(ComposeError::invalid(format!("roi '{s}' must be x1,x2,y1,y2")).into());
    };
    Ok(ArcsecRoi::from_ranges(*x1, *x2, *y1, *y2)?)
}
