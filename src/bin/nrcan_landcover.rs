use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use nrcan_landcover::app::{App, CogRequest};
use nrcan_landcover::config::ConfigLoader;
use nrcan_landcover::error::LandcoverError;
use nrcan_landcover::opendata::OpenDataHttpClient;
use nrcan_landcover::output::{HumanOutput, JsonOutput, OutputMode};
use nrcan_landcover::process::SystemProcessRunner;

#[derive(Parser)]
#[command(name = "nrcan-landcover")]
#[command(about = "STAC and COG tooling for the NRCan Land Cover of Canada product")]
#[command(version, author)]
struct Cli {
    /// Print command results as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (defaults to ./nrcan-landcover.json when present).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Write STAC JSON without fetching the schemas to validate it.
    #[arg(long, global = true)]
    skip_validation: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Create a STAC Collection from the product metadata")]
    CreateCollection(CommonArgs),
    #[command(about = "Convert the land cover GeoTIFF into Cloud-Optimized GeoTIFFs")]
    CreateCog(CogArgs),
    #[command(about = "Create a STAC Item for the product or one of its COG tiles")]
    CreateItem(ItemArgs),
    #[command(about = "Write the product footprint as a GeoJSON extent asset")]
    CreateExtentAsset(CommonArgs),
    #[command(about = "Download, convert and catalog the whole product")]
    BuildFullCollection(FullCollectionArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Output directory; must already exist.
    #[arg(short, long)]
    destination: PathBuf,

    /// JSON-LD metadata URL or path.
    #[arg(short, long)]
    metadata: Option<String>,
}

#[derive(Args)]
struct CogArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// Local GeoTIFF to convert instead of the published package.
    #[arg(short, long)]
    source: Option<PathBuf>,

    #[arg(long)]
    tile: bool,

    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ItemArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// COG to describe; omit for a metadata-only item.
    #[arg(short, long)]
    cog: Option<PathBuf>,

    /// Extent asset to reference.
    #[arg(short, long)]
    extent: Option<PathBuf>,
}

#[derive(Args)]
struct FullCollectionArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long)]
    tile: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<LandcoverError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &LandcoverError) -> u8 {
    match error {
        LandcoverError::UnsupportedMetadataFormat(_)
        | LandcoverError::DestinationMissing(_)
        | LandcoverError::ConfigRead(_)
        | LandcoverError::ConfigParse(_)
        | LandcoverError::InvalidTitle(_) => 2,
        LandcoverError::Http(_)
        | LandcoverError::HttpStatus { .. }
        | LandcoverError::MissingTool(_)
        | LandcoverError::ProcessFailed { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    if cli.skip_validation {
        config.validate_stac = false;
    }
    let client = OpenDataHttpClient::new(config.http_timeout_secs)?;
    let app = App::new(config, client, SystemProcessRunner::new());

    match cli.command {
        Commands::CreateCollection(args) => {
            let result = app.create_collection(args.metadata.as_deref(), &args.destination)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_collection(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_collection(&result),
            }
        }
        Commands::CreateCog(args) => {
            let result = app.create_cog(
                args.common.metadata.as_deref(),
                &args.common.destination,
                args.source.as_deref(),
                CogRequest {
                    tile: args.tile,
                    dry_run: args.dry_run,
                },
            )?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_cog(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_cog(&result),
            }
        }
        Commands::CreateItem(args) => {
            let result = app.create_item(
                args.common.metadata.as_deref(),
                &args.common.destination,
                args.cog.as_deref(),
                args.extent.as_deref(),
            )?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_item(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_item(&result),
            }
        }
        Commands::CreateExtentAsset(args) => {
            let result = app.create_extent_asset(args.metadata.as_deref(), &args.destination)?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_extent_asset(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_extent_asset(&result),
            }
        }
        Commands::BuildFullCollection(args) => {
            let result = app.build_full_collection(
                args.common.metadata.as_deref(),
                &args.common.destination,
                args.tile,
            )?;
            match output_mode {
                OutputMode::Json => JsonOutput::print_collection(&result).into_diagnostic()?,
                OutputMode::Human => HumanOutput::print_collection(&result),
            }
        }
    }
    Ok(())
}
