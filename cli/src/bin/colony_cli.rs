use clap::{Parser, Subcommand};
use cli::{CliError, CountConfig, ParameterOverrides};
use color_eyre::eyre::Result;
use colony::{Pipeline, PipelineParameters};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count colonies in a single image
    Count {
        /// Path to the plate image (overrides `image` in the configuration file)
        #[arg(short, long)]
        image: Option<PathBuf>,
        /// Path to a TOML or JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to write the annotated image
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print a JSON report instead of the bare count
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: ParameterOverrides,
    },
    /// Write a configuration file holding the default parameters
    Defaults {
        /// Destination (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the JSON schema of the parameter set
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Count {
            image,
            config,
            output,
            json,
            overrides,
        } => {
            count(image.as_deref(), config.as_deref(), output.as_deref(), *json, overrides)?;
        }
        Commands::Defaults { output } => {
            CountConfig::default().to_file(output)?;
            info!("Default configuration written to {:?}", output);
        }
        Commands::Schema => {
            let schema = PipelineParameters::schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn count(
    image: Option<&Path>,
    config_path: Option<&Path>,
    output: Option<&Path>,
    json: bool,
    overrides: &ParameterOverrides,
) -> Result<()> {
    let config = match config_path {
        Some(path) => CountConfig::from_file(path)?,
        None => CountConfig::default(),
    };

    let mut params = config.parameters.clone();
    overrides.apply(&mut params);

    let image_path = image
        .map(Path::to_path_buf)
        .or_else(|| config.image.as_ref().map(PathBuf::from))
        .ok_or(CliError::MissingImage)?;
    let output_path = output
        .map(Path::to_path_buf)
        .or_else(|| config.output.as_ref().map(PathBuf::from));

    let pipeline = Pipeline::from_parameters(&params)?;
    info!("Counting colonies in {:?}", image_path);
    info!("{}", pipeline.info());

    let result = pipeline.process_file(&image_path)?;
    info!(
        "Accepted {} of {} contours",
        result.count,
        result.records.len()
    );
    if result.count == 0 {
        warn!("No colonies found; check the area band and threshold parameters");
    }

    if let Some(path) = output_path {
        result.annotated.save(&path)?;
        info!("Annotated image saved to {:?}", path);
    }

    if json {
        println!("{}", result.report().to_json()?);
    } else {
        println!("{}", result.count);
    }

    Ok(())
}
