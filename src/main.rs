use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use clear_stac::error::Error;
use clear_stac::image_request::RequestBuilder;
use clear_stac::pipeline::{self, ImageOrder};
use clear_stac::sentinel_hub::{Credentials, Provider};
use clear_stac::settings::Settings;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Download the least cloudy Sentinel-2 image of an area")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check Sentinel Hub credentials.
    Authenticate {
        /// Client ID
        id: String,
        /// Client secret
        secret: String,
        /// Settings file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Download the least cloudy Sentinel-2 image.
    RequestImage(RequestImageArgs),
}

#[derive(Args)]
struct RequestImageArgs {
    /// Area of interest as x1,y1,x2,y2 in degrees, e.g. 16.46,46.75,16.57,46.85
    #[arg(allow_hyphen_values = true)]
    aoi: String,

    /// Time of interest as start,end ISO dates, e.g. 2024-05-01,2024-05-20
    toi: String,

    /// Image processing type: visual or ndvi
    #[arg(short = 't', long = "type", default_value = "visual")]
    output_type: String,

    /// Image output format: png or tiff
    #[arg(short = 'f', long = "format", default_value = "png")]
    output_format: String,

    /// Read credentials from CLIENT_ID and CLIENT_SECRET instead of prompting
    #[arg(long)]
    env: bool,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for downloaded images, overrides the settings file
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Also write the request as JSON next to the image
    #[arg(long)]
    plan: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Authenticate { id, secret, config } => authenticate(id, secret, config).await,
        Command::RequestImage(args) => request_image(args).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            println!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "clear_stac=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::read(&path)
            .with_context(|| format!("Unable to read settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

async fn authenticate(id: String, secret: String, config: Option<PathBuf>) -> Result<ExitCode> {
    let provider = Provider::new(Credentials::new(id, secret), load_settings(config)?);
    match provider.authenticate().await {
        Ok(_) => {
            println!("Authenticated.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_authentication() => {
            println!("Wrong credentials. Try again.");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.into()),
    }
}

async fn request_image(args: RequestImageArgs) -> Result<ExitCode> {
    let order = match ImageOrder::parse(&args.aoi, &args.toi, &args.output_type, &args.output_format)
    {
        Ok(order) => order,
        Err(e @ Error::Validation(_)) => {
            println!("Input validation failed: {e}\nSee help for input hints.");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => {
            println!("{e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    let credentials = if args.env {
        credentials_from_env()?
    } else {
        prompt_credentials()?
    };

    let mut settings = load_settings(args.config)?;
    if let Some(output_dir) = args.output_dir {
        settings.output_dir = output_dir;
    }
    let builder = RequestBuilder::new(settings.process_options());
    let output_dir = settings.output_dir.clone();
    let provider = Provider::new(credentials, settings);

    let download =
        match pipeline::request_image(&provider, &provider, &builder, &output_dir, &order).await {
            Ok(Some(download)) => download,
            Ok(None) => {
                println!("No image found.");
                return Ok(ExitCode::SUCCESS);
            }
            Err(e) if e.is_authentication() => {
                println!("Client authentication failed. Check your credentials.");
                return Ok(ExitCode::FAILURE);
            }
            Err(e @ Error::InvalidDimensions { .. }) => {
                println!("{e}. Choose a smaller area of interest.");
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        };

    let scene = &download.plan.scene;
    println!("Scene:       {}", scene.id);
    println!("Acquired:    {}", scene.datetime);
    println!("Cloud cover: {:.2}%", scene.cloud_cover);

    if args.plan {
        let plan_path = pipeline::plan_path(download.path());
        download.plan.write(&plan_path)?;
        println!("Plan:        {}", plan_path.display());
    }

    if download.fetched {
        println!("Downloaded:  {}", download.path().display());
    } else {
        println!("Already downloaded: {}", download.path().display());
    }
    Ok(ExitCode::SUCCESS)
}

fn credentials_from_env() -> Result<Credentials> {
    let id = std::env::var("CLIENT_ID").context("CLIENT_ID is not set")?;
    let secret = std::env::var("CLIENT_SECRET").context("CLIENT_SECRET is not set")?;
    Ok(Credentials::new(id, secret))
}

fn prompt_credentials() -> Result<Credentials> {
    print!("Your Sentinel Hub Client ID: ");
    io::stdout().flush()?;
    let mut id = String::new();
    io::stdin().read_line(&mut id)?;
    let secret = rpassword::prompt_password("Your Sentinel Hub Client Secret: ")?;
    Ok(Credentials::new(id.trim(), secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_request_image_defaults() {
        let cli = Cli::parse_from([
            "clear-stac",
            "request-image",
            "-58.5,-34.7,-58.3,-34.5",
            "2024-05-01,2024-05-20",
        ]);
        let Command::RequestImage(args) = cli.command else {
            panic!("expected request-image");
        };
        assert_eq!(args.aoi, "-58.5,-34.7,-58.3,-34.5");
        assert_eq!(args.output_type, "visual");
        assert_eq!(args.output_format, "png");
        assert!(!args.env);
    }

    #[test]
    fn test_request_image_options() {
        let cli = Cli::parse_from([
            "clear-stac",
            "request-image",
            "16.46,46.75,16.57,46.85",
            "2024-05-01,2024-05-20",
            "-t",
            "ndvi",
            "--format",
            "tiff",
            "--env",
        ]);
        let Command::RequestImage(args) = cli.command else {
            panic!("expected request-image");
        };
        assert_eq!(args.output_type, "ndvi");
        assert_eq!(args.output_format, "tiff");
        assert!(args.env);
    }
}
