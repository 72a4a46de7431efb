//! sitesync CLI
//!
//! Local and CI entry point. Stage behavior comes from `sitesync.toml` and
//! the environment (optionally a `.env` file).

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sitesync::{
    error::Result,
    models::{Config, EntityKind, ImageMode, SyncSettings, load_dotenv},
    pipeline,
    services::{DRIVE_SCOPE, GoogleSheetsClient, ImageMirror, SHEETS_SCOPE, authorize},
    storage::LocalStorage,
    utils::http,
};

/// sitesync - Google Sheets to static site content
#[derive(Parser, Debug)]
#[command(
    name = "sitesync",
    version,
    about = "Sync spreadsheet data and generate site content"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "sitesync.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch configured sheets and write data files
    Sync,

    /// Generate member, group and project pages
    Generate {
        #[arg(value_enum, default_value_t = Target::All)]
        target: Target,
    },

    /// Check build output for minification
    Audit,

    /// Run full pipeline: Sync → Generate → Audit
    Pipeline,

    /// Validate configuration and credentials
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Target {
    Members,
    Groups,
    Projects,
    All,
}

impl Target {
    fn kinds(self) -> Vec<EntityKind> {
        match self {
            Target::Members => vec![EntityKind::Member],
            Target::Groups => vec![EntityKind::Group],
            Target::Projects => vec![EntityKind::Project],
            Target::All => EntityKind::ALL.to_vec(),
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Remote collaborators of a sync run.
struct Remote {
    sheets: GoogleSheetsClient,
    mirror: Option<ImageMirror>,
}

/// Authorize against Google and build the sheet client and image mirror.
async fn connect(config: &Config, settings: &SyncSettings) -> Result<Remote> {
    let client = http::create_client(&config.http)?;
    let token = authorize(&client, &settings.credentials, &[SHEETS_SCOPE, DRIVE_SCOPE]).await?;

    let mirror = (config.sync.image_mode == ImageMode::Mirror).then(|| {
        ImageMirror::new(
            client.clone(),
            Some(token.access_token.clone()),
            config.paths.clone(),
            config.images.clone(),
        )
    });
    let sheets = GoogleSheetsClient::new(client, token.access_token, &settings.application_name);

    Ok(Remote { sheets, mirror })
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    let storage = LocalStorage::new(".", &config.paths.data_dir);

    match cli.command {
        Command::Sync => {
            load_dotenv();
            let settings = SyncSettings::from_env(&config.sync.default_image_column)?;
            let remote = connect(&config, &settings).await?;
            pipeline::run_sync(
                &config,
                &settings,
                &remote.sheets,
                &storage,
                remote.mirror.as_ref(),
            )
            .await?;
        }

        Command::Generate { target } => {
            pipeline::run_generate(&config, &storage, &target.kinds()).await?;
        }

        Command::Audit => {
            pipeline::run_audit(&config)?;
        }

        Command::Pipeline => {
            load_dotenv();
            let settings = SyncSettings::from_env(&config.sync.default_image_column)?;
            let remote = connect(&config, &settings).await?;
            pipeline::run_pipeline(
                &config,
                &settings,
                &remote.sheets,
                &storage,
                remote.mirror.as_ref(),
            )
            .await?;
        }

        Command::Validate => {
            // Parse errors are reported here instead of falling back to defaults
            let config = if cli.config.exists() {
                Config::load(&cli.config)?
            } else {
                log::warn!("No config file at {}. Checking defaults.", cli.config.display());
                config
            };
            load_dotenv();
            let settings = SyncSettings::from_env(&config.sync.default_image_column)?;
            pipeline::run_validate(&config, &settings)?;
        }
    }

    Ok(())
}
