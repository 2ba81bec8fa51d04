use clap::{Parser, Subcommand};
use std::error::Error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod integrations;
mod models;
mod notes;
mod notify;
mod reconcile;
mod settings;
mod storage;
mod sync;
mod ui;

use crate::config::{Config, config_path};
use crate::integrations::readeck::ReadeckClient;
use crate::notify::ConsoleNotifier;
use crate::settings::SettingsForm;
use crate::storage::VaultStorage;
use crate::sync::{SyncDriver, SyncOptions};

#[derive(Debug, Parser)]
#[command(name = "readeck-sync", version, about = "Sync Readeck annotations into markdown notes")]
struct Cli {
    /// Log progress to stderr (repeat for debug output).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch bookmarks and merge new annotations into notes.
    Sync {
        /// Report what would change without writing any note.
        #[arg(long)]
        dry_run: bool,
        /// Open the notes folder when the sync is done.
        #[arg(long)]
        open: bool,
    },
    /// Edit the Readeck API URL and token.
    Settings,
    /// Show the config file location and current settings.
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Sync {
        dry_run: false,
        open: false,
    });
    match run(command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("readeck_sync={default_level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> Result<ExitCode, Box<dyn Error>> {
    let mut config = Config::load();

    match command {
        Commands::Sync { dry_run, open } => run_sync(&config, dry_run, open),
        Commands::Settings => {
            let mut form = SettingsForm::new(&config.readeck);
            if ui::run_settings_editor(&mut form)? && form.apply(&mut config.readeck) {
                let path = config_path();
                config.save_to_path(&path)?;
                println!("Saved settings to {}", path.display());
            } else {
                println!("Settings unchanged.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config => {
            println!("config: {}", config_path().display());
            println!("api_url: {}", config.readeck.api_url);
            println!("api_token: {}", config.readeck.masked_token());
            println!("timeout_seconds: {}", config.readeck.timeout_seconds);
            println!("vault: {}", config.vault.path.display());
            println!("folder: {}", config.vault.folder);
            println!("workers: {}", config.sync.workers);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_sync(config: &Config, dry_run: bool, open_folder: bool) -> Result<ExitCode, Box<dyn Error>> {
    let client = ReadeckClient::new(&config.readeck)?;
    let storage = VaultStorage::new(&config.vault.path);
    let notifier = ConsoleNotifier;
    let options = SyncOptions::from_config(config, dry_run);

    let report = SyncDriver::new(&client, &storage, &notifier, options).run()?;

    println!("{}", report.summary());

    if open_folder && !dry_run {
        let folder = storage.resolve(&config.vault.folder);
        if let Err(err) = open::that(&folder) {
            tracing::warn!(path = %folder.display(), error = %err, "failed to open notes folder");
        }
    }

    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
