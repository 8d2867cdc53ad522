use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use tokio::sync::mpsc;

use reel::app::{App, AppEvent, View};
use reel::catalog::{build_http_client, CatalogClient};
use reel::config::{Config, API_KEY_ENV};
use reel::favorites::FavoritesStore;
use reel::keybindings::KeybindingRegistry;
use reel::storage::{Database, DatabaseError};
use reel::ui;

/// Get the config directory path (~/.config/reel/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("reel"))
}

/// Route tracing output to a log file; the TUI owns stdout.
fn init_logging(config_dir: &std::path::Path) -> Result<()> {
    let log_path = config_dir.join("reel.log");
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "reel", about = "Browse popular movies and keep a list of favorites")]
struct Args {
    /// Config file (default: ~/.config/reel/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Start in the favorites view
    #[arg(long)]
    favorites: bool,

    /// Forget every favorite before starting
    #[arg(long)]
    reset_favorites: bool,

    /// Reset database (delete and recreate)
    #[arg(long)]
    reset_db: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    // Config directory holds the API key and favorites: user-only access
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            eprintln!(
                "Warning: failed to restrict permissions on {}: {}",
                config_dir.display(),
                e
            );
        }
    }

    init_logging(&config_dir)?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_env_override(std::env::var(API_KEY_ENV).ok());
    tracing::debug!(?config, "Effective configuration");

    let Some(api_key) = config.api_key.clone() else {
        eprintln!("Error: no catalog API key configured.");
        eprintln!();
        eprintln!("Set the {} environment variable, or add", API_KEY_ENV);
        eprintln!("  api_key = \"...\"");
        eprintln!("to {}", config_path.display());
        std::process::exit(1);
    };

    let mut keybindings = KeybindingRegistry::new();
    for warning in keybindings.apply_overrides(&config.keybindings) {
        tracing::warn!("{}", warning);
        eprintln!("Warning: {}", warning);
    }

    let db_path = config_dir.join("reel.db");
    if args.reset_db && Database::remove_files(&db_path).context("Failed to delete database")? {
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of reel appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let favorites = FavoritesStore::load(db.clone()).await;
    if args.reset_favorites {
        favorites
            .clear()
            .await
            .context("Failed to reset favorites")?;
        println!("Favorites cleared.");
    }

    let http = build_http_client(config.request_timeout()).context("Failed to build HTTP client")?;
    let catalog = CatalogClient::new(
        http,
        &config.catalog_base_url,
        SecretString::from(api_key),
    )?;

    let mut app = App::new(
        catalog,
        favorites,
        keybindings,
        config.favorites_concurrency,
    );

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);

    if args.favorites {
        app.view = View::Favorites;
        ui::spawn_favorites_load(&mut app, &event_tx);
    }

    tracing::info!(favorites = app.favorites.len(), "Starting reel");
    let result = ui::run(&mut app, event_tx, event_rx).await;
    db.close().await;
    result
}
