use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod admin;
mod api;
mod auth;
mod booking;
mod catalog;
mod commands;
mod config;
mod events;
mod login;
mod profile;
mod shell;
mod storage;
mod tui;

use admin::AdminTab;
use api::ApiClient;
use auth::AuthService;
use events::EventBus;
use shell::{Services, ShellSettings};
use storage::CredentialStore;

const LOG_FILE: &str = "cinema.log";

#[derive(Parser)]
#[command(name = "cinema")]
#[command(about = "Browse the cinema schedule and book seats from the terminal")]
#[command(version)]
struct Cli {
    /// API base URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    /// Bearer token (replaces the stored one)
    #[arg(long)]
    token: Option<String>,

    /// Credential file to use instead of the default one
    #[arg(long)]
    credentials: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Log in to the cinema API
    Login {
        #[arg(short, long)]
        username: Option<String>,
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and log in
    Register,
    /// Forget stored credentials
    Logout,
    /// Show current login status
    Whoami,
    /// Check that the API is up
    Health,
    /// List movies
    Movies,
    /// Show one movie
    Movie {
        id: i64,
    },
    /// List upcoming sessions
    Sessions,
    /// List cinemas
    Cinemas,
    /// Show the seat map of a session
    Seats {
        session: i64,
    },
    /// Book seats for a session
    Book {
        session: i64,
        #[arg(required = true)]
        seats: Vec<u32>,
    },
    /// List your tickets
    Tickets,
    /// Admin dashboard data
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (base_url, timeout_secs, page_limit, toast_secs, sessions_shown, seed_demo)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Totals and revenue
    Stats,
    /// All tickets
    Tickets,
    /// All users
    Users,
}

/// The terminal UI owns the screen, so it logs to a file in the cache dir
fn init_tracing(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "cinema=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if !interactive {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
        return;
    }

    match open_log_file() {
        Ok(file) => registry
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .init(),
        Err(e) => {
            registry.with(fmt::layer().with_writer(std::io::stderr)).init();
            tracing::warn!("Cannot open log file, logging to stderr: {}", e);
        }
    }
}

fn open_log_file() -> Result<std::fs::File> {
    let dirs = config::project_dirs()?;
    let cache_dir = dirs.cache_dir();
    std::fs::create_dir_all(cache_dir)?;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(cache_dir.join(LOG_FILE))?;
    Ok(file)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.command.is_none());

    if let Some(Commands::Config { action }) = cli.command {
        return handle_config_command(action);
    }

    let mut config = config::Config::load()?;
    if let Some(server) = cli.server {
        config.set("base_url", &server)?;
    }

    let store = Arc::new(match cli.credentials {
        Some(path) => CredentialStore::open(path),
        None => CredentialStore::default_location()?,
    });
    if let Some(token) = cli.token {
        tracing::info!("Using token from the command line");
        store.set_token(&token)?;
    }
    let events = EventBus::new();
    let api = ApiClient::new(&config.api.base_url, config.timeout(), store.clone(), events.clone())?
        .with_page_limit(config.api.page_limit);
    let auth = AuthService::new(store, events);

    let Some(command) = cli.command else {
        tracing::info!("Starting terminal UI against {}", api.base_url());
        let services = Services {
            api,
            auth,
            settings: ShellSettings::from(&config),
        };
        let mut app = tui::App::new(services);
        app.run()?;
        return Ok(());
    };

    match command {
        Commands::Config { .. } => {}
        Commands::Login { username, password } => {
            auth::login(&api, username, password).await?;
        }
        Commands::Register => {
            auth::register(&api).await?;
        }
        Commands::Logout => auth::logout(&auth)?,
        Commands::Whoami => auth::whoami(&api, &auth).await?,
        Commands::Health => commands::health(&api).await?,
        Commands::Movies => commands::movies(&api).await?,
        Commands::Movie { id } => commands::movie(&api, id).await?,
        Commands::Sessions => commands::sessions(&api).await?,
        Commands::Cinemas => commands::cinemas(&api).await?,
        Commands::Seats { session } => commands::seats(&api, session).await?,
        Commands::Book { session, seats } => commands::book(&api, &auth, session, &seats).await?,
        Commands::Tickets => commands::tickets(&api).await?,
        Commands::Admin { action } => {
            let tab = match action {
                AdminAction::Stats => AdminTab::Stats,
                AdminAction::Tickets => AdminTab::Tickets,
                AdminAction::Users => AdminTab::Users,
            };
            commands::admin(&api, &auth, tab).await?
        }
    }

    Ok(())
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = config::Config::load().unwrap_or_default();
            config.set(&key, &value)?;
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let config = config::Config::load()?;
            println!("{}", config.get(&key)?);
        }
        ConfigAction::Show => {
            let config = config::Config::load()?;
            for key in [
                "base_url",
                "timeout_secs",
                "page_limit",
                "toast_secs",
                "sessions_shown",
                "seed_demo",
            ] {
                println!("{}: {}", key, config.get(key)?);
            }
        }
        ConfigAction::Path => {
            let path = config::Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
