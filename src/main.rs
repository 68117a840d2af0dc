use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use templo::config::ServerConfig;
use templo::server::{AppState, create_router};
use templo::setup::initialize_admin;
use templo::store::{SqliteStore, Store};

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "templo")]
#[command(about = "A gated grimoire and course server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database, admin user and admin token)
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Email of the admin user
        #[arg(long)]
        email: Option<String>,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },
}

fn prompt_email() -> anyhow::Result<String> {
    let email = inquire::Text::new("Admin email:")
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Email cannot be empty".into())
            } else if !input.contains('@') {
                Err("Email must contain '@'".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;
    Ok(email)
}

fn run_init(data_dir: PathBuf, email: Option<String>, non_interactive: bool) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir,
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.has_admin_user()? {
        bail!(
            "Server already initialized. Admin token was written to: {}",
            token_file.display()
        );
    }

    let email = match email {
        Some(email) => email,
        None if non_interactive => bail!("--email is required with --non-interactive"),
        None => prompt_email()?,
    };

    let (user, raw_token) = initialize_admin(&store, &email)?;

    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin user: {} ({})", user.email, user.id);
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    Ok(())
}

fn load_config(
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match config {
        Some(path) => ServerConfig::from_file(&path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("templo=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                email,
                non_interactive,
            } => {
                run_init(data_dir, email, non_interactive)?;
            }
        },
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let config = load_config(config, host, port, data_dir)?;

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;
            if !store.has_admin_user()? {
                bail!(
                    "Server not initialized. Run 'templo admin init' first to create the database and admin user."
                );
            }

            info!(
                threshold = config.unlock_threshold,
                words_per_minute = config.words_per_minute,
                "Loaded configuration"
            );

            let state = Arc::new(AppState::new(Arc::new(store), &config));

            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
