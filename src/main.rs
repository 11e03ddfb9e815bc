use std::net::SocketAddr;
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use comfy_table::{modifiers, presets, ContentArrangement, Table};
use terminal_size::{terminal_size, Width};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use bosun::auth::password::hash_password;
use bosun::config::{self, Config, DEFAULT_PBKDF2_ITERATIONS, FALLBACK_API_BASE_URL};
use bosun::models::{Role, SharedState};
use bosun::routes::build_router;
use bosun::store::{normalize_username, UserStore};
use bosun::upstream::{regions, Upstream};

// Embedded so the binary works without any files next to it.
const DEFAULT_STYLESHEET: &str = include_str!("../static/styles.css");

#[derive(Parser)]
#[command(
    name = "bosun",
    author,
    version,
    about = "Operator console for provisioning compute instances",
    long_about = r#"bosun — a small operator console for a Cloudzy-style provisioning API.

One binary serves the web UI plus a handful of maintenance commands: run the
server, validate configuration, and manage the local account store. API
credentials come from environment variables or an `--env-file`.

Examples:
  1) Run the console (dev):
      bosun serve --host 127.0.0.1 --port 8080
  2) Validate credentials against the API:
      bosun check-config
  3) Manage console accounts:
      bosun users list
      bosun users add alice s3cret admin
"#,
    after_help = "Use `bosun <subcommand> --help` for subcommand specific options."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// Disable colorized output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web console
    Serve {
        /// Host to bind to (defaults to $HOST, then 127.0.0.1)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind to (defaults to $PORT, then 8080)
        #[arg(long)]
        port: Option<u16>,
        /// Path to .env file
        #[arg(long)]
        env_file: Option<String>,
        /// Path to a custom stylesheet served instead of the embedded one
        #[arg(long)]
        stylesheet: Option<String>,
    },
    /// Validate configuration (env vars / API credentials)
    #[command(
        about = "Validate configuration and API connectivity.",
        long_about = "Check the environment variables the server needs, then validate the API token by fetching the region catalog from the remote API."
    )]
    CheckConfig { env_file: Option<String> },
    /// Manage console accounts (users.json)
    Users {
        #[command(subcommand)]
        sub: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    #[command(
        about = "List console accounts",
        long_about = "Enumerate the accounts in the user store (username, role, assigned instances)."
    )]
    List,
    #[command(
        about = "Add an account",
        long_about = "Add an account with a role (owner|admin). The password is hashed before it is stored."
    )]
    Add {
        username: String,
        password: String,
        role: String,
    },
    #[command(
        about = "Reset an account's password",
        long_about = "Set a new password for an existing account; the password is hashed before it is stored."
    )]
    ResetPassword { username: String, password: String },
}

fn open_store(config: &Config) -> UserStore {
    match UserStore::open(Path::new(&config.users_file)) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!(%error, "could not open the user store");
            eprintln!(
                "{}: {}",
                yansi::Paint::new("Could not open the user store").red(),
                error
            );
            process::exit(1);
        }
    }
}

async fn start_server(
    config: Config,
    store: UserStore,
    host: Option<String>,
    port: Option<u16>,
    stylesheet: Option<String>,
) {
    let css = match stylesheet {
        Some(path) => match std::fs::read_to_string(&path) {
            Ok(css) => {
                tracing::info!(%path, "loaded custom stylesheet");
                css
            }
            Err(error) => {
                tracing::error!(%error, "failed to read custom stylesheet");
                eprintln!(
                    "{} {}: {}",
                    yansi::Paint::red("Failed to read custom stylesheet at"),
                    path,
                    error
                );
                process::exit(1);
            }
        },
        None => DEFAULT_STYLESHEET.to_string(),
    };

    let host = host.unwrap_or_else(|| config.host.clone());
    let port = port.unwrap_or(config.port);
    let addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(error) => {
            tracing::error!(%error, "invalid host/port");
            eprintln!(
                "{}: {}",
                yansi::Paint::new("Invalid host/port format").red(),
                error
            );
            process::exit(1);
        }
    };

    let state = SharedState::new(&config, store);
    let app = build_router(state, css);
    tracing::info!(%addr, api = %config.api_base_url, "starting bosun");
    println!(
        "{} {}",
        yansi::Paint::new("Console listening on").green(),
        yansi::Paint::new(format!("http://{addr}")).cyan()
    );
    if !config.public_base_url.is_empty() {
        println!(
            "{} {}",
            yansi::Paint::new("Public URL:").green(),
            yansi::Paint::new(config.public_base_url.as_str()).cyan()
        );
    }
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(error) = axum::serve(listener, app).await {
                tracing::error!(%error, "server stopped with an error");
                eprintln!("{}: {}", yansi::Paint::new("Server error").red(), error);
                process::exit(1);
            }
        }
        Err(error) => {
            tracing::error!(%error, "failed to bind; is the port already in use?");
            eprintln!(
                "{}: {}\n{}",
                yansi::Paint::new(format!("Failed to bind to {addr}")).red(),
                error,
                yansi::Paint::new(
                    "Stop the process using this port, or start with a different --port value."
                )
                .yellow()
            );
            process::exit(1);
        }
    }
}

async fn check_config(env_file: Option<&str>) {
    config::load_env_file(env_file);
    let config = Config::from_env();

    if config.api_token.trim().is_empty() {
        eprintln!("{}", yansi::Paint::new("API_TOKEN is not configured").red());
        process::exit(1);
    }
    if config.api_base_url == FALLBACK_API_BASE_URL {
        println!(
            "{}",
            yansi::Paint::new(format!(
                "API_BASE_URL is not set; using the development fallback {FALLBACK_API_BASE_URL}"
            ))
            .yellow()
        );
    }

    let upstream = Upstream::new(
        &config.api_base_url,
        &config.api_token,
        config.upstream_timeout,
        config.customer_id.clone(),
    );
    match regions::list(&upstream).await {
        Ok(list) => {
            println!(
                "{}",
                yansi::Paint::new(format!(
                    "Configuration looks valid ({} regions returned)",
                    list.len()
                ))
                .green()
            );
        }
        Err(error) => {
            eprintln!(
                "{}: {}",
                yansi::Paint::new("Configuration appears invalid").red(),
                error.detail()
            );
            process::exit(1);
        }
    }
}

fn run_user_command(store: &UserStore, sub: UserCommands) {
    match sub {
        UserCommands::List => {
            let mut table = Table::new();
            table.load_preset(presets::UTF8_FULL);
            table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);
            table.set_content_arrangement(ContentArrangement::Dynamic);
            if let Some((Width(w), _)) = terminal_size() {
                table.set_width(w.saturating_sub(4));
            }
            table.set_header(vec!["Username", "Role", "Assigned instances"]);
            for (username, record) in store.all() {
                let assigned = record.assigned_instances.join(", ");
                table.add_row(vec![
                    username,
                    record.role.as_str().to_string(),
                    assigned,
                ]);
            }
            println!("\n{table}\n");
        }
        UserCommands::Add {
            username,
            password,
            role,
        } => {
            let Some(role) = Role::parse(&role) else {
                eprintln!(
                    "{}",
                    yansi::Paint::new("Role must be 'owner' or 'admin'").red()
                );
                process::exit(1);
            };
            if password.is_empty() {
                eprintln!("{}", yansi::Paint::new("Password must not be empty").red());
                process::exit(1);
            }
            let hash = hash_password(&password, DEFAULT_PBKDF2_ITERATIONS);
            match store.create(&username, hash, role) {
                Ok(()) => println!(
                    "{} '{}' {}",
                    yansi::Paint::new("User").green(),
                    normalize_username(&username),
                    yansi::Paint::new("added").green()
                ),
                Err(error) => {
                    eprintln!("{}", yansi::Paint::new(error.to_string()).red());
                    process::exit(1);
                }
            }
        }
        UserCommands::ResetPassword { username, password } => {
            if password.is_empty() {
                eprintln!("{}", yansi::Paint::new("Password must not be empty").red());
                process::exit(1);
            }
            let hash = hash_password(&password, DEFAULT_PBKDF2_ITERATIONS);
            match store.set_password_hash(&username, hash) {
                Ok(()) => println!(
                    "{} '{}' {}",
                    yansi::Paint::new("Password for").green(),
                    normalize_username(&username),
                    yansi::Paint::new("updated").green()
                ),
                Err(error) => {
                    eprintln!("{}", yansi::Paint::new(error.to_string()).red());
                    process::exit(1);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        yansi::whenever(yansi::Condition::NEVER);
    }

    match cli.command {
        // Bare `bosun` serves with environment defaults.
        None => {
            config::load_env_file(None);
            let config = Config::from_env();
            let store = open_store(&config);
            start_server(config, store, None, None, None).await;
        }
        Some(Commands::Serve {
            host,
            port,
            env_file,
            stylesheet,
        }) => {
            config::load_env_file(env_file.as_deref());
            let config = Config::from_env();
            let store = open_store(&config);
            start_server(config, store, host, port, stylesheet).await;
        }
        Some(Commands::CheckConfig { env_file }) => {
            check_config(env_file.as_deref()).await;
        }
        Some(Commands::Users { sub }) => {
            config::load_env_file(None);
            let config = Config::from_env();
            let store = open_store(&config);
            run_user_command(&store, sub);
        }
    }
}
