use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Default configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_USERS_FILE: &str = "users.json";
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OWNER_USERNAME: &str = "owner";
pub const DEFAULT_OWNER_PASSWORD: &str = "owner123";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Fallback when no API base URL is configured. Matches the local
/// development provisioning API the console grew up against.
pub const FALLBACK_API_BASE_URL: &str = "http://localhost:5000";

/// Load environment variables from a dotenv file. An explicit path wins;
/// otherwise `.env` in the working directory is used when present.
pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

/// Trim whitespace and trailing slashes from a base URL. Empty input
/// falls back to the local development API.
pub fn sanitize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        FALLBACK_API_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn get_api_base_url() -> String {
    sanitize_base_url(&env::var("API_BASE_URL").unwrap_or_default())
}

pub fn get_api_token() -> String {
    env::var("API_TOKEN").unwrap_or_default()
}

/// Host (and port, if any) of a URL, for display in the page header so
/// operators can see which provisioning API they are pointed at.
pub fn host_of(url: &str) -> String {
    let s = url.trim();
    let s = match s.find("://") {
        Some(idx) => &s[idx + 3..],
        None => s,
    };
    s.split('/').next().unwrap_or(s).to_string()
}

/// Runtime settings resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base URL of the provisioning API, sanitized (no trailing slash).
    pub api_base_url: String,
    pub api_token: String,
    /// External URL the console is reachable at (behind a proxy),
    /// echoed in the startup banner. Empty when unset.
    pub public_base_url: String,
    pub users_file: PathBuf,
    /// Optional customerId forwarded to the ssh-key endpoints for
    /// provider accounts that scope keys per customer.
    pub customer_id: Option<String>,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or_default();
        let users_file = env::var("USERS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_USERS_FILE));
        let customer_id = env::var("UPSTREAM_CUSTOMER_ID")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let upstream_timeout = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS));

        Config {
            host,
            port,
            api_base_url: get_api_base_url(),
            api_token: get_api_token(),
            public_base_url,
            users_file,
            customer_id,
            upstream_timeout,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
