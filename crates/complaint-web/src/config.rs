//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use database::TransitionPolicy;

/// Credentials for an administrator created at startup when absent.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Directory for complaint attachments.
    pub upload_dir: PathBuf,
    /// Request body limit for complaint submissions.
    pub max_upload_bytes: usize,
    /// HMAC secret for session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in hours.
    pub token_ttl_hours: i64,
    /// Which status changes are accepted.
    pub transition_policy: TransitionPolicy,
    /// Optional first administrator.
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `COMPLAINTS_ADDR` | Server bind address | `127.0.0.1:5000` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:complaints.db?mode=rwc` |
    /// | `UPLOAD_DIR` | Attachment directory | `uploads` |
    /// | `MAX_UPLOAD_BYTES` | Submission body limit | `10485760` |
    /// | `JWT_SECRET` | Token signing secret | (required) |
    /// | `TOKEN_TTL_HOURS` | Token lifetime | `24` |
    /// | `TRANSITION_POLICY` | `open` or `guarded` | `open` |
    /// | `BOOTSTRAP_ADMIN_EMAIL` | First admin email | (unset) |
    /// | `BOOTSTRAP_ADMIN_PASSWORD` | First admin password | (unset) |
    /// | `BOOTSTRAP_ADMIN_NAME` | First admin name | `Administrator` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("COMPLAINTS_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH")
            .unwrap_or_else(|_| "sqlite:complaints.db?mode=rwc".to_string());

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?;

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingJwtSecret)?;

        let token_ttl_hours = parse_var("TOKEN_TTL_HOURS", 24)?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                var: "TOKEN_TTL_HOURS",
                reason: "must be positive".to_string(),
            });
        }

        let transition_policy = match env::var("TRANSITION_POLICY") {
            Ok(value) => value.parse().map_err(|e: database::ValidationError| {
                ConfigError::Invalid {
                    var: "TRANSITION_POLICY",
                    reason: e.to_string(),
                }
            })?,
            Err(_) => TransitionPolicy::default(),
        };

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin {
                name: env::var("BOOTSTRAP_ADMIN_NAME")
                    .unwrap_or_else(|_| "Administrator".to_string()),
                email,
                password,
            }),
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => return Err(ConfigError::IncompleteBootstrapAdmin),
            (Err(_), Err(_)) => None,
        };

        Ok(Self {
            addr,
            database_url,
            upload_dir,
            max_upload_bytes,
            jwt_secret,
            token_ttl_hours,
            transition_policy,
            bootstrap_admin,
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            reason: format!("could not parse '{}'", value),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid COMPLAINTS_ADDR format")]
    InvalidAddr,

    #[error("JWT_SECRET environment variable is required")]
    MissingJwtSecret,

    #[error("BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together")]
    IncompleteBootstrapAdmin,

    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
