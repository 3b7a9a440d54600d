//! Gateway configuration, read from command-line flags with environment
//! variable fallbacks. `.env` files are loaded by `main` before parsing.

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Development,
    Production,
    Test,
}

#[derive(Clone, Parser)]
#[command(name = "gateway")]
#[command(about = "Authentication gateway delegating login to Google OAuth")]
pub struct GatewayConfig {
    /// Google OAuth client ID.
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: String,

    /// Google OAuth client secret.
    #[arg(long, env = "GOOGLE_CLIENT_SECRET", hide_env_values = true)]
    pub google_client_secret: String,

    /// Redirect URI registered with Google for the login callback.
    #[arg(
        long,
        env = "GOOGLE_CALLBACK_URL",
        default_value = "http://localhost:3001/auth/google/callback"
    )]
    pub google_callback_url: String,

    /// Secret used to sign session cookies.
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub session_secret: String,

    /// Frontend origin that callback redirects point at.
    #[arg(long, env = "FRONTEND_URL", default_value = "http://localhost:3000")]
    pub frontend_url: String,

    /// Backend of record. When set, every login is relayed to it.
    #[arg(long, env = "BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Timeout for the backend relay call, in seconds.
    #[arg(long, env = "RELAY_TIMEOUT_SECS", default_value_t = 10)]
    pub relay_timeout_secs: u64,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Deployment environment.
    #[arg(long, env = "RUST_ENV", value_enum, default_value = "development")]
    pub environment: Environment,

    /// Session lifetime in hours, at most one year.
    #[arg(
        long,
        env = "SESSION_TTL_HOURS",
        default_value_t = 24,
        value_parser = clap::value_parser!(i64).range(1..=8760)
    )]
    pub session_ttl_hours: i64,
}

impl GatewayConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Frontend origin without a trailing slash.
    pub fn frontend_base(&self) -> &str {
        self.frontend_url.trim_end_matches('/')
    }

    pub fn relay_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.relay_timeout_secs)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}
