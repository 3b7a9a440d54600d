//! Authentication gateway.
//!
//! Delegates identity verification to Google OAuth, keeps a server-side
//! session, gates routes on registration completion, and optionally relays
//! verified identities to a backend of record.

use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
mod handlers;
pub mod relay;
pub mod routes;
pub mod session;

pub use config::{Environment, GatewayConfig};
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use relay::{BackendRelay, HttpBackendRelay};
pub use routes::create_router;
pub use session::{InMemorySessionStore, SessionStore};

use auth::provider::{GoogleProvider, IdentityProvider};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub directory: Arc<dyn UserDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub provider: Arc<dyn IdentityProvider>,
    /// Present only when a backend of record is configured.
    pub relay: Option<Arc<dyn BackendRelay>>,
}

impl AppState {
    /// Wire up the in-memory stores and the real Google and relay clients.
    pub fn from_config(config: GatewayConfig) -> Self {
        let relay = config.backend_url.as_deref().map(|url| {
            Arc::new(HttpBackendRelay::new(url, config.relay_timeout())) as Arc<dyn BackendRelay>
        });

        Self {
            directory: Arc::new(InMemoryUserDirectory::new()),
            sessions: Arc::new(InMemorySessionStore::new(config.session_ttl())),
            provider: Arc::new(GoogleProvider::from_config(&config)),
            relay,
            config: Arc::new(config),
        }
    }

    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_relay(mut self, relay: Option<Arc<dyn BackendRelay>>) -> Self {
        self.relay = relay;
        self
    }

    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }
}
