//! Auth-related types.

use serde::{Deserialize, Serialize};
use shared_types::UserRecord;

/// Profile payload delivered by the identity provider after a grant exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderProfile {
    pub id: String,
    pub emails: Vec<ProfileEmail>,
    pub display_name: Option<String>,
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEmail {
    pub value: String,
    pub verified: bool,
}

/// Result of exchanging an authorization code with the provider.
#[derive(Debug, Clone)]
pub struct ProviderGrant {
    pub access_token: String,
    pub profile: ProviderProfile,
}

/// Canonical identity extracted from a provider profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaim {
    pub provider_id: String,
    pub email: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    pub access_token: String,
}

/// The authenticated principal produced at callback time.
///
/// `is_new_user` is computed at the moment of authentication and is not
/// persisted anywhere.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    pub user: UserRecord,
    pub is_new_user: bool,
}

/// Claims signed into the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (provider id)
    pub sub: String,
    /// Server-side session id
    pub sid: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}
