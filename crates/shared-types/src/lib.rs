use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user known to the gateway, keyed by the identity provider's stable id.
///
/// Records live only in process memory. They are created on the first
/// successful provider callback and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub provider_id: String,
    pub email: String,
    pub display_name: String,
    pub picture_url: Option<String>,
    /// Latest provider-scoped access token. Never serialized into API responses.
    pub access_token: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
    pub is_registration_complete: bool,
    pub registration_completed_at: Option<DateTime<Utc>>,
    pub profile: ProfileDetails,
}

/// Fields collected during registration completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<Address>,
    pub preferences: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "zipCode")]
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Public projection of a [`UserRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub is_registration_complete: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        UserSummary {
            id: user.provider_id.clone(),
            email: user.email.clone(),
            name: user.display_name.clone(),
            picture: user.picture_url.clone(),
            is_registration_complete: user.is_registration_complete,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Summary plus everything collected at registration completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProfile {
    #[serde(flatten)]
    pub summary: UserSummary,
    pub registration_completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: ProfileDetails,
}

impl From<&UserRecord> for FullProfile {
    fn from(user: &UserRecord) -> Self {
        FullProfile {
            summary: user.into(),
            registration_completed_at: user.registration_completed_at,
            profile: user.profile.clone(),
        }
    }
}

// API request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootResponse {
    pub message: String,
    pub status: String,
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Body of `POST /auth/complete-registration`. Phone is mandatory; it is
/// optional here so its absence can be reported as a domain error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRegistrationRequest {
    pub phone: Option<String>,
    pub date_of_birth: Option<String>,
    pub address: Option<Address>,
    pub preferences: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteRegistrationResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStatusResponse {
    pub is_registration_complete: bool,
    pub registration_completed_at: Option<DateTime<Utc>>,
    pub fields: RegistrationFieldStatus,
}

/// Which completion fields have been supplied so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFieldStatus {
    pub phone: bool,
    pub date_of_birth: bool,
    pub address: bool,
    pub preferences: bool,
}

impl From<&ProfileDetails> for RegistrationFieldStatus {
    fn from(profile: &ProfileDetails) -> Self {
        RegistrationFieldStatus {
            phone: profile.phone.as_deref().is_some_and(|p| !p.trim().is_empty()),
            date_of_birth: profile.date_of_birth.is_some(),
            address: profile.address.is_some(),
            preferences: profile.preferences.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: FullProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicProfileResponse {
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub count: usize,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// Backend-of-record relay wire types

/// Identity claim forwarded to the backend of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
    pub google_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub access_token: String,
}

/// Backend of record's answer. Every field is optional on the wire except
/// `success`; a failing backend may send only a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    #[serde(default)]
    pub success: bool,
    pub token: Option<String>,
    pub user: Option<serde_json::Value>,
    pub is_new_user: Option<bool>,
    pub message: Option<String>,
}
