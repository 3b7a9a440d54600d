//! User directory: providerId → [`UserRecord`].
//!
//! The [`UserDirectory`] trait is the seam a durable store would plug into;
//! [`InMemoryUserDirectory`] keeps everything in process memory and loses it
//! on restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use shared_types::{ProfileDetails, UserRecord};
use thiserror::Error;

use crate::auth::types::IdentityClaim;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("User {0} not found")]
    UserNotFound(String),

    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Storage operations the gateway needs from a user directory.
pub trait UserDirectory: Send + Sync {
    /// Get a user by provider id.
    fn lookup(&self, provider_id: &str) -> DirectoryResult<Option<UserRecord>>;

    /// Create the record on first login, or refresh `access_token` and
    /// `last_login_at` on an existing one. Returns `true` when created.
    ///
    /// Check-then-create is atomic: concurrent calls for one provider id
    /// create at most one record.
    fn upsert_on_login(&self, claim: &IdentityClaim) -> DirectoryResult<(UserRecord, bool)>;

    /// Merge completion fields and mark registration complete.
    fn complete_registration(
        &self,
        provider_id: &str,
        fields: ProfileDetails,
    ) -> DirectoryResult<UserRecord>;

    /// All users, oldest first.
    fn list(&self) -> DirectoryResult<Vec<UserRecord>>;

    fn len(&self) -> DirectoryResult<usize>;
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> DirectoryResult<MutexGuard<'_, HashMap<String, UserRecord>>> {
        self.users
            .lock()
            .map_err(|_| DirectoryError::Unavailable("user map lock poisoned".to_string()))
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn lookup(&self, provider_id: &str) -> DirectoryResult<Option<UserRecord>> {
        Ok(self.users()?.get(provider_id).cloned())
    }

    fn upsert_on_login(&self, claim: &IdentityClaim) -> DirectoryResult<(UserRecord, bool)> {
        let now = Utc::now();
        let mut users = self.users()?;

        if let Some(existing) = users.get_mut(&claim.provider_id) {
            existing.access_token = claim.access_token.clone();
            existing.last_login_at = now;
            tracing::debug!(provider_id = %claim.provider_id, "Refreshed returning user");
            return Ok((existing.clone(), false));
        }

        let user = UserRecord {
            provider_id: claim.provider_id.clone(),
            email: claim.email.clone(),
            display_name: claim.display_name.clone(),
            picture_url: claim.picture_url.clone(),
            access_token: claim.access_token.clone(),
            created_at: now,
            last_login_at: now,
            is_registration_complete: false,
            registration_completed_at: None,
            profile: ProfileDetails::default(),
        };
        users.insert(user.provider_id.clone(), user.clone());
        tracing::info!(provider_id = %user.provider_id, email = %user.email, "Created new user");
        Ok((user, true))
    }

    fn complete_registration(
        &self,
        provider_id: &str,
        fields: ProfileDetails,
    ) -> DirectoryResult<UserRecord> {
        let phone = fields
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(DirectoryError::MissingRequiredField("phone"))?
            .to_string();

        let mut users = self.users()?;
        let user = users
            .get_mut(provider_id)
            .ok_or_else(|| DirectoryError::UserNotFound(provider_id.to_string()))?;

        user.profile.phone = Some(phone);
        if fields.date_of_birth.is_some() {
            user.profile.date_of_birth = fields.date_of_birth;
        }
        if fields.address.is_some() {
            user.profile.address = fields.address;
        }
        if fields.preferences.is_some() {
            user.profile.preferences = fields.preferences;
        }

        if !user.is_registration_complete {
            user.is_registration_complete = true;
            user.registration_completed_at = Some(Utc::now());
            tracing::info!(provider_id, "Registration completed");
        }

        Ok(user.clone())
    }

    fn list(&self) -> DirectoryResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users()?.values().cloned().collect();
        users.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.provider_id.cmp(&b.provider_id))
        });
        Ok(users)
    }

    fn len(&self) -> DirectoryResult<usize> {
        Ok(self.users()?.len())
    }
}
