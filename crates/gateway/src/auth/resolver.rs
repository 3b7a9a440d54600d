//! Bridges a provider grant to directory state.

use thiserror::Error;

use super::normalize::{normalize, ClaimError};
use super::types::{IdentityClaim, ProviderGrant, SessionIdentity};
use crate::directory::{DirectoryError, UserDirectory};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Claim(#[from] ClaimError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A resolved login: the normalized claim plus the principal to attach to
/// the session.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub claim: IdentityClaim,
    pub identity: SessionIdentity,
}

pub struct SessionResolver<'a> {
    directory: &'a dyn UserDirectory,
}

impl<'a> SessionResolver<'a> {
    pub fn new(directory: &'a dyn UserDirectory) -> Self {
        Self { directory }
    }

    /// Normalize the grant's profile and create or refresh the user record.
    pub fn resolve(&self, grant: &ProviderGrant) -> Result<Resolution, ResolveError> {
        let claim = normalize(&grant.profile, &grant.access_token)?;
        let (user, is_new_user) = self.directory.upsert_on_login(&claim)?;

        Ok(Resolution {
            claim,
            identity: SessionIdentity { user, is_new_user },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::types::{ProfileEmail, ProviderProfile};
    use crate::directory::InMemoryUserDirectory;

    fn grant(id: &str, token: &str) -> ProviderGrant {
        ProviderGrant {
            access_token: token.to_string(),
            profile: ProviderProfile {
                id: id.to_string(),
                emails: vec![ProfileEmail {
                    value: "a@x.com".to_string(),
                    verified: true,
                }],
                display_name: Some("Ada".to_string()),
                photos: vec![],
            },
        }
    }

    #[test]
    fn test_first_resolution_is_new_user() {
        let directory = InMemoryUserDirectory::new();
        let resolver = SessionResolver::new(&directory);

        let first = resolver.resolve(&grant("g-1", "t1")).unwrap();
        let second = resolver.resolve(&grant("g-1", "t2")).unwrap();

        assert!(first.identity.is_new_user);
        assert!(!second.identity.is_new_user);
        assert_eq!(second.identity.user.access_token, "t2");
        assert_eq!(second.claim.access_token, "t2");
    }

    #[test]
    fn test_malformed_profile_does_not_touch_directory() {
        let directory = InMemoryUserDirectory::new();
        let mut bad = grant("g-1", "t1");
        bad.profile.emails.clear();

        let result = SessionResolver::new(&directory).resolve(&bad);

        assert!(matches!(result, Err(ResolveError::Claim(_))));
        assert_eq!(directory.len().unwrap(), 0);
    }
}
