//! Provider profile → identity claim.

use thiserror::Error;

use super::types::{IdentityClaim, ProviderProfile};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClaimError {
    #[error("Malformed provider profile: {0}")]
    MalformedProfile(&'static str),
}

/// Build an [`IdentityClaim`] from a provider profile.
///
/// Requires a non-empty provider id and at least one verified email. The
/// first verified email wins; the display name falls back to that email.
pub fn normalize(profile: &ProviderProfile, access_token: &str) -> Result<IdentityClaim, ClaimError> {
    let provider_id = profile.id.trim();
    if provider_id.is_empty() {
        return Err(ClaimError::MalformedProfile("missing provider id"));
    }

    let email = profile
        .emails
        .iter()
        .filter(|e| e.verified)
        .map(|e| e.value.trim())
        .find(|e| !e.is_empty())
        .ok_or(ClaimError::MalformedProfile("no verified email address"))?;

    let display_name = profile
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(email);

    let picture_url = profile
        .photos
        .iter()
        .map(|p| p.trim())
        .find(|p| !p.is_empty())
        .map(str::to_string);

    Ok(IdentityClaim {
        provider_id: provider_id.to_string(),
        email: email.to_string(),
        display_name: display_name.to_string(),
        picture_url,
        access_token: access_token.to_string(),
    })
}
