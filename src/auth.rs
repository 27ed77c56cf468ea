use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderName},
};
use tracing::warn;

use crate::{config::Settings, error::ApiError, AppState};

/// Shared-secret check on a single request header.
#[derive(Debug, Clone)]
pub struct AuthGate {
    header: HeaderName,
    enabled: bool,
    expected: String,
}

impl AuthGate {
    pub fn new(settings: &Settings) -> Self {
        AuthGate {
            header: settings.api_key_header.clone(),
            enabled: settings.enable_api_key,
            expected: settings.api_key.clone(),
        }
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Compares raw header bytes, so a value that is not valid text still
    /// counts as a presented (and wrong) credential.
    pub fn check(&self, presented: Option<&[u8]>) -> Result<(), ApiError> {
        if !self.enabled {
            return Ok(());
        }

        let presented = match presented {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!("Request received without API key");
                return Err(ApiError::Unauthorized);
            }
        };

        if presented != self.expected.as_bytes() {
            let prefix = &presented[..presented.len().min(5)];
            warn!(
                "Invalid API key attempt: {}...",
                String::from_utf8_lossy(prefix)
            );
            return Err(ApiError::Forbidden);
        }

        Ok(())
    }
}

/// Extractor that admits the request only if the configured credential
/// header passes the [`AuthGate`]. Must run before any body extractor.
pub struct RequireApiKey;

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireApiKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let gate = &state.auth;
        let presented = parts
            .headers
            .get(gate.header())
            .map(|value| value.as_bytes());

        gate.check(presented)?;
        Ok(RequireApiKey)
    }
}
