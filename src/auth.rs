use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use tracing::warn;

use crate::error::ApiError;
use crate::settings::Settings;

/// Accepts the admin token from a `Bearer` header, falling back to the
/// `token` query parameter for calendar clients that cannot set headers.
pub fn verify_token(
    settings: &Settings,
    auth: Option<Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    let provided = auth.as_ref().map(|a| a.token()).or(query_token);
    match provided {
        Some(token) if token == settings.auth_token => Ok(()),
        Some(_) => {
            warn!("rejected request with wrong token");
            Err(ApiError::Unauthorized("Invalid authentication token".into()))
        }
        None => Err(ApiError::Unauthorized("Missing authentication token".into())),
    }
}
