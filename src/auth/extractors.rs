use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;
use time::OffsetDateTime;
use tracing::warn;

use super::{claims::Claims, jwt::JwtKeys, SESSION_COOKIE};
use crate::{error::ApiError, state::AppState};

/// Validated session attached to protected requests.
///
/// Validation is deliberately two-layered: the JWT signature proves the
/// token was issued here, and the token-table row proves it has not been
/// revoked since. A logged-out token fails the lookup even though its
/// signature would still verify.
pub struct Session(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Auth("No token provided".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "session token failed verification");
            ApiError::Auth("Invalid token".into())
        })?;

        let row = state
            .store
            .find_token(&token, claims.uid)
            .await?
            .ok_or_else(|| {
                warn!(uid = claims.uid, "session token not in token store");
                ApiError::Auth("Invalid token".into())
            })?;

        if OffsetDateTime::now_utc() >= row.expiry {
            warn!(uid = claims.uid, "session token row expired");
            return Err(ApiError::Auth("Token expired".into()));
        }

        Ok(Session(claims))
    }
}
