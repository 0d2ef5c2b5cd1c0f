use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    validate::{is_valid_email, is_valid_phone, is_valid_username, MIN_PASSWORD_LEN},
    SESSION_COOKIE,
};
use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    store::NewUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

fn session_cookie(state: &AppState, keys: &JwtKeys, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.cookie_secure)
        .max_age(keys.session_ttl)
        .build()
}

fn expired_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .build()
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    if !is_valid_username(&payload.username) {
        warn!("invalid username");
        return Err(ApiError::Validation(
            "Username must be 3-50 alphanumeric characters".into(),
        ));
    }
    if !is_valid_email(&payload.email) {
        warn!("invalid email");
        return Err(ApiError::Validation(
            "Please enter a valid email address".into(),
        ));
    }
    // Empty phone is treated as absent.
    let phone = payload
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    if let Some(p) = &phone {
        if !is_valid_phone(p) {
            warn!("invalid phone");
            return Err(ApiError::Validation(
                "Please enter a valid 10-digit phone number".into(),
            ));
        }
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }

    // Friendly duplicate check; the UNIQUE constraints remain the real
    // enforcement against a concurrent identical registration.
    if state
        .store
        .find_user_by_username_or_email(&payload.username, &payload.email)
        .await?
        .is_some()
    {
        warn!("duplicate registration");
        return Err(ApiError::Conflict("Username or email already exists".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = NewUser::customer(&payload.username, &payload.email, &hash, phone);
    let uid = state.store.create_user(&user).await?;

    info!(uid, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Registration successful")),
    ))
}

#[instrument(skip(state, jar, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".into(),
        ));
    }

    let user = state
        .store
        .find_user_by_username(&payload.username)
        .await?
        .ok_or_else(|| {
            warn!("login with unknown username");
            ApiError::Auth("Invalid username or password".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(uid = user.uid, "login with wrong password");
        return Err(ApiError::Auth("Invalid username or password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.username, user.uid, &user.role)?;

    // The row expiry is computed here, not decoded from the signature.
    state
        .store
        .insert_token(&token, user.uid, keys.session_expiry())
        .await?;

    info!(uid = user.uid, "user logged in");
    let jar = jar.add(session_cookie(&state, &keys, token));
    Ok((
        jar,
        Json(LoginResponse {
            success: true,
            message: "Login successful".into(),
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<MessageResponse>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let removed = state.store.delete_token(cookie.value()).await?;
        info!(removed, "session revoked");
    }
    let jar = jar.remove(expired_cookie());
    Ok((jar, Json(MessageResponse::new("Logout successful"))))
}
