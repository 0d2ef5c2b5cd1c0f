use axum::{extract::State, routing::get, Json, Router};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{instrument, warn};

use crate::{
    auth::Session,
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub success: bool,
    pub balance: f64,
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/balance", get(balance))
}

#[instrument(skip(state, session), fields(username = %session.0.sub))]
pub async fn balance(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<BalanceResponse>> {
    let balance = state
        .store
        .balance_of(&session.0.sub)
        .await?
        .ok_or_else(|| {
            warn!("authenticated user row missing");
            ApiError::NotFound("User not found".into())
        })?;

    let balance = balance
        .to_f64()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("balance out of f64 range")))?;

    Ok(Json(BalanceResponse {
        success: true,
        balance,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_serializes_as_number() {
        let response = BalanceResponse {
            success: true,
            balance: 100000.0,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"balance\":100000.0"));
        assert!(!json.contains("\"100000"));
    }
}
