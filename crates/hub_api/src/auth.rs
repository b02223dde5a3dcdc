//! Operator login gate.
//!
//! Only checks the shape of the credentials; there is no user store behind
//! it and no token is issued.

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::error::error_response;

const MIN_PHONE_LEN: usize = 10;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub phone: String,
}

fn check_credentials(request: &LoginRequest) -> Result<(), &'static str> {
    if request.phone.trim().chars().count() < MIN_PHONE_LEN {
        return Err("Phone number must be at least 10 characters");
    }
    if request.password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

pub async fn login(Json(payload): Json<LoginRequest>) -> impl IntoResponse {
    match check_credentials(&payload) {
        Ok(()) => {
            tracing::info!("Operator {} signed in", payload.phone.trim());
            (
                StatusCode::OK,
                Json(LoginResponse {
                    phone: payload.phone.trim().to_string(),
                }),
            )
                .into_response()
        }
        Err(message) => error_response(StatusCode::UNPROCESSABLE_ENTITY, message).into_response(),
    }
}
