// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use purechance_fhevm::{
    local::LocalOracle,
    wire::{
        ErrorResponse, InputProofRequest, KeyUrlResponse, UserDecryptPayload, HEALTH_PATH,
        INPUT_PROOF_PATH, KEY_URL_PATH, USER_DECRYPT_PATH,
    },
    RelayerError,
};
use serde_json::json;
use std::fmt;
use tracing::{info, warn};

/// Register the relayer routes. Expects a `web::Data<LocalOracle>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route(KEY_URL_PATH, web::get().to(key_url))
        .route(INPUT_PROOF_PATH, web::post().to(input_proof))
        .route(USER_DECRYPT_PATH, web::post().to(user_decrypt))
        .route(HEALTH_PATH, web::get().to(health))
        .route(HEALTH_PATH, web::head().to(health));
}

#[derive(Debug)]
struct ApiError(RelayerError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<RelayerError> for ApiError {
    fn from(value: RelayerError) -> Self {
        Self(value)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            message: self.0.to_string(),
        })
    }
}

async fn key_url(oracle: web::Data<LocalOracle>) -> HttpResponse {
    HttpResponse::Ok().json(KeyUrlResponse {
        public_key: oracle.public_key_hex(),
    })
}

async fn input_proof(
    oracle: web::Data<LocalOracle>,
    request: web::Json<InputProofRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = oracle.serve_input_proof(&request).map_err(|e| {
        warn!("Input proof for {} refused: {}", request.user_address, e);
        e
    })?;
    info!(
        "Input proof for {} values to {}",
        response.handles.len(),
        request.contract_address
    );
    Ok(HttpResponse::Ok().json(response))
}

async fn user_decrypt(
    oracle: web::Data<LocalOracle>,
    payload: web::Json<UserDecryptPayload>,
) -> Result<HttpResponse, ApiError> {
    let response = oracle.serve_user_decrypt(&payload).map_err(|e| {
        warn!("User decryption for {} refused: {}", payload.user_address, e);
        e
    })?;
    Ok(HttpResponse::Ok().json(response))
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}
