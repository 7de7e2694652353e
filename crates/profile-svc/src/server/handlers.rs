//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{CreateProfileResponse, ErrorResponse, HealthResponse, ProfileResponse},
    ServiceError,
};
use fieldcrypt::{ErrorKind, FieldCipherError};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::{error::ApiError, state::AppState};
use crate::model::Profile;

/// `POST /profiles`: seal the profile's sensitive fields and store it.
///
/// Returns `201 Created` with the new id. A sensitive field left empty is a
/// `400`; any other sealing failure is a `500`.
pub async fn create_profile(
    State(state): State<AppState>,
    Json(mut profile): Json<Profile>,
) -> Result<(StatusCode, Json<CreateProfileResponse>), ApiError> {
    state
        .cipher
        .encrypt_struct(&mut profile, &state.groups)
        .map_err(seal_failure)?;

    let id = Uuid::new_v4();
    state.store.insert(id, profile.to_record())?;
    info!(%id, companies = profile.companies.len(), "profile created");

    Ok((
        StatusCode::CREATED,
        Json(CreateProfileResponse { id: id.to_string() }),
    ))
}

/// `GET /profiles/:id`: load a stored profile and open its sealed fields.
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let mut record = state
        .store
        .get(id)?
        .ok_or_else(|| ServiceError::NotFound("profile does not exist".into()))?;

    state
        .cipher
        .decrypt_maps(&mut record, &state.groups)
        .map_err(open_failure)?;

    Ok(Json(ProfileResponse {
        id: id.to_string(),
        profile: record,
    }))
}

/// `GET /profiles`: every stored profile, opened in a single pass over the
/// whole collection.
pub async fn list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileResponse>>, ApiError> {
    let (ids, records): (Vec<Uuid>, Vec<Value>) = state.store.list()?.into_iter().unzip();
    if records.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut rows = Value::Array(records);
    state
        .cipher
        .decrypt_maps(&mut rows, &state.groups)
        .map_err(open_failure)?;

    let Value::Array(records) = rows else {
        return Err(ServiceError::Internal("profile list lost its shape".into()).into());
    };
    let profiles = ids
        .into_iter()
        .zip(records)
        .map(|(id, profile)| ProfileResponse {
            id: id.to_string(),
            profile,
        })
        .collect();
    Ok(Json(profiles))
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` while the store answers, `503 Service Unavailable`
/// otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let path_groups = state.groups.len();
    let (status_code, status_str, profiles_stored) = match state.store.count() {
        Ok(n) => (StatusCode::OK, "ok", n),
        Err(e) => {
            warn!(error = %e, "health check: profile store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", 0)
        }
    };

    let body = HealthResponse {
        status: status_str.into(),
        profiles_stored,
        path_groups,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

fn seal_failure(err: FieldCipherError) -> ServiceError {
    warn!(error = %err, kind = ?err.kind(), "sealing profile failed");
    match err.kind() {
        ErrorKind::EmptyValue => {
            ServiceError::BadRequest("profile is missing a required field".into())
        }
        _ => ServiceError::EncryptionFailure("encryption failed".into()),
    }
}

fn open_failure(err: FieldCipherError) -> ServiceError {
    warn!(error = %err, kind = ?err.kind(), "opening profile failed");
    ServiceError::EncryptionFailure("decryption failed".into())
}
