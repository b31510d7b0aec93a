//! JSON REST handlers for devices.
//!
//! Writes go through the hub, so a `PUT` reaches every connected viewer
//! exactly like a WebSocket `set`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use vshome_domain::device::{Device, StatePatch};
use vshome_domain::error::InvalidRequestError;
use vshome_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a partial state update.
#[derive(Deserialize)]
pub struct UpdateDeviceRequest {
    #[serde(default)]
    pub state: StatePatch,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Device>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and update endpoints.
pub enum DeviceResponse {
    Ok(Json<Device>),
}

impl IntoResponse for DeviceResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/devices`
pub async fn list(State(state): State<AppState>) -> ListResponse {
    let devices = state.hub.registry().list().await;
    ListResponse::Ok(Json(devices))
}

/// `GET /api/devices/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<DeviceResponse, ApiError> {
    let device = state.hub.registry().get(&DeviceId::from(id)).await?;
    Ok(DeviceResponse::Ok(Json(device)))
}

/// `PUT /api/devices/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateDeviceRequest>, JsonRejection>,
) -> Result<DeviceResponse, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected device update body");
        InvalidRequestError::MalformedBody
    })?;
    let device = state
        .hub
        .submit(&DeviceId::from(id), request.state)
        .await?;
    Ok(DeviceResponse::Ok(Json(device)))
}
