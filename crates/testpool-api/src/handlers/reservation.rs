//! Reservation handler.

use axum::Json;
use axum::extract::State;
use tracing::{info, warn};

use crate::dto::request::ReserveRequest;
use crate::dto::response::{ApiResponse, ReservationResponse};
use crate::error::ApiError;
use crate::extractors::ApiJson;
use crate::state::AppState;

/// POST /api/reservations
pub async fn reserve(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReserveRequest>,
) -> Result<Json<ApiResponse<ReservationResponse>>, ApiError> {
    let (kind, tag) = req.parse()?;

    let record = match state.allocator.reserve(kind, tag).await?.into_record() {
        Ok(record) => record,
        Err(e) => {
            warn!(kind = %kind, "Reservation refused: pool exhausted");
            return Err(e.into());
        }
    };

    info!(
        kind = %kind,
        identifier = %record.identifier(kind),
        row = record.row,
        "Reservation served"
    );

    Ok(Json(ApiResponse::ok(ReservationResponse::new(kind, record))))
}
