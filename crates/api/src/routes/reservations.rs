//! Reservation lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use chrono::{DateTime, SecondsFormat, Utc};
use common::{OrderId, ProductId, ReservationId};
use domain::Reservation;
use engine::{EngineError, ReservationEngine};
use serde::{Deserialize, Serialize};
use store::InventoryStore;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: InventoryStore> {
    pub engine: ReservationEngine<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct ReserveRequest {
    pub product_id: String,
    pub order_id: String,
    pub quantity: u32,
}

#[derive(Deserialize, Default)]
pub struct ReleaseRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct ReserveResponse {
    pub success: bool,
    pub reservation_id: String,
    pub product_id: String,
    pub quantity_reserved: u32,
    pub message: String,
    pub reserved_at: String,
}

#[derive(Serialize)]
pub struct ConfirmResponse {
    pub success: bool,
    pub reservation_id: String,
    pub product_id: String,
    pub quantity_confirmed: u32,
    pub message: String,
    pub confirmed_at: String,
}

#[derive(Serialize)]
pub struct ReleaseResponse {
    pub success: bool,
    pub reservation_id: String,
    pub product_id: String,
    pub quantity_released: u32,
    pub message: String,
    pub released_at: String,
    pub reason: String,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reservation_id: String,
    pub product_id: String,
    pub order_id: String,
    pub quantity: u32,
    pub status: String,
    pub created_at: String,
    pub confirmed_at: String,
    pub released_at: String,
    pub release_reason: String,
}

impl From<&Reservation> for ReservationResponse {
    fn from(r: &Reservation) -> Self {
        Self {
            reservation_id: r.id().to_string(),
            product_id: r.product_id().to_string(),
            order_id: r.order_id().to_string(),
            quantity: r.quantity(),
            status: r.status().to_string(),
            created_at: format_timestamp(Some(r.created_at())),
            confirmed_at: format_timestamp(r.confirmed_at()),
            released_at: format_timestamp(r.released_at()),
            release_reason: r.release_reason().unwrap_or_default().to_string(),
        }
    }
}

// -- Handlers --

/// POST /reservations — place a hold of `quantity` units for an order.
#[tracing::instrument(skip(state, req))]
pub async fn reserve<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<ReserveRequest>,
) -> Result<Json<ReserveResponse>, ApiError> {
    let product_id = ProductId::new(req.product_id);
    let order_id = parse_order_id(&req.order_id)?;
    if req.quantity == 0 {
        return Err(ApiError::BadRequest(
            "Invalid quantity: 0, must be greater than zero".to_string(),
        ));
    }

    match state
        .engine
        .reserve(product_id.clone(), order_id, req.quantity)
        .await
    {
        Ok(receipt) => Ok(Json(ReserveResponse {
            success: true,
            reservation_id: receipt.reservation.id().to_string(),
            product_id: receipt.reservation.product_id().to_string(),
            quantity_reserved: receipt.reservation.quantity(),
            message: receipt.message,
            reserved_at: format_timestamp(Some(receipt.reservation.created_at())),
        })),
        Err(EngineError::Business(err)) => Ok(Json(ReserveResponse {
            success: false,
            reservation_id: String::new(),
            product_id: product_id.to_string(),
            quantity_reserved: 0,
            message: err.to_string(),
            reserved_at: String::new(),
        })),
        Err(EngineError::Store(err)) => Err(ApiError::Internal(err.to_string())),
    }
}

/// POST /reservations/:id/confirm — commit the hold, decrementing stock.
#[tracing::instrument(skip(state))]
pub async fn confirm<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ConfirmResponse>, ApiError> {
    let reservation_id = parse_reservation_id(&id)?;

    match state.engine.confirm(reservation_id).await {
        Ok(receipt) => Ok(Json(ConfirmResponse {
            success: true,
            reservation_id: receipt.reservation.id().to_string(),
            product_id: receipt.reservation.product_id().to_string(),
            quantity_confirmed: receipt.reservation.quantity(),
            message: receipt.message,
            confirmed_at: format_timestamp(receipt.reservation.confirmed_at()),
        })),
        Err(EngineError::Business(err)) => Ok(Json(ConfirmResponse {
            success: false,
            reservation_id: reservation_id.to_string(),
            product_id: String::new(),
            quantity_confirmed: 0,
            message: err.to_string(),
            confirmed_at: String::new(),
        })),
        Err(EngineError::Store(err)) => Err(ApiError::Internal(err.to_string())),
    }
}

/// POST /reservations/:id/release — compensate the hold. Idempotent.
#[tracing::instrument(skip(state, req))]
pub async fn release<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    req: Option<Json<ReleaseRequest>>,
) -> Result<Json<ReleaseResponse>, ApiError> {
    let reservation_id = parse_reservation_id(&id)?;
    let reason = req
        .and_then(|Json(r)| r.reason)
        .unwrap_or_else(|| "No reason provided".to_string());

    match state.engine.release(reservation_id, &reason).await {
        Ok(receipt) => Ok(Json(ReleaseResponse {
            success: true,
            reservation_id: receipt.reservation.id().to_string(),
            product_id: receipt.reservation.product_id().to_string(),
            quantity_released: receipt.reservation.quantity(),
            message: receipt.message,
            released_at: format_timestamp(receipt.reservation.released_at()),
            reason: receipt
                .reservation
                .release_reason()
                .unwrap_or_default()
                .to_string(),
        })),
        Err(EngineError::Business(err)) => Ok(Json(ReleaseResponse {
            success: false,
            reservation_id: reservation_id.to_string(),
            product_id: String::new(),
            quantity_released: 0,
            message: err.to_string(),
            released_at: String::new(),
            reason,
        })),
        Err(EngineError::Store(err)) => Err(ApiError::Internal(err.to_string())),
    }
}

/// GET /reservations/:id — audit-trail read of one reservation record.
#[tracing::instrument(skip(state))]
pub async fn get<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ReservationResponse>, ApiError> {
    let reservation_id = parse_reservation_id(&id)?;
    let reservation = state.engine.get_reservation(reservation_id).await?;
    Ok(Json(ReservationResponse::from(&reservation)))
}

/// ISO-8601 UTC with millisecond precision; empty string when absent.
pub(crate) fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

fn parse_reservation_id(id: &str) -> Result<ReservationId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid reservation ID format: {e}")))?;
    Ok(ReservationId::from_uuid(uuid))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))?;
    Ok(OrderId::from_uuid(uuid))
}
