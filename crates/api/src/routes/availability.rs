//! Availability read endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use common::ProductId;
use serde::{Deserialize, Serialize};
use store::InventoryStore;

use crate::error::ApiError;
use crate::routes::reservations::AppState;

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub quantity: Option<u32>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub product_id: String,
    pub product_name: String,
    pub total_stock: u32,
    pub reserved_stock: u32,
    pub available_stock: i64,
    pub requested_quantity: u32,
    pub available: bool,
    pub message: String,
}

/// GET /products/:id/availability?quantity=N — advisory availability check.
#[tracing::instrument(skip(state))]
pub async fn check<S: InventoryStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let requested = query.quantity.unwrap_or(1);
    if requested == 0 {
        return Err(ApiError::BadRequest(
            "Invalid quantity: 0, must be greater than zero".to_string(),
        ));
    }

    let check = state
        .engine
        .availability()
        .check(&ProductId::new(id), requested)
        .await?;

    Ok(Json(AvailabilityResponse {
        product_id: check.availability.product_id.to_string(),
        product_name: check.availability.product_name,
        total_stock: check.availability.total_stock,
        reserved_stock: check.availability.active_reserved,
        available_stock: check.availability.available,
        requested_quantity: check.requested,
        available: check.is_available,
        message: check.message,
    }))
}
