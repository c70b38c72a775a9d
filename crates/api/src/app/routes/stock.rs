use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use stockwatch_core::StockItemId;
use stockwatch_inventory::{CreateStockItem, StockItem};

use crate::app::dto::{CreateStockRequest, UpdateStockRequest};
use crate::app::errors::ApiError;
use crate::app::services::{AppServices, update_command};
use crate::context::AdminContext;

pub async fn list_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<StockItem>>, ApiError> {
    Ok(Json(services.stock.list_active().await?))
}

pub async fn check_low_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<StockItem>>, ApiError> {
    Ok(Json(services.stock.list_low_stock().await?))
}

pub async fn add_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AdminContext>,
    payload: Result<Json<CreateStockRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload?;
    let item = services
        .stock
        .add(CreateStockItem {
            title: body.title,
            quantity: body.quantity,
            status: body.status,
            created_at: body.create_date,
            updated_at: body.update_date,
            owner_id: ctx.admin_id(),
            occurred_at: Utc::now(),
        })
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AdminContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStockRequest>, JsonRejection>,
) -> Result<Json<StockItem>, ApiError> {
    let id: StockItemId = id
        .parse()
        .map_err(|_| ApiError::BadRequest("invalid stock item id".to_string()))?;
    let Json(body) = payload?;

    let mut cmd = update_command(ctx.admin_id());
    cmd.title = body.title;
    cmd.quantity = body.quantity;
    cmd.status = body.status;
    cmd.created_at = body.create_date;
    cmd.updated_at = body.update_date;

    Ok(Json(services.stock.update(id, cmd).await?))
}

/// Run the low-stock notifier now and report its outcome.
pub async fn notify_now(Extension(services): Extension<Arc<AppServices>>) -> Response {
    match services.notify.run_now().await {
        Ok(outcome) => Json(json!({
            "ok": true,
            "attempted": outcome.attempted(),
            "sent": outcome.sent(),
            "result": outcome,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "manual low-stock notification failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
