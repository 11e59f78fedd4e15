//! Privileged routes.

use axum::extract::{Path, State};
use axum::Json;

use crate::auth::Actor;
use crate::dto::OrderView;
use crate::error::ApiResult;
use crate::AppState;

/// `POST /admin/orders/{id}/cancel` - cancel a Pending or Paid order and
/// restock it.
pub async fn cancel_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    actor.require_admin()?;
    let order = state.orders.admin_cancel(&id).await?;
    Ok(Json(OrderView::from(order)))
}
