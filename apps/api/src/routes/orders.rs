//! Order routes: checkout, listing and lifecycle actions.

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::debug;

use crate::auth::Actor;
use crate::dto::{OrderFilter, OrderView};
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::AppState;
use tienda_core::OrderStatus;
use tienda_db::PaymentResult;

/// `POST /orders/checkout` - turn the caller's cart into a Pending order.
pub async fn checkout(State(state): State<AppState>, actor: Actor) -> ApiResult<Json<OrderView>> {
    debug!(user_id = %actor.user_id, "checkout");
    let order = state.checkout.checkout(&actor.user_id).await?;
    Ok(Json(OrderView::from(order)))
}

/// `GET /orders` - the caller's own orders, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    actor: Actor,
) -> ApiResult<Json<Vec<OrderView>>> {
    let orders = state.db.orders().list_for_user(&actor.user_id).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// `GET /orders/all[?status=Paid]` - every order, admin only.
pub async fn list_all(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<OrderFilter>,
) -> ApiResult<Json<Vec<OrderView>>> {
    actor.require_admin()?;

    let status = filter
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let orders = state.db.orders().list_all(status).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// `GET /orders/{id}` - owner or admin.
pub async fn get_order(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let order = state.orders.get(&id).await?;
    actor.ensure_can_access(&order)?;
    Ok(Json(OrderView::from(order)))
}

/// `POST /orders/{id}/pay` - owner or admin.
///
/// A declined payment answers 400 `PAYMENT_DECLINED`; by then the order is
/// already Cancelled and its stock returned.
pub async fn pay(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let order = state.orders.get(&id).await?;
    actor.ensure_can_access(&order)?;

    match state.orders.pay(&id).await? {
        PaymentResult::Captured { order, .. } => Ok(Json(OrderView::from(order))),
        PaymentResult::Declined { reason, .. } => Err(ApiError::new(
            ErrorCode::PaymentDeclined,
            format!("Payment failed: {}", reason),
        )),
    }
}

/// `POST /orders/{id}/cancel` - owner or admin, Pending only.
pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let order = state.orders.get(&id).await?;
    actor.ensure_can_access(&order)?;

    let order = state.orders.cancel(&id).await?;
    Ok(Json(OrderView::from(order)))
}

/// `POST /orders/{id}/ship` - admin only, Paid only.
pub async fn ship(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    actor.require_admin()?;
    let order = state.orders.ship(&id).await?;
    Ok(Json(OrderView::from(order)))
}
