//! Cart routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use tracing::debug;

use crate::auth::Actor;
use crate::dto::{AddToCartRequest, CartView};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// `GET /cart` - the caller's cart at live prices. Never 404s.
pub async fn get_cart(State(state): State<AppState>, actor: Actor) -> ApiResult<Json<CartView>> {
    let cart = state.db.carts().get(&actor.user_id).await?;
    Ok(Json(cart.map(CartView::from).unwrap_or_else(CartView::empty)))
}

/// `POST /cart` - add a product line (merged with an existing line).
pub async fn add_to_cart(
    State(state): State<AppState>,
    actor: Actor,
    body: Result<Json<AddToCartRequest>, JsonRejection>,
) -> ApiResult<Json<CartView>> {
    let Json(request) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    debug!(user_id = %actor.user_id, product_id = %request.product_id, "add_to_cart");

    let cart = state
        .db
        .carts()
        .add_item(&actor.user_id, &request.product_id, request.quantity)
        .await?;

    Ok(Json(CartView::from(cart)))
}
