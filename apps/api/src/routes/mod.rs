//! # Routes
//!
//! ```text
//! GET   /health                        public
//! GET   /cart                          customer
//! POST  /cart                          customer
//! POST  /orders/checkout               customer
//! GET   /orders                        customer (own orders)
//! GET   /orders/all?status=            admin
//! GET   /orders/{id}                   owner | admin
//! POST  /orders/{id}/pay               owner | admin
//! POST  /orders/{id}/cancel            owner | admin
//! POST  /orders/{id}/ship              admin
//! POST  /admin/orders/{id}/cancel      admin
//! ```

pub mod admin;
pub mod cart;
pub mod health;
pub mod orders;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

/// Route table without layers or state attached.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/cart", get(cart::get_cart).post(cart::add_to_cart))
        .route("/orders", get(orders::list_mine))
        .route("/orders/checkout", post(orders::checkout))
        .route("/orders/all", get(orders::list_all))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/pay", post(orders::pay))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/orders/{id}/ship", post(orders::ship))
        .route("/admin/orders/{id}/cancel", post(admin::cancel_order))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::auth::{ROLES_HEADER, USER_ID_HEADER};
    use crate::{build_router, AppState};
    use tienda_core::{Money, Product};
    use tienda_db::{Database, DbConfig, PaymentGateway, SimulatedGateway};

    struct TestApp {
        router: Router,
        db: Database,
    }

    async fn app_with(gateway: SimulatedGateway) -> TestApp {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway: Arc<dyn PaymentGateway> = Arc::new(gateway);
        let router = build_router(AppState::new(db.clone(), gateway));
        TestApp { router, db }
    }

    async fn product(db: &Database, name: &str, cents: i64, stock: i64) -> String {
        db.products()
            .insert(&Product::new(name, Money::from_cents(cents), stock))
            .await
            .unwrap()
            .id
    }

    impl TestApp {
        async fn call(
            &self,
            method: Method,
            uri: &str,
            user: Option<&str>,
            roles: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                builder = builder.header(USER_ID_HEADER, user);
            }
            if let Some(roles) = roles {
                builder = builder.header(ROLES_HEADER, roles);
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, json)
        }

        async fn add(&self, user: &str, product_id: &str, quantity: i64) -> (StatusCode, Value) {
            self.call(
                Method::POST,
                "/cart",
                Some(user),
                None,
                Some(json!({ "productId": product_id, "quantity": quantity })),
            )
            .await
        }

        async fn stock(&self, product_id: &str) -> i64 {
            self.db
                .products()
                .get_by_id(product_id)
                .await
                .unwrap()
                .unwrap()
                .stock
        }
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let (status, body) = app.call(Method::GET, "/health", None, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], "up");
    }

    #[tokio::test]
    async fn test_identity_required() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let (status, body) = app.call(Method::GET, "/cart", None, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");

        let (status, _) = app.call(Method::POST, "/orders/checkout", None, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_empty_cart_view_and_checkout() {
        let app = app_with(SimulatedGateway::approve_all()).await;

        let (status, body) = app.call(Method::GET, "/cart", Some("u-1"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["cartId"].is_null());
        assert_eq!(body["items"].as_array().unwrap().len(), 0);

        let (status, body) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_CART");
    }

    #[tokio::test]
    async fn test_add_to_cart_validation() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let a = product(&app.db, "Mug", 1000, 5).await;

        let (status, body) = app.add("u-1", &a, 0).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, body) = app.add("u-1", "missing", 1).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, body) = app
            .call(
                Method::POST,
                "/cart",
                Some("u-1"),
                None,
                Some(json!({ "quantity": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_checkout_pay_ship_flow() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let a = product(&app.db, "Mug", 1000, 5).await;
        let b = product(&app.db, "Bowl", 500, 5).await;

        assert_eq!(app.add("u-1", &a, 2).await.0, StatusCode::OK);
        let (status, cart) = app.add("u-1", &b, 1).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["total"], "25.00");

        let (status, order) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["status"], "Pending");
        assert_eq!(order["totalAmount"], "25.00");
        assert_eq!(order["items"].as_array().unwrap().len(), 2);
        assert_eq!(app.stock(&a).await, 3);
        assert_eq!(app.stock(&b).await, 4);

        let (_, cart) = app.call(Method::GET, "/cart", Some("u-1"), None, None).await;
        assert_eq!(cart["items"].as_array().unwrap().len(), 0);

        let id = order["id"].as_str().unwrap().to_string();

        let (status, paid) = app
            .call(Method::POST, &format!("/orders/{id}/pay"), Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["status"], "Paid");

        let (status, body) = app
            .call(Method::POST, &format!("/orders/{id}/ship"), Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");

        let (status, shipped) = app
            .call(
                Method::POST,
                &format!("/orders/{id}/ship"),
                Some("ops"),
                Some("admin"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(shipped["status"], "Shipped");

        let (status, body) = app
            .call(Method::POST, &format!("/orders/{id}/cancel"), Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn test_declined_payment_cancels_and_restocks() {
        let app = app_with(SimulatedGateway::decline_all()).await;
        let a = product(&app.db, "Mug", 1000, 5).await;
        app.add("u-1", &a, 2).await;

        let (_, order) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        let id = order["id"].as_str().unwrap().to_string();
        assert_eq!(app.stock(&a).await, 3);

        let (status, body) = app
            .call(Method::POST, &format!("/orders/{id}/pay"), Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "PAYMENT_DECLINED");
        assert_eq!(app.stock(&a).await, 5);

        let (_, order) = app
            .call(Method::GET, &format!("/orders/{id}"), Some("u-1"), None, None)
            .await;
        assert_eq!(order["status"], "Cancelled");
    }

    #[tokio::test]
    async fn test_insufficient_stock() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let a = product(&app.db, "Mug", 1000, 1).await;
        app.add("u-1", &a, 2).await;

        let (status, body) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["message"], format!("InsufficientStock:{a}"));
        assert_eq!(app.stock(&a).await, 1);
    }

    #[tokio::test]
    async fn test_order_access_rules() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let a = product(&app.db, "Mug", 1000, 5).await;
        app.add("u-1", &a, 1).await;
        let (_, order) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        let id = order["id"].as_str().unwrap().to_string();

        let (status, _) = app
            .call(Method::GET, &format!("/orders/{id}"), Some("u-2"), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(Method::POST, &format!("/orders/{id}/cancel"), Some("u-2"), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call(Method::GET, &format!("/orders/{id}"), Some("ops"), Some("admin"), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = app
            .call(Method::GET, "/orders/nope", Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, mine) = app.call(Method::GET, "/orders", Some("u-2"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_admin_listing_and_cancel() {
        let app = app_with(SimulatedGateway::approve_all()).await;
        let a = product(&app.db, "Mug", 1000, 5).await;
        app.add("u-1", &a, 1).await;
        let (_, order) = app
            .call(Method::POST, "/orders/checkout", Some("u-1"), None, None)
            .await;
        let id = order["id"].as_str().unwrap().to_string();
        app.call(Method::POST, &format!("/orders/{id}/pay"), Some("u-1"), None, None)
            .await;

        let (status, _) = app.call(Method::GET, "/orders/all", Some("u-1"), None, None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, all) = app
            .call(Method::GET, "/orders/all?status=Paid", Some("ops"), Some("admin"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all.as_array().unwrap().len(), 1);

        let (status, body) = app
            .call(Method::GET, "/orders/all?status=Lost", Some("ops"), Some("admin"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app
            .call(Method::POST, &format!("/admin/orders/{id}/cancel"), Some("u-1"), None, None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, cancelled) = app
            .call(
                Method::POST,
                &format!("/admin/orders/{id}/cancel"),
                Some("ops"),
                Some("admin"),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cancelled["status"], "Cancelled");
        assert_eq!(app.stock(&a).await, 5);
    }
}
