//! # Bazaar API
//!
//! REST surface of the back office. Every route is a thin handler over a
//! bazaar-db repository; the two checkout routes (`POST /basket`,
//! `PUT /end-sell/{id}`) go through the checkout transaction.
//!
//! ## Routes
//! ```text
//! POST   /basket              add to basket       GET /basket/{id}  GET /baskets  DELETE /basket/{id}
//! PUT    /end-sell/{id}       settle sale
//! POST   /sale                GET/PUT/DELETE /sale/{id}             GET /sales
//! POST   /category            GET/PUT/DELETE /category/{id}         GET /categories
//! POST   /product             GET/PUT/DELETE /product/{id}          GET /products
//! POST   /branch              GET/PUT/DELETE /branch/{id}           GET /branches
//! POST   /repository          GET/PUT/DELETE /repository/{id}       GET /repositories
//! POST   /staff-tariff        GET/PUT/DELETE /staff-tariff/{id}     GET /staff-tariffs
//! POST   /staff               GET/PUT/PATCH/DELETE /staff/{id}      GET /staffs
//! POST   /transaction         GET/PUT/DELETE /transaction/{id}      GET /transactions
//! POST   /rtransaction        GET /rtransaction/{id}                GET /rtransactions
//! GET    /health
//! ```

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use bazaar_db::Database;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::handlers::{
    basket, branch, category, health, ledger, product, sale, staff, stock, tariff, transaction,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        AppState {
            db,
            settings: Arc::new(settings),
        }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        // Checkout
        .route("/basket", post(basket::add))
        .route("/basket/{id}", get(basket::get).delete(basket::delete))
        .route("/baskets", get(basket::list))
        .route("/end-sell/{id}", put(sale::settle))
        // Sales
        .route("/sale", post(sale::create))
        .route(
            "/sale/{id}",
            get(sale::get).put(sale::update).delete(sale::delete),
        )
        .route("/sales", get(sale::list))
        // Catalog
        .route("/category", post(category::create))
        .route(
            "/category/{id}",
            get(category::get)
                .put(category::update)
                .delete(category::delete),
        )
        .route("/categories", get(category::list))
        .route("/product", post(product::create))
        .route(
            "/product/{id}",
            get(product::get).put(product::update).delete(product::delete),
        )
        .route("/products", get(product::list))
        // Branches and stock
        .route("/branch", post(branch::create))
        .route(
            "/branch/{id}",
            get(branch::get).put(branch::update).delete(branch::delete),
        )
        .route("/branches", get(branch::list))
        .route("/repository", post(stock::create))
        .route(
            "/repository/{id}",
            get(stock::get).put(stock::update).delete(stock::delete),
        )
        .route("/repositories", get(stock::list))
        // Staff
        .route("/staff-tariff", post(tariff::create))
        .route(
            "/staff-tariff/{id}",
            get(tariff::get).put(tariff::update).delete(tariff::delete),
        )
        .route("/staff-tariffs", get(tariff::list))
        .route("/staff", post(staff::create))
        .route(
            "/staff/{id}",
            get(staff::get)
                .put(staff::update)
                .patch(staff::change_password)
                .delete(staff::delete),
        )
        .route("/staffs", get(staff::list))
        // Money and stock movements
        .route("/transaction", post(transaction::create))
        .route(
            "/transaction/{id}",
            get(transaction::get)
                .put(transaction::update)
                .delete(transaction::delete),
        )
        .route("/transactions", get(transaction::list))
        .route("/rtransaction", post(ledger::create))
        .route("/rtransaction/{id}", get(ledger::get))
        .route("/rtransactions", get(ledger::list))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Router Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use bazaar_db::DbConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn app() -> Router {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        router(AppState::new(db, Settings::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(serde_json::to_vec(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn create(app: &Router, uri: &str, body: Value) -> Value {
        let (status, value) = send(app, "POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}: {value}");
        value
    }

    /// A branch with one cashier, one product priced 100 and `stock` units.
    async fn shop(app: &Router, stock: i64) -> (String, String, String) {
        let branch = create(app, "/branch", json!({"name": "Chorsu", "address": "Row 4"})).await;
        let branch_id = branch["id"].as_str().unwrap().to_string();

        let cashier = create(
            app,
            "/staff",
            json!({
                "branch_id": branch_id,
                "staff_type": "cashier",
                "name": "Dilnoza",
                "birth_date": "1996-05-20",
                "login": "dilnoza",
                "password": "secret1"
            }),
        )
        .await;
        let cashier_id = cashier["id"].as_str().unwrap().to_string();

        let product = create(
            app,
            "/product",
            json!({"name": "Green Tea", "price_cents": 100, "barcode": "4780000000001"}),
        )
        .await;
        let product_id = product["id"].as_str().unwrap().to_string();

        create(
            app,
            "/repository",
            json!({"product_id": product_id, "branch_id": branch_id, "count": stock}),
        )
        .await;

        (branch_id, cashier_id, product_id)
    }

    async fn open_sale(app: &Router, branch_id: &str, cashier_id: &str) -> String {
        let sale = create(
            app,
            "/sale",
            json!({
                "branch_id": branch_id,
                "cashier_id": cashier_id,
                "payment_type": "cash",
                "client_name": "Walk-in"
            }),
        )
        .await;
        assert_eq!(sale["status"], "in_process");
        assert_eq!(sale["price_cents"], 0);
        sale["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
        assert_eq!(body["migrations_applied"], body["migrations_total"]);
    }

    #[tokio::test]
    async fn test_basket_and_settlement_flow() {
        let app = app().await;
        let (branch_id, cashier_id, product_id) = shop(&app, 5).await;
        let sale_id = open_sale(&app, &branch_id, &cashier_id).await;

        let add = |quantity: i64| {
            json!({"sale_id": sale_id, "product_id": product_id, "quantity": quantity})
        };

        let line = create(&app, "/basket", add(3)).await;
        assert_eq!(line["quantity"], 3);
        assert_eq!(line["price_cents"], 300);

        let line = create(&app, "/basket", add(2)).await;
        assert_eq!(line["quantity"], 5);
        assert_eq!(line["price_cents"], 500);

        let (status, body) = send(&app, "POST", "/basket", Some(add(1))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let (status, baskets) =
            send(&app, "GET", &format!("/baskets?sale_id={sale_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(baskets["count"], 1);

        let (status, sale) = send(&app, "PUT", &format!("/end-sell/{sale_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sale["status"], "success");
        assert_eq!(sale["price_cents"], 500);

        let (_, stock) = send(
            &app,
            "GET",
            &format!("/repositories?product_id={product_id}&branch_id={branch_id}"),
            None,
        )
        .await;
        assert_eq!(stock["items"][0]["count"], 0);

        let (_, ledger) = send(&app, "GET", &format!("/rtransactions?product_id={product_id}"), None).await;
        assert_eq!(ledger["count"], 1);
        assert_eq!(ledger["items"][0]["direction"], "minus");
        assert_eq!(ledger["items"][0]["quantity"], 5);
        assert_eq!(ledger["items"][0]["staff_id"], cashier_id.as_str());

        let (status, body) = send(&app, "PUT", &format!("/end-sell/{sale_id}"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "BUSINESS_LOGIC");
    }

    #[tokio::test]
    async fn test_settling_empty_sale_is_rejected() {
        let app = app().await;
        let (branch_id, cashier_id, _) = shop(&app, 5).await;
        let sale_id = open_sale(&app, &branch_id, &cashier_id).await;

        let (status, body) = send(&app, "PUT", &format!("/end-sell/{sale_id}"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_ids_and_missing_resources() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/sale/42", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let missing = "550e8400-e29b-41d4-a716-446655440000";
        let (status, body) = send(&app, "GET", &format!("/product/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = send(&app, "PUT", &format!("/end-sell/{missing}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_json_body() {
        let app = app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/branch")
            .header("content-type", "application/json")
            .body(Body::from("not json"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_conflicts() {
        let app = app().await;
        let product = json!({"name": "Milk", "price_cents": 1000, "barcode": "4780000000009"});

        create(&app, "/product", product.clone()).await;
        let (status, body) = send(&app, "POST", "/product", Some(product)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_staff_view_and_password_change() {
        let app = app().await;
        let (_, cashier_id, _) = shop(&app, 1).await;

        let (status, staff) = send(&app, "GET", &format!("/staff/{cashier_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(staff["age"].as_u64().unwrap() >= 30);
        assert!(staff.get("password_hash").is_none());

        let uri = format!("/staff/{cashier_id}");
        let (status, body) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({"old_password": "wrong-one", "new_password": "secret2"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = send(
            &app,
            "PATCH",
            &uri,
            Some(json!({"old_password": "secret1", "new_password": "secret2"})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_transactions_filter_by_amount() {
        let app = app().await;
        let (_, cashier_id, _) = shop(&app, 1).await;

        for amount in [500, 1_500, 3_000] {
            create(
                &app,
                "/transaction",
                json!({
                    "staff_id": cashier_id,
                    "transaction_type": "topup",
                    "source_type": "sales",
                    "amount_cents": amount,
                    "description": "shift"
                }),
            )
            .await;
        }

        let (status, page) = send(
            &app,
            "GET",
            "/transactions?from_amount=1000&to_amount=3000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["count"], 2);
        assert_eq!(page["items"][0]["amount_cents"], 1_500);

        let (status, _) = send(&app, "GET", "/transactions?from_amount=9&to_amount=1", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
