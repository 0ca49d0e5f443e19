//! HTTP tests for listing and form request guards
//!
//! These tests drive a small router through axum-test and check the status
//! codes and bodies clients see.

use axum::{
    Extension,
    http::StatusCode,
    middleware,
};
use axum_test::TestServer;
use bazaar::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;

// =============================================================================
// Test Forms
// =============================================================================

#[derive(Default)]
struct CreateService;

#[async_trait]
impl FormRequest for CreateService {
    fn policy(&self) -> AuthPolicy {
        AuthPolicy::HasRole(vec!["PROVIDER".into()])
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .field("title", "required|string|min:3")
            .field("price", "required|numeric")
            .field("providerId", "required|integer")
    }
}

#[derive(Default)]
struct RegisterUser;

#[async_trait]
impl FormRequest for RegisterUser {
    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .field("name", "required|string")
            .field("email", "required|email")
            .field("address.city", "required")
    }
}

#[derive(Default)]
struct Misconfigured;

#[async_trait]
impl FormRequest for Misconfigured {
    fn rules(&self) -> RuleSet {
        RuleSet::new().field("name", "required|no_such_rule")
    }
}

// =============================================================================
// Test Server
// =============================================================================

#[derive(Clone)]
struct AppState {
    services: Repository<InMemoryStore>,
}

async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> BazaarResult<ListResult<Value>> {
    Ok(state
        .services
        .paginate_from_query(&query)
        .find_all(query.to_find_many())
        .await?)
}

async fn list_all_services(State(state): State<AppState>) -> BazaarResult<ListResult<Value>> {
    Ok(state.services.find_all(FindMany::new()).await?)
}

async fn create_service(
    State(state): State<AppState>,
    Validated(data, _): Validated<CreateService>,
) -> BazaarResult<(StatusCode, Json<Value>)> {
    Ok((StatusCode::CREATED, Json(state.services.create(data).await?)))
}

async fn echo(ValidatedData(data): ValidatedData) -> Json<Value> {
    Json(data)
}

async fn echo_misconfigured(Validated(data, _): Validated<Misconfigured>) -> Json<Value> {
    Json(data)
}

async fn echo_user_in_path(
    Path(id): Path<String>,
    ValidatedData(data): ValidatedData,
) -> Json<Value> {
    Json(json!({"path": id, "data": data}))
}

#[derive(Default)]
struct UpdateUser;

#[async_trait]
impl FormRequest for UpdateUser {
    fn rules(&self) -> RuleSet {
        RuleSet::new().field("id", "required|integer").field("name", "string")
    }
}

fn app_with(auth: Option<AuthContext>, config: ValidationConfig) -> TestServer {
    let services = Arc::new(InMemoryStore::with_records(
        "services",
        (1..=7).map(|i| json!({"title": format!("Service {}", i), "price": i, "providerId": 1})),
    ));
    let state = AppState {
        services: Repository::new(services),
    };

    let mut app = Router::new()
        .route("/services", get(list_services).post(create_service))
        .route("/services/all", get(list_all_services))
        .route(
            "/users",
            post(echo).route_layer(middleware::from_fn(validate::<RegisterUser>)),
        )
        .route(
            "/users/{id}",
            put(echo_user_in_path).route_layer(middleware::from_fn(validate::<UpdateUser>)),
        )
        .route("/broken", post(echo_misconfigured))
        .with_state(state)
        .layer(Extension(config));

    if let Some(auth) = auth {
        app = app.layer(Extension(auth));
    }

    TestServer::new(app)
}

fn provider() -> Option<AuthContext> {
    Some(AuthContext::User {
        user_id: 1,
        roles: vec!["PROVIDER".to_string()],
    })
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_paginated_list_envelope() {
    let server = app_with(None, ValidationConfig::default());

    let response = server.get("/services?page=2&limit=3").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"][0]["title"], "Service 4");
    assert_eq!(body["meta"]["total"], 7);
    assert_eq!(body["meta"]["page"], 2);
    assert_eq!(body["meta"]["limit"], 3);
    assert_eq!(body["meta"]["lastPage"], 3);
}

#[tokio::test]
async fn test_garbage_paging_uses_defaults() {
    let server = app_with(None, ValidationConfig::default());

    let response = server.get("/services?page=abc&limit=-1").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 10);
    assert_eq!(body["meta"]["lastPage"], 1);
}

#[tokio::test]
async fn test_filter_and_sort_from_query() {
    let server = app_with(None, ValidationConfig::default());

    let response = server
        .get("/services")
        .add_query_param("filter", r#"{"price>=": 5}"#)
        .add_query_param("sort", "price:desc")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let prices: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["price"].as_i64())
        .collect();
    assert_eq!(prices, vec![7, 6, 5]);
    assert_eq!(body["meta"]["total"], 3);
}

#[tokio::test]
async fn test_unpaginated_list_has_no_meta() {
    let server = app_with(None, ValidationConfig::default());

    let response = server.get("/services/all").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 7);
    assert!(body.get("meta").is_none());
}

// =============================================================================
// Validated extractor
// =============================================================================

#[tokio::test]
async fn test_forbidden_without_role() {
    let server = app_with(None, ValidationConfig::default());

    let response = server
        .post("/services")
        .json(&json!({"title": "Haircut", "price": 30, "providerId": 1}))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"], "Forbidden");
    assert!(body["message"].is_string());
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_invalid_input_returns_422_with_field_errors() {
    let server = app_with(provider(), ValidationConfig::default());

    let response = server
        .post("/services")
        .json(&json!({"title": "Ha", "price": "free"}))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["message"], "The given data was invalid");
    assert_eq!(
        body["errors"],
        json!({
            "title": ["The title field must be at least 3 characters"],
            "price": ["The price field must be a number"],
            "providerId": ["The providerId field is required"],
        })
    );
}

#[tokio::test]
async fn test_valid_input_reaches_handler_with_declared_fields_only() {
    let server = app_with(provider(), ValidationConfig::default());

    let response = server
        .post("/services")
        .json(&json!({"title": "Haircut", "price": 30, "providerId": 1, "featured": true}))
        .await;

    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["title"], "Haircut");
    assert_eq!(body["id"], 8);
    assert!(body.get("featured").is_none());
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let server = app_with(provider(), ValidationConfig::default());

    let response = server.post("/services").text("{\"title\": ").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn test_misconfigured_form_returns_500() {
    let server = app_with(None, ValidationConfig::default());

    let response = server.post("/broken").json(&json!({"name": "x"})).await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "Internal Server Error");
    assert_eq!(body["message"], "Internal server error");
    assert!(!body.to_string().contains("no_such_rule"));
}

#[tokio::test]
async fn test_config_extension_changes_behavior() {
    let config = ValidationConfig {
        locale: Locale::PtBr,
        unknown_rules: UnknownRulePolicy::Ignore,
    };
    let server = app_with(None, config);

    let response = server.post("/broken").json(&json!({})).await;
    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["errors"]["name"][0], "O campo name é obrigatório");

    let response = server.post("/broken").json(&json!({"name": "x"})).await;
    response.assert_status_ok();
}

// =============================================================================
// validate middleware
// =============================================================================

#[tokio::test]
async fn test_middleware_attaches_validated_data() {
    let server = app_with(None, ValidationConfig::default());

    let response = server
        .post("/users")
        .json(&json!({
            "name": "Ana",
            "email": "ana@example.com",
            "address": {"city": "Recife", "street": "Rua A"},
            "role": "ADMIN"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(
        body,
        json!({"name": "Ana", "email": "ana@example.com", "address": {"city": "Recife"}})
    );
}

#[tokio::test]
async fn test_middleware_rejects_before_handler() {
    let server = app_with(None, ValidationConfig::default());

    let response = server.post("/users").json(&json!({"name": "Ana"})).await;

    assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert!(body["errors"]["email"].is_array());
    assert!(body["errors"]["address.city"].is_array());
}

#[tokio::test]
async fn test_path_params_take_precedence() {
    let server = app_with(None, ValidationConfig::default());

    let response = server
        .put("/users/12")
        .add_query_param("id", "99")
        .json(&json!({"id": 7, "name": "Ana"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["path"], "12");
    assert_eq!(body["data"], json!({"id": "12", "name": "Ana"}));
}
