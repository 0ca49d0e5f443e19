//! Marketplace API example
//!
//! This example demonstrates:
//! - Paginated listing (`GET /services?page=2&limit=5`)
//! - A form request guarding a handler through the `Validated` extractor
//! - The `validate` middleware attaching `ValidatedData` to the request
//! - Role-based authorization from a (fake) header-based auth layer
//!
//! ```text
//! curl 'localhost:3000/services?page=1&limit=2&sort=price:desc'
//! curl -X POST localhost:3000/services -H 'x-user-id: 1' -H 'x-user-role: PROVIDER' \
//!      -H 'content-type: application/json' -d '{"title": "Haircut", "price": 30}'
//! ```

use axum::{
    Extension,
    body::Body,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
};
use bazaar::prelude::*;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct CreateService;

#[async_trait]
impl FormRequest for CreateService {
    fn policy(&self) -> AuthPolicy {
        AuthPolicy::HasRole(vec!["PROVIDER".into()])
    }

    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .field("title", "required|string|min:3|max:120")
            .field("description", "string|max:2000")
            .field("price", "required|numeric")
            .field("duration", "integer")
            .field("photo", "url")
    }

    fn messages(&self) -> Messages {
        Messages::new().set("price.required", "Every service needs a price")
    }
}

#[derive(Default)]
struct RegisterUser;

#[async_trait]
impl FormRequest for RegisterUser {
    fn rules(&self) -> RuleSet {
        RuleSet::new()
            .field("name", "required|string|max:255")
            .field("email", "required|email|unique:users,email")
            .field("password", "required|min:8|confirmed")
            .field("role", "required|in:CUSTOMER,PROVIDER")
            .field("phone", "phone")
            .field("address.city", "required|string")
            .field("address.state", "required|string|max:2")
    }

    fn registry(&self) -> RuleRegistry {
        RuleRegistry::new().register_fn("phone", |input| {
            let digits = input
                .value
                .and_then(Value::as_str)
                .map(|s| s.chars().filter(char::is_ascii_digit).count());
            match digits {
                Some(10 | 11) | None => None,
                Some(_) => Some(format!("The {} field must be a valid phone number", input.field)),
            }
        })
    }

    fn transform(&self, mut validated: Value) -> Result<Value> {
        // never echo the password back
        if let Some(fields) = validated.as_object_mut() {
            fields.remove("password");
        }
        Ok(validated)
    }
}

#[derive(Clone)]
struct AppState {
    services: Repository<InMemoryStore>,
    users: Repository<InMemoryStore>,
}

/// Stand-in for a real authentication layer
async fn header_auth(mut request: Request<Body>, next: Next) -> Response {
    let user_id = request
        .headers()
        .get("x-user-id")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.parse::<i64>().ok());
    let role = request
        .headers()
        .get("x-user-role")
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    if let Some(user_id) = user_id {
        let context = AuthContext::User {
            user_id,
            roles: role.into_iter().collect(),
        };
        request.extensions_mut().insert(context);
    }

    next.run(request).await
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

async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> BazaarResult<Json<Value>> {
    match state.services.find_by_id(id).await? {
        Some(service) => Ok(Json(service)),
        None => Err(bazaar::core::error::StorageError::NotFound {
            collection: "services".to_string(),
            id,
        }
        .into()),
    }
}

async fn create_service(
    State(state): State<AppState>,
    Validated(data, _): Validated<CreateService>,
) -> BazaarResult<(StatusCode, Json<Value>)> {
    let service = state.services.create(data).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

async fn register_user(
    State(state): State<AppState>,
    ValidatedData(data): ValidatedData,
) -> BazaarResult<(StatusCode, Json<Value>)> {
    let user = state.users.create(data).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marketplace=debug,bazaar=debug,tower_http=info")),
        )
        .init();

    let config = match std::env::var("BAZAAR_CONFIG") {
        Ok(path) => BazaarConfig::from_yaml_file(&path)?,
        Err(_) => BazaarConfig::default(),
    };
    tracing::info!(?config, "configuration loaded");

    let services = Arc::new(InMemoryStore::with_records(
        "services",
        vec![
            json!({"title": "Haircut", "price": 30, "providerId": 1}),
            json!({"title": "Manicure", "price": 25, "providerId": 2}),
            json!({"title": "Massage", "price": 80, "providerId": 1}),
            json!({"title": "Beard trim", "price": 15, "providerId": 3}),
            json!({"title": "Hair coloring", "price": 120, "providerId": 2}),
        ],
    ));
    let users = Arc::new(InMemoryStore::new("users"));

    let state = AppState {
        services: Repository::with_config(services, &config.pagination),
        users: Repository::with_config(users, &config.pagination),
    };

    let app = Router::new()
        .route("/services", get(list_services).post(create_service))
        .route("/services/{id}", get(get_service))
        .route(
            "/users",
            post(register_user).route_layer(middleware::from_fn(validate::<RegisterUser>)),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(Extension(config.validation))
                .layer(middleware::from_fn(header_auth)),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
