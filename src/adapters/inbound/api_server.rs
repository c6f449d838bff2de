//! Storefront API Server
//!
//! JSON HTTP API over the catalog, cart, checkout, orders and petitions.
//!
//! Identity comes from the `x-user-id` header (users are created on first
//! sight); carts are keyed by the `x-session-id` header, which is issued when
//! the client does not send one.

use crate::application::{CatalogService, LocationForm, OrderService, PetitionService};
use crate::domain::entities::{
    Item, MovieId, OrderId, PetitionId, PurchaseLocation, ReviewId, Stance, User, UserId,
};
use crate::domain::error::StoreError;
use crate::domain::ports::UserRepository;
use crate::infrastructure::{CircuitBreaker, ShutdownController};
use axum::{
    extract::{FromRequestParts, Path, Query, Request, State},
    http::{request::Parts, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USERNAME_HEADER: &str = "x-username";
pub const SESSION_HEADER: &str = "x-session-id";

// ===== Request / Response Bodies =====

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct PetitionRequest {
    #[serde(default)]
    pub movie_name: String,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub order_id: OrderId,
    pub total: i64,
    pub location: PurchaseLocation,
    pub items: Vec<Item>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub geocode_mode: String,
    pub providers: Vec<ProviderHealth>,
}

#[derive(Debug, Serialize)]
pub struct ProviderHealth {
    pub name: String,
    pub circuit: String,
    pub failures: u32,
}

// ===== Errors =====

/// Error returned by handlers.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "login required".to_string()),
            ApiError::Store(err) => {
                let status = match &err {
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::Forbidden(_) => StatusCode::FORBIDDEN,
                    StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
                    StoreError::Storage(_) => {
                        tracing::error!("request failed: {}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.to_string())
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ===== State =====

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub orders: Arc<OrderService>,
    pub petitions: Arc<PetitionService>,
    pub users: Arc<dyn UserRepository>,
    pub breaker: Arc<CircuitBreaker>,
    /// Geocoding providers in chain order.
    pub providers: Vec<&'static str>,
}

// ===== Extractors =====

/// The logged-in user, from `x-user-id` / `x-username`.
pub struct CurrentUser(pub User);

#[axum::async_trait]
impl FromRequestParts<ApiState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ApiState) -> ApiResult<Self> {
        let id: UserId = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .ok_or(ApiError::Unauthorized)?;

        let username = parts
            .headers
            .get(USERNAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("user{}", id));

        let candidate = User { id, username };
        state.users.ensure_user(&candidate).await?;
        let user = state.users.get_user(id).await?.unwrap_or(candidate);
        Ok(CurrentUser(user))
    }
}

/// The cart session id, guaranteed by `session_middleware`.
pub struct Session(pub String);

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> ApiResult<Self> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| Session(v.to_string()))
            .ok_or_else(|| ApiError::Store(StoreError::Invalid("missing session".to_string())))
    }
}

fn new_session_id() -> HeaderValue {
    HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("anonymous"))
}

/// Issue a session id when the client has none and echo it on the response.
async fn session_middleware(mut req: Request, next: Next) -> Response {
    let session = req
        .headers()
        .get(SESSION_HEADER)
        .filter(|v| v.to_str().map(|s| !s.trim().is_empty()).unwrap_or(false))
        .cloned()
        .unwrap_or_else(new_session_id);

    req.headers_mut().insert(SESSION_HEADER, session.clone());
    let mut response = next.run(req).await;
    response.headers_mut().insert(SESSION_HEADER, session);
    response
}

// ===== Server =====

/// Build the storefront router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Catalog
        .route("/movies", get(list_movies_handler))
        .route("/movies/rating-map", get(rating_map_handler))
        .route("/movies/:id", get(movie_detail_handler))
        .route("/movies/:id/reviews", post(create_review_handler))
        .route(
            "/movies/:id/reviews/:review_id",
            put(edit_review_handler).delete(delete_review_handler),
        )
        // Cart
        .route("/cart", get(cart_handler))
        .route("/cart/clear", post(clear_cart_handler))
        .route("/cart/purchase", post(purchase_handler))
        .route("/cart/:movie_id", post(add_to_cart_handler))
        // Orders
        .route("/orders", get(list_orders_handler))
        .route("/orders/:id/location", put(update_location_handler))
        // Petitions
        .route("/petitions", get(list_petitions_handler).post(create_petition_handler))
        .route("/petitions/:id/vote", post(vote_handler))
        .route("/petitions/:id/dislike", post(dislike_handler))
        .layer(middleware::from_fn(session_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP server for the storefront.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Serve until the controller signals shutdown.
    #[cfg_attr(coverage_nightly, coverage(off))]
    ///
    /// Consumes the server so the application state is released on return.
    pub async fn run(self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let app = router(self.state);

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("storefront API listening on {}", self.listen_addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("storefront API stopped");
        Ok(())
    }
}

// ===== Handlers =====

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let providers = state
        .providers
        .iter()
        .map(|name| {
            let metrics = state.breaker.get_metrics(name);
            ProviderHealth {
                name: name.to_string(),
                circuit: metrics.state.to_string(),
                failures: metrics.failures,
            }
        })
        .collect();

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        geocode_mode: state.orders.mode().to_string(),
        providers,
    })
}

async fn list_movies_handler(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<impl IntoResponse> {
    let movies = state.catalog.list_movies(params.search.as_deref()).await?;
    Ok(Json(movies))
}

async fn movie_detail_handler(
    State(state): State<ApiState>,
    Path(id): Path<MovieId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.movie_detail(id).await?))
}

async fn create_review_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<MovieId>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<Response> {
    let response = match state.catalog.add_review(id, user.id, &req.comment).await? {
        Some(review) => (StatusCode::CREATED, Json(serde_json::json!({
            "created": true,
            "review": review,
        })))
            .into_response(),
        None => Json(serde_json::json!({ "created": false })).into_response(),
    };
    Ok(response)
}

async fn edit_review_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((id, review_id)): Path<(MovieId, ReviewId)>,
    Json(req): Json<CommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let review = state
        .catalog
        .edit_review(id, review_id, user.id, &req.comment)
        .await?;
    Ok(Json(review))
}

async fn delete_review_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path((id, review_id)): Path<(MovieId, ReviewId)>,
) -> ApiResult<impl IntoResponse> {
    state.catalog.delete_review(id, review_id, user.id).await?;
    Ok(Json(serde_json::json!({ "id": review_id, "deleted": true })))
}

async fn rating_map_handler(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.orders.rating_map().await?))
}

async fn cart_handler(
    State(state): State<ApiState>,
    Session(session): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.catalog.cart(&session).await?))
}

async fn add_to_cart_handler(
    State(state): State<ApiState>,
    Session(session): Session,
    Path(movie_id): Path<MovieId>,
    Json(req): Json<QuantityRequest>,
) -> ApiResult<impl IntoResponse> {
    let cart = state
        .catalog
        .add_to_cart(&session, movie_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

async fn clear_cart_handler(
    State(state): State<ApiState>,
    Session(session): Session,
) -> impl IntoResponse {
    state.catalog.clear_cart(&session).await;
    Json(serde_json::json!({ "cleared": true }))
}

async fn purchase_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Session(session): Session,
    Json(form): Json<LocationForm>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.orders.checkout(user.id, &session, form).await?;
    let response = PurchaseResponse {
        order_id: detail.order.id,
        total: detail.order.total,
        location: detail.order.location,
        items: detail.items,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_orders_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.orders.orders_for_user(user.id).await?))
}

async fn update_location_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<OrderId>,
    Json(form): Json<LocationForm>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.orders.update_location(user.id, id, form).await?))
}

async fn list_petitions_handler(State(state): State<ApiState>) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.petitions.list().await?))
}

async fn create_petition_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<PetitionRequest>,
) -> ApiResult<impl IntoResponse> {
    let petition = state.petitions.create(&req.movie_name, user.id).await?;
    Ok((StatusCode::CREATED, Json(petition)))
}

async fn vote_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<PetitionId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.petitions.toggle(id, user.id, Stance::Vote).await?))
}

async fn dislike_handler(
    State(state): State<ApiState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<PetitionId>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.petitions.toggle(id, user.id, Stance::Dislike).await?))
}
