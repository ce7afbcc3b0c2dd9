use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};

use crate::{
    dto::history::{LoginHistoryList, RecordLoginRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::history_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_history))
        .route("/login", post(record_login))
}

#[utoipa::path(
    post,
    path = "/api/history/login",
    request_body = RecordLoginRequest,
    responses(
        (status = 200, description = "Record a login attempt"),
        (status = 400, description = "Missing or unknown username")
    ),
    tag = "History"
)]
pub async fn record_login(
    State(state): State<AppState>,
    Json(payload): Json<RecordLoginRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = history_service::record_login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/history",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Login history (admin only)", body = ApiResponse<LoginHistoryList>),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "History"
)]
pub async fn list_history(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<LoginHistoryList>>> {
    let resp = history_service::list_history(&state, &user, pagination).await?;
    Ok(Json(resp))
}
