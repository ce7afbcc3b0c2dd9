use uuid::Uuid;

use crate::{
    dto::history::{LoginHistoryList, RecordLoginRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::LoginRecord,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Unauthenticated by design; the original exposed this to a service-role
/// caller. Any insert failure (typically the foreign key rejecting an
/// unknown username) comes back as a 400 with the database message.
pub async fn record_login(
    state: &AppState,
    payload: RecordLoginRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    sqlx::query(
        r#"
        INSERT INTO login_history (id, username, login_success)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&username)
    .bind(payload.login_success)
    .execute(&state.pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(db) => AppError::BadRequest(db.message().to_string()),
        other => AppError::DbError(other),
    })?;

    Ok(ApiResponse::success(
        "Recorded",
        serde_json::json!({ "ok": true }),
        Some(Meta::empty()),
    ))
}

pub async fn list_history(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<LoginHistoryList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let items: Vec<LoginRecord> = sqlx::query_as(
        "SELECT * FROM login_history ORDER BY login_time DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT count(*) FROM login_history")
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "OK",
        LoginHistoryList { items },
        Some(meta),
    ))
}
