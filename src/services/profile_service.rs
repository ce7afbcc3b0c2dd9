use crate::{
    audit::log_audit,
    dto::profile::UpdateProfileRequest,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Upsert-on-read: the first profile access creates a default row for the
/// identity, with role "user" and the email from the token.
async fn ensure_profile(state: &AppState, user: &AuthUser) -> AppResult<Profile> {
    let existing: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE id = $1")
        .bind(user.user_id)
        .fetch_optional(&state.pool)
        .await?;

    if let Some(profile) = existing {
        return Ok(profile);
    }

    let profile: Profile = sqlx::query_as(
        r#"
        INSERT INTO profiles (id, email)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE SET email = profiles.email
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(&user.email)
    .fetch_one(&state.pool)
    .await?;

    Ok(profile)
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = ensure_profile(state, user).await?;
    Ok(ApiResponse::success("OK", profile, Some(Meta::empty())))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let username = payload.username.trim().to_string();
    if username.is_empty() {
        return Err(AppError::BadRequest("username is required".into()));
    }

    let existing = ensure_profile(state, user).await?;

    let full_name = payload.full_name.unwrap_or(existing.full_name);
    let avatar_url = payload.avatar_url.unwrap_or(existing.avatar_url);
    let website = payload.website.unwrap_or(existing.website);

    let profile: Result<Profile, sqlx::Error> = sqlx::query_as(
        r#"
        UPDATE profiles
        SET username = $2, full_name = $3, avatar_url = $4, website = $5, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(&username)
    .bind(full_name)
    .bind(avatar_url)
    .bind(website)
    .fetch_one(&state.pool)
    .await;

    let profile = profile.map_err(|err| match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest("username is already taken".into())
        }
        _ => AppError::DbError(err),
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "profile_update",
        Some("profiles"),
        Some(serde_json::json!({ "username": profile.username })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Profile updated",
        profile,
        Some(Meta::empty()),
    ))
}
