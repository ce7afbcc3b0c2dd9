use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub username: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
}
