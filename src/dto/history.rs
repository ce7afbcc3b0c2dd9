use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::LoginRecord;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordLoginRequest {
    pub username: String,
    /// Callers that omit this field are recording a failed attempt; login
    /// reporters only send `true` on success.
    #[serde(default)]
    pub login_success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginHistoryList {
    pub items: Vec<LoginRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_login_success_means_failed_attempt() {
        let req: RecordLoginRequest = serde_json::from_str(r#"{"username":"alice"}"#).unwrap();
        assert!(!req.login_success);

        let req: RecordLoginRequest =
            serde_json::from_str(r#"{"username":"alice","login_success":true}"#).unwrap();
        assert!(req.login_success);
    }
}
