//! Caller identity extractor.
//!
//! The auth collaborator terminates tokens upstream and forwards the
//! resolved identity as headers. This extractor only reads them.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;

use crate::domain::foundation::UserId;

use super::ErrorResponse;

const USER_ID_HEADER: &str = "x-user-id";
const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: UserId,
    pub is_vendor: bool,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(unauthorized)?;
        let user_id = UserId::new(raw).map_err(|_| unauthorized())?;

        let is_vendor = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|role| role.eq_ignore_ascii_case("vendor"))
            .unwrap_or(false);

        Ok(Caller { user_id, is_vendor })
    }
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("UNAUTHORIZED", "Missing caller identity")),
    )
}
