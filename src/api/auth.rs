use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::{ApiError, AppState};

pub const ADMIN_HEADER: &str = "x-admin-password";

/// Proof that the request carried the admin password.
#[derive(Debug, Clone, Copy)]
pub struct AdminGuard;

impl AppState {
    pub fn authorize(&self, headers: &HeaderMap) -> Result<AdminGuard, ApiError> {
        let Some(expected) = self.admin_password.as_deref() else {
            return Err(ApiError::unauthorized("Admin access is not configured"));
        };
        let supplied = headers
            .get(ADMIN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if supplied != expected {
            return Err(ApiError::unauthorized("Invalid admin password"));
        }
        Ok(AdminGuard)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminGuard {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.authorize(&parts.headers)
    }
}
