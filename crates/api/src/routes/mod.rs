//! API route definitions.

use axum::{Router, middleware};
use quarry_shared::{AuditEvent, log_audit, types::PageRequest};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{AuthUser, auth::auth_middleware},
};

pub mod health;
pub mod invoices;
pub mod ledger;
pub mod merge;
pub mod payments;
pub mod reports;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(payments::routes())
        .merge(invoices::routes())
        .merge(merge::routes())
        .merge(ledger::routes())
        .merge(reports::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new().merge(health::routes()).merge(protected_routes)
}

/// Paging parameters shared by every list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default 50, max 200).
    pub per_page: Option<u32>,
}

impl PageQuery {
    /// Converts to a repository page request, filling defaults.
    #[must_use]
    pub fn to_request(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Parses an optional id from a query string. Blank values count as absent.
pub(crate) fn parse_uuid(value: Option<&str>, code: &'static str) -> ApiResult<Option<Uuid>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Uuid::parse_str(text)
            .map(Some)
            .map_err(|_| ApiError::bad_request(code, format!("Invalid id: {text}"))),
    }
}

/// Sends an audit event stamped with the acting user.
pub(crate) fn audit(state: &AppState, auth: &AuthUser, event: AuditEvent) {
    log_audit(&state.audit, event.actor(auth.user_id(), auth.email()));
}
