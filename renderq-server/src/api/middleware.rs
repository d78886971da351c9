//! Request gate and caller extractors
//!
//! Every job route passes through [`tenant_gate`]: it resolves the tenant,
//! runs the auth gate and only then lets the request reach a handler.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::api::error::ApiError;
use crate::auth::{SECRET_HEADER, bearer_token};
use crate::tenant::{TENANT_HEADER, TenantDirectory};

pub async fn tenant_gate(
    State(directory): State<Arc<TenantDirectory>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let headers = req.headers();

    let name = header_str(headers, TENANT_HEADER);
    let tenant = directory.resolve(name).ok_or_else(|| {
        tracing::warn!("Rejected request for unknown tenant {:?}", name);
        ApiError::UnknownTenant
    })?;

    let secret = header_str(headers, SECRET_HEADER);
    let bearer = header_str(headers, AUTHORIZATION.as_str()).and_then(bearer_token);

    if tenant.credentials().admit(secret, bearer).is_err() {
        tracing::warn!(
            "Rejected unauthenticated {} {} for tenant {}",
            req.method(),
            req.uri().path(),
            tenant.name()
        );
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(tenant);
    Ok(next.run(req).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Network origin of the caller, recorded as a job's creator or executor
///
/// Taken from `x-forwarded-for` (first hop), then `cf-connecting-ip`, then
/// the peer address of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerOrigin(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for CallerOrigin {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = header_str(&parts.headers, "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let origin = forwarded
            .or_else(|| header_str(&parts.headers, "cf-connecting-ip"))
            .map(str::to_string)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            });

        Ok(CallerOrigin(origin))
    }
}
