/// HTTP request plumbing for yatube-service
///
/// Provides bearer-credential extraction, request metrics and the ownership
/// policy. Credentials are only *parsed* here; resolving them to an actor is an
/// explicit step every handler performs through `AuthService`.
pub mod permissions;

pub use permissions::*;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http::header, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;

// =====================================================================
// Bearer credentials
// =====================================================================

/// Raw credential carried by the `Authorization` header.
///
/// Both `Bearer <token>` and `Token <token>` schemes are accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BearerCredentials {
    Missing,
    Malformed,
    Token(String),
}

impl BearerCredentials {
    pub fn from_header(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return BearerCredentials::Missing;
        };

        let mut parts = value.trim().splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().unwrap_or_default().trim();

        let known_scheme =
            scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
        if !known_scheme || token.is_empty() || token.contains(' ') {
            return BearerCredentials::Malformed;
        }

        BearerCredentials::Token(token.to_string())
    }
}

impl FromRequest for BearerCredentials {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let credentials = match req.headers().get(header::AUTHORIZATION) {
            None => BearerCredentials::Missing,
            Some(value) => match value.to_str() {
                Ok(value) => BearerCredentials::from_header(Some(value)),
                Err(_) => BearerCredentials::Malformed,
            },
        };

        ready(Ok(credentials))
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

/// Records request counts and latency, labelled by matched route pattern.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await?;
            let route = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| "unmatched".to_string());
            let status = res.status().as_u16().to_string();
            let elapsed = start.elapsed();

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, &status])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route, &status])
                .observe(elapsed.as_secs_f64());

            tracing::debug!(%method, %route, %status, elapsed_ms = elapsed.as_millis() as u64, "request completed");
            Ok(res)
        })
    }
}
