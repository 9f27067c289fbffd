/// Liveness and readiness probes. Neither requires credentials.
use crate::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use std::time::Instant;

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "yatube-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready once the store answers a ping.
pub async fn readiness(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.content.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HttpResponse::Ok().json(json!({
            "ready": true,
            "store": { "status": "healthy", "latency_ms": latency_ms },
            "timestamp": Utc::now().to_rfc3339(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, latency_ms, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(json!({
                "ready": false,
                "store": { "status": "unhealthy", "latency_ms": latency_ms },
                "timestamp": Utc::now().to_rfc3339(),
            }))
        }
    }
}
