use crate::db::BlogStore;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Storage handle for the probes
#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn BlogStore>,
}

impl HealthState {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health(state: web::Data<HealthState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "blog-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("store unavailable: {}", e.message()),
            "service": "blog-service"
        })),
    }
}

pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.store.ping().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let ready = result.is_ok();
    let check = match result {
        Ok(()) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "store reachable".to_string(),
            latency_ms,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("store ping failed: {}", e.message()),
            latency_ms,
        },
    };

    let response = ReadinessResponse {
        ready,
        status: check.status.clone(),
        checks: HashMap::from([("store".to_string(), check)]),
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn live() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
