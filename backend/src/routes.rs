use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use log::warn;
use serde_json::json;

use crate::check::intake::{IntakeLimits, read_check_form};
use crate::check::{CheckError, CheckPipeline};

#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub started_at: DateTime<Utc>,
}

impl ServiceInfo {
    pub fn now() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/check").route(web::post().to(check)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn check(
    pipeline: web::Data<CheckPipeline>,
    limits: web::Data<IntakeLimits>,
    payload: Multipart,
) -> Result<HttpResponse, CheckError> {
    let form = read_check_form(payload, **limits).await.map_err(|e| {
        warn!("Rejected /check upload: {}", e);
        e
    })?;
    let response = pipeline.run(form).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn health(info: web::Data<ServiceInfo>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "started_at": info.started_at.to_rfc3339(),
    }))
}
