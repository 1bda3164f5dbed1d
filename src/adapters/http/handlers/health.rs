use actix_web::HttpResponse;

use crate::adapters::http::dtos::HealthResponse;

/// GET /health
pub async fn health_check() -> HttpResponse {
  HttpResponse::Ok().json(HealthResponse { status: "ok" })
}
