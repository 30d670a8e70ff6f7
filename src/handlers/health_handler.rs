use actix_web::{get, HttpResponse};

use crate::models::dto::{MessageResponse, StatusResponse};

pub const LIVENESS_MESSAGE: &str = "✅ AI_CHIRON26 backend is running";

#[get("/")]
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(MessageResponse {
        message: LIVENESS_MESSAGE.to_string(),
    })
}

#[get("/ping")]
pub async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(status_ok())
}

#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(status_ok())
}

fn status_ok() -> StatusResponse {
    StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }
}
