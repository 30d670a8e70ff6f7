pub mod health_handler;
pub mod quiz_handler;

use actix_cors::Cors;
use actix_web::{
    error::JsonPayloadError,
    guard,
    http::header::{self, HeaderName},
    middleware::DefaultHeaders,
    web, HttpRequest, HttpResponse,
};

use crate::errors::AppError;

pub use health_handler::{healthz, index, ping};
pub use quiz_handler::{generate_quiz, grade_quiz, method_not_allowed, preflight};

/// Every route, the JSON body limits, and the fallbacks for OPTIONS and unknown paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(
            web::resource("/{tail:.*}")
                .guard(guard::Options())
                .to(preflight),
        )
        .service(index)
        .service(ping)
        .service(healthz)
        .service(
            web::resource("/api/generate-quiz")
                .route(web::post().to(generate_quiz))
                .default_service(web::to(method_not_allowed)),
        )
        .service(
            web::resource("/api/grade-quiz")
                .route(web::post().to(grade_quiz))
                .default_service(web::to(method_not_allowed)),
        )
        .default_service(web::to(not_found));
}

async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!("No route for {}", req.path())))
}

/// Malformed or oversized bodies surface as validation errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(1024 * 1024)
        .error_handler(|err: JsonPayloadError, _req| {
            AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
        })
}

/// Answers cross-origin requests with a wildcard origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
        .disable_preflight()
        .max_age(3600)
}

/// CORS headers set on every response that does not already carry them.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .add((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"))
        .add((
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            "Content-Type, Authorization, X-Requested-With, Accept",
        ))
        .add((
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            "Content-Type, Authorization",
        ))
}
