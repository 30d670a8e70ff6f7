use std::{any::Any, panic::AssertUnwindSafe, time::Instant};

use actix_web::{web, HttpRequest, HttpResponse};
use futures::FutureExt;
use validator::Validate;

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{GenerateQuizRequestDto, GradeQuizRequestDto},
    services::grading_service,
};

/// `POST /api/generate-quiz`
pub async fn generate_quiz(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<GenerateQuizRequestDto>,
) -> Result<HttpResponse, AppError> {
    let request_id = get_request_id(&req).unwrap_or_default();
    let request = body.into_inner().into_quiz_request()?;
    let orchestrator = state.orchestrator()?;

    log::info!(
        "[{}] Generating quiz: subject={}, grade={}, topic={:?}, mcq={}, tf={}, force_regen={}",
        request_id,
        request.subject,
        request.grade,
        request.topic,
        request.num_mcq,
        request.num_tf,
        request.force_regen
    );
    let started = Instant::now();

    let result = AssertUnwindSafe(orchestrator.generate(&request))
        .catch_unwind()
        .await
        .map_err(|payload| {
            AppError::InternalError(format!(
                "[{}] quiz generation panicked: {}",
                request_id,
                panic_detail(payload.as_ref())
            ))
        })?;

    if result.is_empty() {
        log::error!("[{}] No questions could be generated", request_id);
        return Err(AppError::ModelUnavailable(
            "no questions could be generated, please try again".to_string(),
        ));
    }

    log::info!(
        "[{}] Returning {} question(s) after {} ms",
        request_id,
        result.len(),
        started.elapsed().as_millis()
    );
    Ok(HttpResponse::Ok().json(result))
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|msg| msg.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// `POST /api/grade-quiz`
pub async fn grade_quiz(body: web::Json<GradeQuizRequestDto>) -> Result<HttpResponse, AppError> {
    let request = body.into_inner();
    request.validate()?;

    let report = grading_service::grade(&request.questions, &request.answers);
    Ok(HttpResponse::Ok().json(report))
}

pub async fn method_not_allowed() -> Result<HttpResponse, AppError> {
    Err(AppError::MethodNotAllowed)
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}
