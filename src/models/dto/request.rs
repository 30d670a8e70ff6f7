use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use validator::Validate;

use crate::errors::{AppError, AppResult};
use crate::models::domain::quiz::{DEFAULT_NUM_MCQ, DEFAULT_NUM_TF};
use crate::models::domain::{Question, QuizRequest};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateQuizRequestDto {
    #[validate(length(min = 1, max = 100, message = "subject is required"))]
    #[serde(default)]
    pub subject: String,

    #[validate(length(min = 1, max = 20, message = "grade is required"))]
    #[serde(default, deserialize_with = "string_or_number")]
    pub grade: String,

    #[validate(length(max = 200))]
    #[serde(default)]
    pub topic: String,

    #[validate(range(max = 50))]
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_mcq: Option<u32>,

    #[validate(range(max = 50))]
    #[serde(default, deserialize_with = "lenient_count")]
    pub num_tf: Option<u32>,

    #[serde(default)]
    pub force_regen: bool,
}

impl GenerateQuizRequestDto {
    pub fn into_quiz_request(self) -> AppResult<QuizRequest> {
        self.validate()?;

        let request = QuizRequest {
            subject: self.subject.trim().to_string(),
            grade: self.grade.trim().to_string(),
            topic: self.topic.trim().to_string(),
            num_mcq: self.num_mcq.unwrap_or(DEFAULT_NUM_MCQ),
            num_tf: self.num_tf.unwrap_or(DEFAULT_NUM_TF),
            force_regen: self.force_regen,
        };

        if request.subject.is_empty() || request.grade.is_empty() {
            return Err(AppError::ValidationError(
                "subject and grade are required".to_string(),
            ));
        }
        if request.total() == 0 {
            return Err(AppError::ValidationError(
                "at least one question must be requested".to_string(),
            ));
        }

        Ok(request)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GradeQuizRequestDto {
    #[validate(length(min = 1, max = 100, message = "questions must not be empty"))]
    pub questions: Vec<Question>,

    /// Chosen option per question index. Unanswered questions are simply absent.
    #[serde(default)]
    pub answers: HashMap<usize, String>,
}

/// Accepts `"10"` as well as `10`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Numbers or numeric strings; anything else counts as absent so the default applies.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
