use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionGrade {
    pub index: usize,
    pub correct_answer: Option<String>,
    pub user_answer: Option<String>,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub score: usize,
    pub total: usize,
    pub percent: f64,
    pub results: Vec<QuestionGrade>,
}
