use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::domain::quiz_question::{leading_token, option_body, Question, QuestionKind};

/// One question as a model emits it. Every field is optional so a single bad field
/// only drops its own question.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestionDto {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
}

impl RawQuestionDto {
    pub fn into_question(self) -> Option<Question> {
        let options: Vec<String> = self
            .options
            .iter()
            .map(|opt| opt.trim().to_string())
            .filter(|opt| !opt.is_empty())
            .collect();

        let kind = self
            .kind
            .as_deref()
            .and_then(QuestionKind::from_tag)
            .or_else(|| match options.len() {
                2 => Some(QuestionKind::TrueFalse),
                4 => Some(QuestionKind::Mcq),
                _ => None,
            })?;

        let mut question = Question {
            kind,
            prompt_text: self.question.trim().to_string(),
            options,
            correct_label: normalize_label(&self.answer),
        };

        if question.correct_option_index().is_none() {
            question.correct_label = repair_label(&question, self.answer.trim())?;
        }

        question.is_well_formed().then_some(question)
    }
}

fn normalize_label(answer: &str) -> String {
    let token = leading_token(answer);
    if token.len() == 1 && token.chars().all(|c| c.is_ascii_alphabetic()) {
        token.to_ascii_uppercase()
    } else {
        token.to_string()
    }
}

/// Recover the label when the answer names the option text ("Đúng") or, for
/// true/false options without labels, uses the legacy A/B convention.
fn repair_label(question: &Question, answer: &str) -> Option<String> {
    if answer.is_empty() {
        return None;
    }

    let by_text = question.options.iter().find(|opt| {
        opt.eq_ignore_ascii_case(answer) || option_body(opt).eq_ignore_ascii_case(answer)
    });
    if let Some(option) = by_text {
        return Some(leading_token(option).to_string());
    }

    if question.kind == QuestionKind::TrueFalse {
        let idx = match normalize_label(answer).as_str() {
            "A" => 0,
            "B" => 1,
            _ => return None,
        };
        return question
            .options
            .get(idx)
            .map(|opt| leading_token(opt).to_string());
    }

    None
}

/// Questions under the `questions` key of a recovered payload. Malformed items are skipped.
pub fn questions_from_payload(payload: &Map<String, Value>) -> Vec<Question> {
    let Some(items) = payload.get("questions").and_then(Value::as_array) else {
        log::warn!("Completion payload has no `questions` array");
        return Vec::new();
    };

    let questions: Vec<Question> = items
        .iter()
        .filter_map(|item| serde_json::from_value::<RawQuestionDto>(item.clone()).ok())
        .filter_map(RawQuestionDto::into_question)
        .collect();

    if questions.len() < items.len() {
        log::warn!(
            "Dropped {} malformed question(s) from completion payload",
            items.len() - questions.len()
        );
    }
    questions
}
