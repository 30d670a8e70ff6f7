use std::collections::HashMap;

use crate::models::{
    domain::{
        quiz_question::{leading_token, option_body},
        Question, QuestionKind,
    },
    dto::{GradeReport, QuestionGrade},
};

/// The option a student must pick for `question` to be marked correct.
///
/// The option whose leading token equals the answer label wins. True/false questions
/// whose options carry no labels fall back to "A is the first option, anything else
/// the second".
pub fn resolve_correct_option(question: &Question) -> Option<&str> {
    if let Some(option) = question.correct_option() {
        return Some(option);
    }

    match question.kind {
        QuestionKind::TrueFalse => {
            let idx = if question.correct_label.trim().eq_ignore_ascii_case("A") {
                0
            } else {
                1
            };
            question.options.get(idx).map(String::as_str)
        }
        QuestionKind::Mcq => None,
    }
}

/// A chosen answer matches when it is the correct option itself, its label, or its text.
fn answer_matches(chosen: &str, correct: &str) -> bool {
    let chosen = chosen.trim();
    if chosen.is_empty() {
        return false;
    }
    chosen == correct.trim()
        || chosen.eq_ignore_ascii_case(leading_token(correct))
        || (!option_body(correct).is_empty() && chosen == option_body(correct))
}

pub fn grade(questions: &[Question], answers: &HashMap<usize, String>) -> GradeReport {
    let results: Vec<QuestionGrade> = questions
        .iter()
        .enumerate()
        .map(|(index, question)| {
            let correct = resolve_correct_option(question);
            let user_answer = answers.get(&index).cloned();
            let is_correct = match (user_answer.as_deref(), correct) {
                (Some(chosen), Some(correct)) => answer_matches(chosen, correct),
                _ => false,
            };
            QuestionGrade {
                index,
                correct_answer: correct.map(str::to_string),
                user_answer,
                is_correct,
            }
        })
        .collect();

    let score = results.iter().filter(|r| r.is_correct).count();
    let total = results.len();
    let percent = if total == 0 {
        0.0
    } else {
        (score as f64 / total as f64 * 1000.0).round() / 10.0
    };

    GradeReport {
        score,
        total,
        percent,
        results,
    }
}
