#[cfg(test)]
pub mod fixtures {
    use serde_json::{json, Value};

    use crate::models::domain::{Question, QuestionKind, QuizRequest, QuizResult};

    /// A request for `num_mcq` + `num_tf` algebra questions.
    pub fn quiz_request(num_mcq: u32, num_tf: u32) -> QuizRequest {
        QuizRequest {
            subject: "Toán".to_string(),
            grade: "10".to_string(),
            topic: "Đại số".to_string(),
            num_mcq,
            num_tf,
            force_regen: false,
        }
    }

    /// Four-option question whose options are "A. 1" through "D. 4".
    pub fn mcq_question(prompt: &str, label: &str) -> Question {
        Question {
            kind: QuestionKind::Mcq,
            prompt_text: prompt.to_string(),
            options: vec![
                "A. 1".to_string(),
                "B. 2".to_string(),
                "C. 3".to_string(),
                "D. 4".to_string(),
            ],
            correct_label: label.to_string(),
        }
    }

    pub fn tf_question(prompt: &str, label: &str) -> Question {
        Question {
            kind: QuestionKind::TrueFalse,
            prompt_text: prompt.to_string(),
            options: vec!["A. Đúng".to_string(), "B. Sai".to_string()],
            correct_label: label.to_string(),
        }
    }

    pub fn sample_result() -> QuizResult {
        QuizResult {
            questions: vec![mcq_question("1 + 1 = ?", "B"), tf_question("2 > 1", "A")],
        }
    }

    fn fenced(items: Vec<Value>) -> String {
        format!(
            "Here is the quiz:\n```json\n{}\n```",
            json!({ "questions": items })
        )
    }

    /// Model output holding `count` multiple-choice items, wrapped in prose and a code fence.
    pub fn mcq_payload(count: usize) -> String {
        fenced(
            (0..count)
                .map(|i| {
                    json!({
                        "type": "mcq",
                        "question": format!("Câu hỏi trắc nghiệm {}", i),
                        "options": ["A. 1", "B. 2", "C. 3", "D. 4"],
                        "answer": "A"
                    })
                })
                .collect(),
        )
    }

    pub fn tf_payload(count: usize) -> String {
        fenced(
            (0..count)
                .map(|i| {
                    json!({
                        "type": "truefalse",
                        "question": format!("Mệnh đề {}", i),
                        "options": ["A. Đúng", "B. Sai"],
                        "answer": "B"
                    })
                })
                .collect(),
        )
    }
}

#[cfg(test)]
pub mod stubs {
    use std::{collections::HashMap, sync::Mutex, time::Duration};

    use async_trait::async_trait;

    use crate::{
        models::domain::SamplingConfig,
        services::completion_client::{BackendError, CompletionBackend},
    };

    /// Which generation branch a prompt belongs to.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub enum Branch {
        Mcq,
        TrueFalse,
        TopUp,
    }

    impl Branch {
        pub fn of_prompt(prompt: &str) -> Self {
            if prompt.contains("more multiple-choice") {
                Branch::TopUp
            } else if prompt.contains("multiple-choice questions for students") {
                Branch::Mcq
            } else {
                Branch::TrueFalse
            }
        }
    }

    /// Backend that answers each branch with a fixed text and records every call.
    /// Branches without a scripted answer fail.
    pub struct ScriptedBackend {
        answers: HashMap<Branch, String>,
        delays: HashMap<Branch, Duration>,
        calls: Mutex<Vec<Branch>>,
    }

    impl ScriptedBackend {
        pub fn new(mcq: String, true_false: String) -> Self {
            Self {
                answers: HashMap::from([(Branch::Mcq, mcq), (Branch::TrueFalse, true_false)]),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                answers: HashMap::new(),
                delays: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_top_up(mut self, answer: String) -> Self {
            self.answers.insert(Branch::TopUp, answer);
            self
        }

        pub fn with_delay(mut self, branch: Branch, delay: Duration) -> Self {
            self.delays.insert(branch, delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls_for(&self, branch: Branch) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|b| **b == branch)
                .count()
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            _model: &str,
            prompt: &str,
            _sampling: &SamplingConfig,
        ) -> Result<String, BackendError> {
            let branch = Branch::of_prompt(prompt);
            self.calls.lock().unwrap().push(branch);

            if let Some(delay) = self.delays.get(&branch) {
                tokio::time::sleep(*delay).await;
            }

            self.answers
                .get(&branch)
                .cloned()
                .ok_or_else(|| BackendError::Request(format!("no answer scripted for {:?}", branch)))
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{fixtures::*, stubs::Branch};
    use crate::{
        models::dto::questions_from_payload, services::prompt_builder,
        models::domain::SamplingConfig, text_recovery::extract_object,
    };

    #[test]
    fn payload_fixtures_survive_extraction() {
        let mcq = extract_object(&mcq_payload(3)).unwrap();
        let tf = extract_object(&tf_payload(2)).unwrap();

        assert_eq!(questions_from_payload(&mcq).len(), 3);
        assert_eq!(questions_from_payload(&tf).len(), 2);
    }

    #[test]
    fn branch_classifies_generated_prompts() {
        let request = quiz_request(2, 1);
        let sampling = SamplingConfig::default();

        assert_eq!(
            Branch::of_prompt(&prompt_builder::mcq_prompt(&request, &sampling).instruction),
            Branch::Mcq
        );
        assert_eq!(
            Branch::of_prompt(&prompt_builder::true_false_prompt(&request, &sampling).instruction),
            Branch::TrueFalse
        );
        assert_eq!(
            Branch::of_prompt(&prompt_builder::top_up_prompt(&request, 1, 0, &sampling).instruction),
            Branch::TopUp
        );
    }
}
