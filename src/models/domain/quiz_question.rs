use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "question")]
    pub prompt_text: String,
    pub options: Vec<String>,
    #[serde(rename = "answer")]
    pub correct_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, Copy)]
pub enum QuestionKind {
    #[serde(rename = "mcq")]
    Mcq,
    #[serde(rename = "truefalse", alias = "true_false")]
    TrueFalse,
}

impl QuestionKind {
    pub fn expected_option_count(self) -> usize {
        match self {
            QuestionKind::Mcq => 4,
            QuestionKind::TrueFalse => 2,
        }
    }

    /// Parse the loose type tags a model may emit.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "mcq" | "multiple_choice" => Some(QuestionKind::Mcq),
            "truefalse" | "true_false" | "tf" => Some(QuestionKind::TrueFalse),
            _ => None,
        }
    }
}

/// Leading token of an option or answer: "A. 12" -> "A", "Đúng" -> "Đúng".
pub fn leading_token(text: &str) -> &str {
    let trimmed = text.trim_start();
    let end = trimmed
        .find(|c: char| c.is_whitespace() || matches!(c, '.' | ')' | ':'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

/// Text of an option after its leading label: "A. Đúng" -> "Đúng".
pub fn option_body(option: &str) -> &str {
    let label = leading_token(option);
    option
        .trim_start()
        .get(label.len()..)
        .unwrap_or("")
        .trim_start_matches(['.', ')', ':'])
        .trim()
}

impl Question {
    /// Index of the option whose leading token equals the correct label.
    pub fn correct_option_index(&self) -> Option<usize> {
        let label = self.correct_label.trim();
        if label.is_empty() {
            return None;
        }
        self.options
            .iter()
            .position(|opt| leading_token(opt).eq_ignore_ascii_case(label))
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.correct_option_index()
            .map(|idx| self.options[idx].as_str())
    }

    pub fn is_well_formed(&self) -> bool {
        !self.prompt_text.trim().is_empty()
            && self.options.len() == self.kind.expected_option_count()
            && self.correct_option_index().is_some()
    }

    /// Rewrite every text field with `f`. The label is re-read from the option it pointed
    /// at, since `f` may move where that option's leading token ends.
    pub fn map_text(mut self, f: impl Fn(&str) -> String) -> Self {
        let correct = self.correct_option_index();
        self.prompt_text = f(&self.prompt_text);
        self.options = self.options.iter().map(|opt| f(opt)).collect();
        self.correct_label = match correct {
            Some(idx) => leading_token(&self.options[idx]).to_string(),
            None => f(&self.correct_label),
        };
        self
    }
}
