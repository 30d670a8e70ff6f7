pub mod prompt;
pub mod quiz;
pub mod quiz_question;
pub use prompt::{PromptSpec, SamplingConfig};
pub use quiz::{CacheEntry, QuizRequest, QuizResult};
pub use quiz_question::{Question, QuestionKind};
