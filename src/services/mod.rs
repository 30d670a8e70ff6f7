pub mod completion_client;
pub mod grading_service;
pub mod prompt_builder;
pub mod quiz_orchestrator_service;

pub use completion_client::{CompletionBackend, CompletionClient, OpenAiCompatibleBackend};
pub use quiz_orchestrator_service::QuizOrchestrator;
