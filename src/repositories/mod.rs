pub mod quiz_cache_repository;

pub use quiz_cache_repository::{InMemoryQuizCache, QuizCacheRepository};
