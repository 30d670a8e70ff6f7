use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::domain::quiz_question::{Question, QuestionKind};

pub const DEFAULT_NUM_MCQ: u32 = 10;
pub const DEFAULT_NUM_TF: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizRequest {
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub num_mcq: u32,
    pub num_tf: u32,
    pub force_regen: bool,
}

/// Fields that identify a cached quiz. Field order here is the canonical order.
#[derive(Serialize)]
struct CacheKeyFields<'a> {
    grade: &'a str,
    num_mcq: u32,
    num_tf: u32,
    subject: &'a str,
    topic: &'a str,
}

impl QuizRequest {
    pub fn total(&self) -> usize {
        (self.num_mcq + self.num_tf) as usize
    }

    pub fn requested(&self, kind: QuestionKind) -> usize {
        match kind {
            QuestionKind::Mcq => self.num_mcq as usize,
            QuestionKind::TrueFalse => self.num_tf as usize,
        }
    }

    /// Canonical, key-sorted serialization of everything but `force_regen`.
    pub fn canonical_key_material(&self) -> String {
        let fields = CacheKeyFields {
            grade: &self.grade,
            num_mcq: self.num_mcq,
            num_tf: self.num_tf,
            subject: &self.subject,
            topic: &self.topic,
        };
        // Serializing plain strings and integers cannot fail.
        serde_json::to_string(&fields).unwrap_or_default()
    }

    pub fn cache_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_key_material().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuizResult {
    pub questions: Vec<Question>,
}

impl QuizResult {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }
}

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub key: String,
    pub result: QuizResult,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, result: QuizResult, created_at: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            result,
            created_at,
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) < ttl
    }
}
