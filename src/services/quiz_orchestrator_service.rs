use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::{
    models::{
        domain::{CacheEntry, PromptSpec, Question, QuestionKind, QuizRequest, QuizResult, SamplingConfig},
        dto::questions_from_payload,
    },
    repositories::QuizCacheRepository,
    services::{
        completion_client::{CompletionClient, CompletionError},
        prompt_builder,
    },
    text_recovery::{extract_object, normalize},
};

/// Builds quizzes from two concurrent completion branches plus an optional top-up,
/// serving repeated requests from the cache while the entry is fresh.
pub struct QuizOrchestrator {
    completion: Arc<CompletionClient>,
    cache: Arc<dyn QuizCacheRepository>,
    workers: Arc<Semaphore>,
    branch_timeout: Duration,
    sampling: SamplingConfig,
}

#[derive(Default)]
struct QuestionBuckets {
    mcq: Vec<Question>,
    true_false: Vec<Question>,
}

impl QuestionBuckets {
    fn extend(&mut self, questions: Vec<Question>) {
        for question in questions {
            match question.kind {
                QuestionKind::Mcq => self.mcq.push(question),
                QuestionKind::TrueFalse => self.true_false.push(question),
            }
        }
    }

    /// Drop whatever a branch produced beyond the requested count.
    fn cap(&mut self, request: &QuizRequest) {
        self.mcq.truncate(request.requested(QuestionKind::Mcq));
        self.true_false
            .truncate(request.requested(QuestionKind::TrueFalse));
    }

    fn shortfall(&self, request: &QuizRequest) -> (usize, usize) {
        (
            request
                .requested(QuestionKind::Mcq)
                .saturating_sub(self.mcq.len()),
            request
                .requested(QuestionKind::TrueFalse)
                .saturating_sub(self.true_false.len()),
        )
    }

    fn into_ordered(self) -> Vec<Question> {
        self.mcq.into_iter().chain(self.true_false).collect()
    }
}

impl QuizOrchestrator {
    pub fn new(
        completion: Arc<CompletionClient>,
        cache: Arc<dyn QuizCacheRepository>,
        worker_count: usize,
        branch_timeout: Duration,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            completion,
            cache,
            workers: Arc::new(Semaphore::new(worker_count.max(1))),
            branch_timeout,
            sampling,
        }
    }

    pub async fn generate(&self, request: &QuizRequest) -> QuizResult {
        let started = Instant::now();
        let key = request.cache_key();

        if !request.force_regen {
            if let Some(hit) = self.cache.find_fresh(&key, Utc::now()).await {
                log::info!("Serving quiz from cache ({} questions)", hit.len());
                return hit;
            }
        }

        let _flight = self.cache.lock_key(&key).await;

        // A concurrent request for the same key may have finished while we waited.
        if !request.force_regen {
            if let Some(hit) = self.cache.find_fresh(&key, Utc::now()).await {
                log::info!("Serving quiz generated by a concurrent request");
                return hit;
            }
        }

        let result = self.generate_uncached(request).await;

        if result.is_empty() {
            log::warn!("Quiz generation produced no questions; not caching");
        } else {
            self.cache
                .store(CacheEntry::new(key, result.clone(), Utc::now()))
                .await;
        }

        log::info!(
            "Quiz generated: {}/{} questions in {} ms",
            result.len(),
            request.total(),
            started.elapsed().as_millis()
        );
        result
    }

    async fn generate_uncached(&self, request: &QuizRequest) -> QuizResult {
        let mcq_prompt = prompt_builder::mcq_prompt(request, &self.sampling);
        let tf_prompt = prompt_builder::true_false_prompt(request, &self.sampling);

        let (mcq, true_false) = tokio::join!(
            self.run_branch("mcq", &mcq_prompt, request.num_mcq > 0),
            self.run_branch("truefalse", &tf_prompt, request.num_tf > 0),
        );

        let mut buckets = QuestionBuckets::default();
        buckets.extend(mcq);
        buckets.extend(true_false);
        buckets.cap(request);

        let (missing_mcq, missing_tf) = buckets.shortfall(request);
        if missing_mcq + missing_tf > 0 {
            log::warn!(
                "Missing {} multiple-choice and {} true/false question(s); requesting top-up",
                missing_mcq,
                missing_tf
            );
            let top_up =
                prompt_builder::top_up_prompt(request, missing_mcq, missing_tf, &self.sampling);
            let extra = self.run_branch("top-up", &top_up, true).await;
            buckets.extend(extra);
            buckets.cap(request);
        }

        let mut questions = buckets.into_ordered();
        questions.truncate(request.total());

        QuizResult { questions }
    }

    /// One completion branch. Failures and timeouts yield an empty list; the timed-out
    /// future is dropped, which cancels its in-flight request.
    async fn run_branch(&self, branch: &str, prompt: &PromptSpec, enabled: bool) -> Vec<Question> {
        if !enabled {
            return Vec::new();
        }

        let raw = match tokio::time::timeout(self.branch_timeout, self.complete_with_worker(prompt))
            .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                log::warn!("Branch {} failed: {}", branch, err);
                return Vec::new();
            }
            Err(_) => {
                log::warn!(
                    "Branch {} failed: {}",
                    branch,
                    CompletionError::Timeout(self.branch_timeout)
                );
                return Vec::new();
            }
        };

        let payload = match extract_object(&raw) {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Branch {} returned unusable JSON: {}", branch, err);
                return Vec::new();
            }
        };

        let parsed = questions_from_payload(&payload);
        let parsed_count = parsed.len();
        let questions: Vec<Question> = parsed
            .into_iter()
            .map(|question| question.map_text(normalize))
            .filter(Question::is_well_formed)
            .collect();
        if questions.len() < parsed_count {
            log::warn!(
                "Branch {} dropped {} question(s) malformed after normalization",
                branch,
                parsed_count - questions.len()
            );
        }
        questions
    }

    async fn complete_with_worker(&self, prompt: &PromptSpec) -> Result<String, CompletionError> {
        let _permit = self
            .workers
            .acquire()
            .await
            .map_err(|_| CompletionError::WorkerPoolClosed)?;
        self.completion.complete(prompt).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        repositories::InMemoryQuizCache,
        services::grading_service,
        test_utils::{
            fixtures::{mcq_payload, quiz_request, tf_payload},
            stubs::{Branch, ScriptedBackend},
        },
    };

    fn orchestrator_with(
        backend: Arc<ScriptedBackend>,
        ttl: chrono::Duration,
        branch_timeout: Duration,
    ) -> QuizOrchestrator {
        let completion = Arc::new(CompletionClient::new(
            backend,
            vec!["model-a".to_string()],
            1,
            Duration::from_millis(1),
        ));
        QuizOrchestrator::new(
            completion,
            Arc::new(InMemoryQuizCache::new(ttl)),
            3,
            branch_timeout,
            SamplingConfig::default(),
        )
    }

    fn orchestrator(backend: Arc<ScriptedBackend>) -> QuizOrchestrator {
        orchestrator_with(backend, chrono::Duration::seconds(120), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn produces_mcq_then_true_false() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(2), tf_payload(1)));
        let result = orchestrator(backend.clone())
            .generate(&quiz_request(2, 1))
            .await;

        let kinds: Vec<QuestionKind> = result.questions.iter().map(|q| q.kind).collect();
        assert_eq!(
            kinds,
            vec![QuestionKind::Mcq, QuestionKind::Mcq, QuestionKind::TrueFalse]
        );
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn second_request_within_ttl_hits_cache() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(2), tf_payload(1)));
        let orchestrator = orchestrator(backend.clone());

        let first = orchestrator.generate(&quiz_request(2, 1)).await;
        let second = orchestrator.generate(&quiz_request(2, 1)).await;

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn force_regen_bypasses_cache() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(2), tf_payload(1)));
        let orchestrator = orchestrator(backend.clone());

        orchestrator.generate(&quiz_request(2, 1)).await;
        let mut forced = quiz_request(2, 1);
        forced.force_regen = true;
        orchestrator.generate(&forced).await;

        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test]
    async fn expired_entry_is_regenerated() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(2), tf_payload(1)));
        let orchestrator =
            orchestrator_with(backend.clone(), chrono::Duration::zero(), Duration::from_secs(5));

        orchestrator.generate(&quiz_request(2, 1)).await;
        orchestrator.generate(&quiz_request(2, 1)).await;

        assert_eq!(backend.calls(), 4);
    }

    #[tokio::test]
    async fn over_production_is_truncated_in_order() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(12), tf_payload(4)));
        let result = orchestrator(backend).generate(&quiz_request(10, 4)).await;

        assert_eq!(result.len(), 14);
        let prompts: Vec<&str> = result.questions.iter().map(|q| q.prompt_text.as_str()).collect();
        assert_eq!(prompts[0], "Câu hỏi trắc nghiệm 0");
        assert_eq!(prompts[9], "Câu hỏi trắc nghiệm 9");
        assert_eq!(prompts[10], "Mệnh đề 0");
        assert!(result.questions[..10].iter().all(|q| q.kind == QuestionKind::Mcq));
        assert!(result.questions[10..].iter().all(|q| q.kind == QuestionKind::TrueFalse));
    }

    #[tokio::test]
    async fn shortfall_triggers_single_top_up() {
        let backend = Arc::new(
            ScriptedBackend::new(mcq_payload(1), tf_payload(1)).with_top_up(mcq_payload(1)),
        );
        let result = orchestrator(backend.clone())
            .generate(&quiz_request(2, 1))
            .await;

        assert_eq!(result.len(), 3);
        assert_eq!(backend.calls_for(Branch::TopUp), 1);
        assert_eq!(result.questions[2].kind, QuestionKind::TrueFalse);
    }

    #[tokio::test]
    async fn partial_result_is_accepted_after_failed_top_up() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(1), "garbage".to_string()));
        let result = orchestrator(backend.clone())
            .generate(&quiz_request(2, 2))
            .await;

        assert_eq!(result.len(), 1);
        assert_eq!(backend.calls_for(Branch::TopUp), 1);
    }

    #[tokio::test]
    async fn total_failure_is_empty_and_not_cached() {
        let backend = Arc::new(ScriptedBackend::failing());
        let orchestrator = orchestrator(backend.clone());

        assert!(orchestrator.generate(&quiz_request(2, 1)).await.is_empty());
        assert!(orchestrator.generate(&quiz_request(2, 1)).await.is_empty());
        assert_eq!(backend.calls_for(Branch::TopUp), 2);
    }

    #[tokio::test]
    async fn slow_branch_times_out_without_failing_request() {
        let backend = Arc::new(
            ScriptedBackend::new(mcq_payload(2), tf_payload(1))
                .with_delay(Branch::Mcq, Duration::from_millis(500)),
        );
        let orchestrator =
            orchestrator_with(backend, chrono::Duration::seconds(120), Duration::from_millis(100));

        let result = orchestrator.generate(&quiz_request(2, 1)).await;

        assert!(result.questions.iter().all(|q| q.kind == QuestionKind::TrueFalse));
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn question_text_is_normalized() {
        let backend = Arc::new(ScriptedBackend::new(
            r#"{"questions": [{"type": "mcq", "question": "x^{2} >= 4 khi nào?", "options": ["A. x >= 2", "B. x <= -2", "C. Cả A và B", "D. sqrt{4}"], "answer": "C"}]}"#.to_string(),
            tf_payload(0),
        ));
        let result = orchestrator(backend).generate(&quiz_request(1, 0)).await;

        assert_eq!(result.questions[0].prompt_text, "x² ≥ 4 khi nào?");
        assert_eq!(result.questions[0].options[0], "A. x ≥ 2");
        assert_eq!(result.questions[0].options[3], "D. √(4)");
        assert_eq!(result.questions[0].correct_label, "C");
    }

    #[tokio::test]
    async fn answer_by_option_text_survives_normalization() {
        let backend = Arc::new(ScriptedBackend::new(
            r#"{"questions": [{"type": "mcq", "question": "Giá trị nào đúng?", "options": ["sqrt{4} = 2", "1", "3", "5"], "answer": "sqrt{4} = 2"}]}"#.to_string(),
            tf_payload(0),
        ));
        let result = orchestrator(backend).generate(&quiz_request(1, 0)).await;

        assert_eq!(result.len(), 1);
        let question = &result.questions[0];
        assert!(question.is_well_formed());
        assert_eq!(question.correct_option(), Some("√(4) = 2"));

        let answers = HashMap::from([(0, "√(4) = 2".to_string())]);
        let report = grading_service::grade(&result.questions, &answers);
        assert_eq!(report.score, 1);
    }

    #[tokio::test]
    async fn zero_count_branch_is_not_dispatched() {
        let backend = Arc::new(ScriptedBackend::new(mcq_payload(3), tf_payload(3)));
        let result = orchestrator(backend.clone())
            .generate(&quiz_request(3, 0))
            .await;

        assert_eq!(result.len(), 3);
        assert_eq!(backend.calls(), 1);
        assert_eq!(backend.calls_for(Branch::TrueFalse), 0);
    }

    #[tokio::test]
    async fn concurrent_identical_requests_generate_once() {
        let backend = Arc::new(
            ScriptedBackend::new(mcq_payload(2), tf_payload(1))
                .with_delay(Branch::Mcq, Duration::from_millis(50)),
        );
        let orchestrator = orchestrator(backend.clone());
        let request = quiz_request(2, 1);

        let (first, second) = tokio::join!(
            orchestrator.generate(&request),
            orchestrator.generate(&request)
        );

        assert_eq!(first, second);
        assert_eq!(backend.calls(), 2);
    }
}
