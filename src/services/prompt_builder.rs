use crate::{
    constants::quiz_prompt::{
        MCQ_DIFFICULTY_SPLIT, MCQ_SCHEMA, MIXED_SCHEMA, RESPONSE_RULES, TRUE_FALSE_DIFFICULTY_SPLIT,
        TRUE_FALSE_SCHEMA,
    },
    models::domain::{PromptSpec, QuizRequest, SamplingConfig},
};

/// Split `total` questions across tiers proportionally to `shares`, largest remainder first.
/// The counts always sum to `total`.
pub fn difficulty_split(total: u32, shares: [u32; 3]) -> [u32; 3] {
    let weight: u32 = shares.iter().sum();
    if weight == 0 {
        return [total, 0, 0];
    }

    let mut counts = shares.map(|share| total * share / weight);
    let mut remainders: Vec<(usize, u32)> = shares
        .iter()
        .enumerate()
        .map(|(idx, share)| (idx, total * share % weight))
        .collect();
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let assigned: u32 = counts.iter().sum();
    for (idx, _) in remainders.into_iter().take((total - assigned) as usize) {
        counts[idx] += 1;
    }
    counts
}

fn audience(request: &QuizRequest) -> String {
    let topic = if request.topic.is_empty() {
        "any topic from the grade curriculum"
    } else {
        request.topic.as_str()
    };
    format!(
        "- Subject: {}\n- Grade: {}\n- Topic: {}",
        request.subject, request.grade, topic
    )
}

fn difficulty_line(total: u32, shares: [u32; 3]) -> String {
    let [recall, comprehension, application] = difficulty_split(total, shares);
    format!(
        "Difficulty: about {}% recall ({} questions), {}% comprehension ({}), {}% application ({}).",
        shares[0], recall, shares[1], comprehension, shares[2], application
    )
}

pub fn mcq_prompt(request: &QuizRequest, sampling: &SamplingConfig) -> PromptSpec {
    let instruction = format!(
        "{rules}\n\nCreate exactly {count} multiple-choice questions for students:\n{audience}\n{difficulty}\nEach question has exactly four options labelled A, B, C, D and \"answer\" is the single label of the correct option.\n\nFormat:\n{schema}",
        rules = RESPONSE_RULES,
        count = request.num_mcq,
        audience = audience(request),
        difficulty = difficulty_line(request.num_mcq, MCQ_DIFFICULTY_SPLIT),
        schema = MCQ_SCHEMA,
    );
    PromptSpec::new(instruction, sampling.clone())
}

pub fn true_false_prompt(request: &QuizRequest, sampling: &SamplingConfig) -> PromptSpec {
    let instruction = format!(
        "{rules}\n\nCreate exactly {count} true/false questions for students:\n{audience}\n{difficulty}\nEach question is a statement with the two options \"A. Đúng\" and \"B. Sai\"; \"answer\" is \"A\" when the statement is true and \"B\" when it is false.\n\nFormat:\n{schema}",
        rules = RESPONSE_RULES,
        count = request.num_tf,
        audience = audience(request),
        difficulty = difficulty_line(request.num_tf, TRUE_FALSE_DIFFICULTY_SPLIT),
        schema = TRUE_FALSE_SCHEMA,
    );
    PromptSpec::new(instruction, sampling.clone())
}

/// Prompt for the single best-effort request that fills a shortfall.
pub fn top_up_prompt(
    request: &QuizRequest,
    missing_mcq: usize,
    missing_tf: usize,
    sampling: &SamplingConfig,
) -> PromptSpec {
    let instruction = format!(
        "{rules}\n\nCreate exactly {missing_mcq} more multiple-choice questions (type \"mcq\", four options A-D) and exactly {missing_tf} more true/false questions (type \"truefalse\", options \"A. Đúng\" and \"B. Sai\") for students:\n{audience}\n\"answer\" is always the single label of the correct option.\n\nFormat:\n{schema}",
        rules = RESPONSE_RULES,
        missing_mcq = missing_mcq,
        missing_tf = missing_tf,
        audience = audience(request),
        schema = MIXED_SCHEMA,
    );
    PromptSpec::new(instruction, sampling.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::quiz_request;

    #[test]
    fn difficulty_split_sums_to_total() {
        for total in 0..=30 {
            for shares in [MCQ_DIFFICULTY_SPLIT, TRUE_FALSE_DIFFICULTY_SPLIT] {
                let split = difficulty_split(total, shares);
                assert_eq!(split.iter().sum::<u32>(), total);
            }
        }
    }

    #[test]
    fn difficulty_split_reference_values() {
        assert_eq!(difficulty_split(10, MCQ_DIFFICULTY_SPLIT), [4, 3, 3]);
        assert_eq!(difficulty_split(4, TRUE_FALSE_DIFFICULTY_SPLIT), [2, 1, 1]);
        assert_eq!(difficulty_split(1, MCQ_DIFFICULTY_SPLIT), [1, 0, 0]);
    }

    #[test]
    fn mcq_prompt_mentions_count_audience_and_schema() {
        let prompt = mcq_prompt(&quiz_request(2, 1), &SamplingConfig::default());

        assert!(prompt.instruction.contains("exactly 2 multiple-choice"));
        assert!(prompt.instruction.contains("Subject: Toán"));
        assert!(prompt.instruction.contains("Topic: Đại số"));
        assert!(prompt.instruction.contains("\"type\": \"mcq\""));
        assert!(prompt.instruction.contains("No markdown"));
        assert!(prompt.sampling.json_response);
    }

    #[test]
    fn true_false_prompt_uses_tf_schema() {
        let prompt = true_false_prompt(&quiz_request(2, 3), &SamplingConfig::default());

        assert!(prompt.instruction.contains("exactly 3 true/false"));
        assert!(prompt.instruction.contains("\"type\": \"truefalse\""));
        assert!(prompt.instruction.contains("50% recall"));
    }

    #[test]
    fn top_up_prompt_requests_exact_shortfall() {
        let prompt = top_up_prompt(&quiz_request(10, 4), 2, 1, &SamplingConfig::default());

        assert!(prompt.instruction.contains("exactly 2 more multiple-choice"));
        assert!(prompt.instruction.contains("exactly 1 more true/false"));
    }

    #[test]
    fn empty_topic_falls_back_to_curriculum() {
        let mut request = quiz_request(1, 1);
        request.topic.clear();
        let prompt = mcq_prompt(&request, &SamplingConfig::default());

        assert!(prompt.instruction.contains("any topic from the grade curriculum"));
    }
}
