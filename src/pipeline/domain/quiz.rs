//! Quiz grading against a stage-held answer key.

use crate::graph::domain::StageId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys with this prefix carry form metadata and are never graded.
const META_PREFIX: &str = "meta_";

/// When graded feedback reveals the correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShowAnswer {
    /// Feedback never includes the answer key.
    #[default]
    Never,
    /// Feedback always includes the answer key.
    Always,
    /// Answers are shown only on a passing score.
    OnPass,
    /// Answers are shown only on a failing score.
    OnFail,
}

/// Binds a stage to an answer key held by another stage's completed
/// task and gates completion on the resulting score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    /// Stage whose latest completed task carries the correct answers.
    pub answer_stage: StageId,
    /// Minimum passing score; `None` never withholds completion.
    pub threshold: Option<u32>,
    /// Feedback policy for revealing answers.
    pub show_answer: ShowAnswer,
    /// Include correct answers beside question titles in feedback.
    pub provide_answers: bool,
    /// Expose the answer key at task-creation time (practice mode).
    pub send_answers_with_questions: bool,
}

/// Result of grading one response map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    /// Integer percentage score, rounded half-up.
    pub score: u32,
    /// Graded keys whose responses missed the key, in key order.
    pub incorrect: Vec<String>,
    /// Whether the score clears the configured threshold.
    pub passed: bool,
}

impl Quiz {
    /// Creates an ungated quiz reading answers from a stage.
    #[must_use]
    pub const fn new(answer_stage: StageId) -> Self {
        Self {
            answer_stage,
            threshold: None,
            show_answer: ShowAnswer::Never,
            provide_answers: false,
            send_answers_with_questions: false,
        }
    }

    /// Withholds completion below the given score.
    #[must_use]
    pub const fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Sets the answer-reveal policy.
    #[must_use]
    pub const fn with_show_answer(mut self, show_answer: ShowAnswer) -> Self {
        self.show_answer = show_answer;
        self
    }

    /// Includes correct answers in feedback.
    #[must_use]
    pub const fn with_provide_answers(mut self, provide: bool) -> Self {
        self.provide_answers = provide;
        self
    }

    /// Exposes the answer key at task-creation time.
    #[must_use]
    pub const fn with_answers_at_creation(mut self, send: bool) -> Self {
        self.send_answers_with_questions = send;
        self
    }

    /// Grades responses against the answer key.
    ///
    /// Every non-meta key of the answer key is graded; a missing
    /// response counts as incorrect. An empty graded set scores 100.
    #[must_use]
    pub fn grade(&self, answers: &Map<String, Value>, responses: &Map<String, Value>) -> QuizOutcome {
        let graded: Vec<(&String, &Value)> = answers
            .iter()
            .filter(|(key, _)| !key.starts_with(META_PREFIX))
            .collect();
        let mut incorrect = Vec::new();
        let mut correct = 0_usize;
        for (key, expected) in &graded {
            if responses.get(*key).is_some_and(|value| value == *expected) {
                correct += 1;
            } else {
                incorrect.push((*key).clone());
            }
        }
        let score = Self::percentage(correct, graded.len());
        QuizOutcome {
            score,
            incorrect,
            passed: self.threshold.is_none_or(|threshold| score >= threshold),
        }
    }

    /// Integer percentage with half-up rounding; an empty graded set
    /// scores 100.
    #[expect(
        clippy::integer_division,
        clippy::integer_division_remainder_used,
        reason = "score is a rounded integer percentage"
    )]
    fn percentage(correct: usize, graded: usize) -> u32 {
        if graded == 0 {
            return 100;
        }
        let rounded = (correct * 200 + graded) / (graded * 2);
        u32::try_from(rounded).unwrap_or(100)
    }

    /// Decides whether feedback for the given result reveals answers.
    #[must_use]
    pub const fn reveals_answers(&self, passed: bool) -> bool {
        match self.show_answer {
            ShowAnswer::Never => false,
            ShowAnswer::Always => true,
            ShowAnswer::OnPass => passed,
            ShowAnswer::OnFail => !passed,
        }
    }
}
