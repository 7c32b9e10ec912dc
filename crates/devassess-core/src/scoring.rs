//! Local scoring of multiple-choice answers for the post-submit summary.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::Question;

/// Outcome for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Summary over all scorable questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub results: Vec<QuestionResult>,
    pub correct_count: usize,
    pub total_questions: usize,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
}

/// Score `answers` against the questions that carry a correct answer.
/// Questions without one are skipped.
pub fn score_answers(questions: &[Question], answers: &BTreeMap<String, String>) -> ScoreSummary {
    let results: Vec<QuestionResult> = questions
        .iter()
        .filter_map(|q| {
            let correct = q.correct_answer.as_ref()?;
            let selected = answers.get(&q.id).cloned();
            Some(QuestionResult {
                question_id: q.id.clone(),
                is_correct: selected.as_deref() == Some(correct.as_str()),
                selected,
                correct_answer: correct.clone(),
                explanation: q.explanation.clone(),
            })
        })
        .collect();

    let total_questions = results.len();
    let correct_count = results.iter().filter(|r| r.is_correct).count();
    let percentage = if total_questions == 0 {
        0
    } else {
        ((correct_count as f64 / total_questions as f64) * 100.0).round() as u32
    };

    ScoreSummary {
        results,
        correct_count,
        total_questions,
        percentage,
    }
}
