//! Structured verdict the system prompt asks the model to append to its answer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static JSON_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)```").expect("valid json block regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub label: String,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub questions: Vec<Question>,
}

impl Analysis {
    /// Questions whose percentages do not add up to 100.
    pub fn unbalanced_questions(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|q| {
                let total: f64 = q.answers.iter().map(|a| a.percentage).sum();
                (total - 100.0).abs() > 0.5
            })
            .map(|q| q.question.as_str())
            .collect()
    }
}

/// Parses the last fenced `json` block of `text`, if it holds an analysis.
pub fn extract_analysis(text: &str) -> Option<Analysis> {
    let block = JSON_BLOCK.captures_iter(text).last()?.get(1)?.as_str();
    serde_json::from_str(block.trim()).ok()
}
