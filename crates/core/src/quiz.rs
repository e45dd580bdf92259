//! Quiz Model and Parsing
//!
//! Generated quizzes arrive as loosely structured text. This module keeps that
//! fragile boundary behind the `QuizParser` trait so the dialogue engine only
//! ever sees `QuizQuestion` values.

use serde::{Deserialize, Serialize};

/// Marker that introduces the correct-answer token in generated quiz text.
const ANSWER_MARKER: &str = "Correct Answer:";

/// Option lines that belong to the body of the question above them.
const OPTION_PREFIXES: [&str; 4] = ["A)", "B)", "C)", "D)"];

/// A single multiple-choice question with its correct-answer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// The question line followed by its option lines.
    pub question: String,
    /// The label of the right option (e.g. "B"). Empty for degraded entries.
    pub answer: String,
}

impl QuizQuestion {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Builds the placeholder entry used when quiz generation fails.
    ///
    /// The empty answer token means no submitted answer can ever match it.
    pub fn unanswerable(text: impl Into<String>) -> Self {
        Self::new(text, "")
    }

    /// Grades a user's answer: trimmed, case-insensitive, exact match.
    pub fn is_correct(&self, user_answer: &str) -> bool {
        let expected = self.answer.trim();
        !expected.is_empty() && user_answer.trim().to_uppercase() == expected.to_uppercase()
    }
}

/// Turns generated quiz text into structured questions.
pub trait QuizParser: Send + Sync {
    fn parse(&self, raw: &str) -> Vec<QuizQuestion>;
}

/// Parser for the line-oriented format the quiz prompt asks for:
///
/// ```text
/// Q1: Question?
/// A) Option1
/// B) Option2
/// C) Option3
/// D) Option4
/// Correct Answer: B
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct LineQuizParser;

impl QuizParser for LineQuizParser {
    fn parse(&self, raw: &str) -> Vec<QuizQuestion> {
        let mut questions = Vec::new();
        let mut body = String::new();
        let mut answer = String::new();

        for line in raw.lines().map(str::trim) {
            if line.starts_with('Q') {
                flush(&mut questions, &body, &answer);
                body = line.to_string();
                answer.clear();
            } else if OPTION_PREFIXES.iter().any(|p| line.starts_with(p)) {
                body.push('\n');
                body.push_str(line);
            } else if let Some(idx) = line.rfind(ANSWER_MARKER) {
                answer = line[idx + ANSWER_MARKER.len()..].trim().to_string();
            }
        }
        flush(&mut questions, &body, &answer);

        questions
    }
}

fn flush(questions: &mut Vec<QuizQuestion>, body: &str, answer: &str) {
    let (body, answer) = (body.trim(), answer.trim());
    if !body.is_empty() && !answer.is_empty() {
        questions.push(QuizQuestion::new(body, answer));
    }
}
