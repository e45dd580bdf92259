//! Tutor Services
//!
//! Explanation and quiz content comes from a language model. This module
//! defines the capabilities the dialogue engine consumes and provides an
//! OpenAI-compatible implementation plus a deterministic mock.
//!
//! Implementations report failures as errors; turning them into user-facing
//! text is the dialogue engine's job.

use crate::quiz::{LineQuizParser, QuizParser, QuizQuestion};
use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Produces prose explanations of course topics.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExplanationService: Send + Sync {
    /// Explains `topic` in detail as it relates to `course`.
    async fn fetch_explanation(&self, course: &str, topic: &str) -> Result<String>;

    /// Re-explains the part of `topic` described by `clarification` in simpler terms.
    async fn simplify_explanation(
        &self,
        course: &str,
        topic: &str,
        clarification: &str,
    ) -> Result<String>;
}

/// Produces quizzes and answer rationales.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizService: Send + Sync {
    /// Generates multiple-choice questions about `topic`.
    async fn generate_quiz_questions(&self, course: &str, topic: &str)
    -> Result<Vec<QuizQuestion>>;

    /// Explains briefly why `answer` is the correct answer to `question`.
    async fn explain_answer(&self, course: &str, question: &str, answer: &str) -> Result<String>;
}

/// Tutor backed by any OpenAI-compatible chat completion API.
///
/// Prompts come from a template map keyed by file stem. The required keys are
/// `tutor_system`, `explain_topic`, `simplify_explanation`, `generate_quiz` and
/// `explain_answer`. Templates may use the `{course}`, `{topic}`,
/// `{clarification}`, `{question}` and `{answer}` placeholders.
pub struct LLMTutorService {
    client: Client<OpenAIConfig>,
    model: String,
    prompts: HashMap<String, String>,
    parser: Arc<dyn QuizParser>,
}

impl LLMTutorService {
    /// Creates a new LLM-based tutor.
    ///
    /// # Arguments
    ///
    /// * `config` - OpenAI API configuration (API key, base URL, etc.).
    /// * `model` - Model identifier to use for generation (e.g., "llama3-8b-8192").
    /// * `prompts` - Prompt templates keyed by name.
    pub fn new(config: OpenAIConfig, model: String, prompts: HashMap<String, String>) -> Self {
        Self {
            client: Client::with_config(config),
            model,
            prompts,
            parser: Arc::new(LineQuizParser),
        }
    }

    /// Swaps the parser used to read generated quizzes.
    pub fn with_parser(mut self, parser: Arc<dyn QuizParser>) -> Self {
        self.parser = parser;
        self
    }

    fn render(&self, key: &str, vars: &[(&str, &str)]) -> Result<String> {
        let template = self
            .prompts
            .get(key)
            .with_context(|| format!("Missing prompt template: '{}'", key))?;
        Ok(fill_template(template, vars))
    }

    async fn complete(&self, course: &str, user_prompt: String) -> Result<String> {
        let system_prompt = self.render("tutor_system", &[("course", course)])?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.7)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .context("No response choice from LLM")?
            .message
            .content
            .as_ref()
            .context("No content in LLM response")?;

        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl ExplanationService for LLMTutorService {
    async fn fetch_explanation(&self, course: &str, topic: &str) -> Result<String> {
        let prompt = self.render("explain_topic", &[("course", course), ("topic", topic)])?;
        self.complete(course, prompt).await
    }

    async fn simplify_explanation(
        &self,
        course: &str,
        topic: &str,
        clarification: &str,
    ) -> Result<String> {
        let prompt = self.render(
            "simplify_explanation",
            &[
                ("course", course),
                ("topic", topic),
                ("clarification", clarification),
            ],
        )?;
        self.complete(course, prompt).await
    }
}

#[async_trait]
impl QuizService for LLMTutorService {
    async fn generate_quiz_questions(
        &self,
        course: &str,
        topic: &str,
    ) -> Result<Vec<QuizQuestion>> {
        let prompt = self.render("generate_quiz", &[("course", course), ("topic", topic)])?;
        let raw = self.complete(course, prompt).await?;
        let questions = self.parser.parse(&raw);
        debug!(course, topic, count = questions.len(), "Parsed generated quiz");
        Ok(questions)
    }

    async fn explain_answer(&self, course: &str, question: &str, answer: &str) -> Result<String> {
        let prompt = self.render(
            "explain_answer",
            &[("course", course), ("question", question), ("answer", answer)],
        )?;
        self.complete(course, prompt).await
    }
}

/// Replaces every `{name}` placeholder with its value.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |text, (name, value)| {
        text.replace(&format!("{{{}}}", name), value)
    })
}

/// A mock tutor for development and integration testing.
///
/// Explanations echo the course and topic, and every generated question has
/// "B" as its correct answer.
#[derive(Debug, Clone)]
pub struct MockTutorService {
    questions_per_quiz: usize,
}

impl MockTutorService {
    pub fn new(questions_per_quiz: usize) -> Self {
        Self { questions_per_quiz }
    }
}

impl Default for MockTutorService {
    fn default() -> Self {
        Self::new(2)
    }
}

#[async_trait]
impl ExplanationService for MockTutorService {
    async fn fetch_explanation(&self, course: &str, topic: &str) -> Result<String> {
        Ok(format!("{} is a core part of {}.", topic, course))
    }

    async fn simplify_explanation(
        &self,
        course: &str,
        topic: &str,
        clarification: &str,
    ) -> Result<String> {
        Ok(format!(
            "Put simply, {} in {} comes down to this: {}.",
            topic, course, clarification
        ))
    }
}

#[async_trait]
impl QuizService for MockTutorService {
    async fn generate_quiz_questions(
        &self,
        _course: &str,
        topic: &str,
    ) -> Result<Vec<QuizQuestion>> {
        Ok((1..=self.questions_per_quiz)
            .map(|n| {
                QuizQuestion::new(
                    format!(
                        "Q{}: Which statement about {} is true?\nA) None\nB) The right one\nC) A wrong one\nD) All of them",
                        n, topic
                    ),
                    "B",
                )
            })
            .collect())
    }

    async fn explain_answer(&self, _course: &str, _question: &str, answer: &str) -> Result<String> {
        Ok(format!("Option {} is the only accurate statement.", answer))
    }
}
