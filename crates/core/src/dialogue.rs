//! Dialogue Engine
//!
//! Drives a tutoring conversation one message at a time: course selection,
//! topic explanation, quizzes, scoring and clarification. Each turn locks its
//! session, dispatches on the session's `ConversationState` and returns one
//! reply. Collaborator failures never fail a turn; they surface as text.

use crate::{
    catalog::ContentCatalog,
    quiz::QuizQuestion,
    score::ScoreRecorder,
    session::{ConversationState, SessionState},
    store::SessionStore,
    tutor::{ExplanationService, QuizService},
};
use anyhow::{Result, anyhow};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

/// Default upper bound for a single explanation or quiz call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const EMPTY_MESSAGE: &str = "Please type a message.";
const CLARIFY_PROMPT: &str = "Could you please specify which part you didn't understand?";
const QUIZ_OFFER: &str = "Would you like to try a quiz on this topic? (yes/no)";
const ALL_TOPICS_DONE: &str = "🎉 You've completed all the topics and quizzes. Well done!";
const UNKNOWN_INPUT: &str = "I'm here to assist you! Please type a valid course name.";

/// A session's score in its selected course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseScore {
    pub course: String,
    pub score: u32,
}

/// The engine's answer to one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub response: String,
    /// Present once the session has selected a course.
    #[serde(skip)]
    pub progress: Option<CourseScore>,
}

/// The conversation state machine and its collaborators.
pub struct DialogueEngine {
    catalog: Arc<ContentCatalog>,
    explainer: Arc<dyn ExplanationService>,
    quizzer: Arc<dyn QuizService>,
    scores: Arc<dyn ScoreRecorder>,
    sessions: Arc<SessionStore>,
    call_timeout: Duration,
}

impl DialogueEngine {
    pub fn new(
        catalog: Arc<ContentCatalog>,
        explainer: Arc<dyn ExplanationService>,
        quizzer: Arc<dyn QuizService>,
        scores: Arc<dyn ScoreRecorder>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            catalog,
            explainer,
            quizzer,
            scores,
            sessions,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Bounds every explanation and quiz call by `timeout`.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Processes one user message for `session_id` and returns the next prompt.
    #[instrument(skip(self, message))]
    pub async fn handle(&self, session_id: &str, message: &str) -> Reply {
        let mut state = self.sessions.acquire(session_id).await;

        if message.trim().is_empty() {
            return reply(&state, EMPTY_MESSAGE.to_string());
        }

        let from = state.conversation;
        let response = match from {
            ConversationState::WaitingForCourse => self.on_course_choice(&mut state, message).await,
            ConversationState::AwaitingQuizChoice => self.on_quiz_choice(&mut state, message).await,
            ConversationState::AwaitingClarification => {
                self.on_clarification(&mut state, message).await
            }
            ConversationState::QuizQuestion => {
                self.on_quiz_answer(&mut state, session_id, message).await
            }
            ConversationState::AwaitingNextQuizQuestion => self.on_next_question(&mut state),
            ConversationState::AwaitingNextTopicPermission => {
                self.on_next_topic(&mut state, message).await
            }
            ConversationState::ExplainingTopic => self.on_idle(&mut state, message).await,
        };
        debug!(from = %from, to = %state.conversation, "Turn complete");

        reply(&state, response)
    }

    async fn on_course_choice(&self, state: &mut SessionState, message: &str) -> String {
        if self.try_select_course(state, message) {
            return self.explain_current_topic(state).await;
        }
        let courses = self
            .catalog
            .courses()
            .iter()
            .map(|course| format!("- {}", course))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "I couldn't find that course. Here are the available ones:\n\n{}",
            courses
        )
    }

    /// Handles input once every topic is done: a course name starts over.
    async fn on_idle(&self, state: &mut SessionState, message: &str) -> String {
        if self.try_select_course(state, message) {
            return self.explain_current_topic(state).await;
        }
        UNKNOWN_INPUT.to_string()
    }

    async fn on_quiz_choice(&self, state: &mut SessionState, message: &str) -> String {
        if !is_affirmative(message) {
            state.request_clarification();
            return CLARIFY_PROMPT.to_string();
        }

        if state.quiz_questions.is_empty() {
            state.advance_topic();
            let next = self.explain_current_topic(state).await;
            return format!(
                "No quiz questions available. Moving to the next topic...\n\n{}",
                next
            );
        }

        state.current_quiz_index = 0;
        state.conversation = ConversationState::QuizQuestion;
        format!(
            "Let's start the quiz!\n\n{}",
            state.quiz_questions[0].question
        )
    }

    async fn on_clarification(&self, state: &mut SessionState, clarification: &str) -> String {
        let (Some(course), Some(topic)) = (
            state.selected_course.clone(),
            state
                .pending_clarification_topic
                .clone()
                .or_else(|| state.current_topic().map(str::to_string)),
        ) else {
            state.conversation = ConversationState::ExplainingTopic;
            return UNKNOWN_INPUT.to_string();
        };

        let simpler = self
            .guarded(
                "simplify_explanation",
                self.explainer
                    .simplify_explanation(&course, &topic, clarification),
            )
            .await
            .unwrap_or_else(|e| {
                format!(
                    "Sorry, I couldn't fetch a simplified explanation due to an error: {}",
                    e
                )
            });

        let quiz = self.fresh_quiz(&course, &topic).await;
        state.replace_quiz(quiz);
        state.conversation = ConversationState::AwaitingQuizChoice;

        format!("Here's a simpler explanation:\n\n{}\n\n{}", simpler, QUIZ_OFFER)
    }

    async fn on_quiz_answer(
        &self,
        state: &mut SessionState,
        session_id: &str,
        answer: &str,
    ) -> String {
        let (Some(question), Some(course)) =
            (state.current_question().cloned(), state.selected_course.clone())
        else {
            state.conversation = ConversationState::AwaitingNextTopicPermission;
            return "✅ You've already completed the quiz. Type 'yes' to proceed to the next topic."
                .to_string();
        };

        let rationale = self
            .guarded(
                "explain_answer",
                self.quizzer
                    .explain_answer(&course, &question.question, &question.answer),
            )
            .await
            .unwrap_or_else(|e| format!("Error getting explanation: {}", e));

        let correct = question.is_correct(answer);
        if correct {
            state.score += 1;
        }
        state.advance_quiz();
        self.persist_score(session_id, &course, state.score).await;

        let verdict = if correct {
            "✅ Correct!".to_string()
        } else {
            format!("❌ Incorrect. The correct answer is {}.", question.answer)
        };

        if state.has_more_questions() {
            state.conversation = ConversationState::AwaitingNextQuizQuestion;
            format!(
                "{}\n{}\n\nYour current score: {}\nType 'next' for the next question.",
                verdict, rationale, state.score
            )
        } else {
            state.current_quiz_index = 0;
            state.conversation = ConversationState::AwaitingNextTopicPermission;
            format!(
                "{}\n{}\n\n🎉 You've completed this quiz. Your final score: {}\nWould you like to continue to the next topic? (yes/no)",
                verdict, rationale, state.score
            )
        }
    }

    fn on_next_question(&self, state: &mut SessionState) -> String {
        match state.current_question().map(|q| q.question.clone()) {
            Some(text) => {
                state.conversation = ConversationState::QuizQuestion;
                text
            }
            None => {
                state.current_quiz_index = 0;
                state.conversation = ConversationState::AwaitingNextTopicPermission;
                "🎉 You've completed the quiz. Would you like to proceed to the next topic? (yes/no)"
                    .to_string()
            }
        }
    }

    async fn on_next_topic(&self, state: &mut SessionState, message: &str) -> String {
        if is_affirmative(message) {
            state.advance_topic();
            return self.explain_current_topic(state).await;
        }
        state.request_clarification();
        CLARIFY_PROMPT.to_string()
    }

    fn try_select_course(&self, state: &mut SessionState, message: &str) -> bool {
        let Some(course) = self.catalog.match_course(message) else {
            return false;
        };
        let topics = self.catalog.topics(course);
        debug!(course, topics = topics.len(), "Course selected");
        state.select_course(course, topics);
        true
    }

    /// Resolves the `ExplainingTopic` step within the current turn.
    ///
    /// Shows the cached or freshly fetched explanation, replaces the quiz and
    /// waits for the quiz choice. Past the last topic the session stays in
    /// `ExplainingTopic`.
    async fn explain_current_topic(&self, state: &mut SessionState) -> String {
        state.conversation = ConversationState::ExplainingTopic;

        let (Some(course), Some(topic)) = (
            state.selected_course.clone(),
            state.current_topic().map(str::to_string),
        ) else {
            return ALL_TOPICS_DONE.to_string();
        };

        let cached = state.explanations.get(&topic).cloned();
        let explanation = match cached {
            Some(text) => text,
            None => match self
                .guarded(
                    "fetch_explanation",
                    self.explainer.fetch_explanation(&course, &topic),
                )
                .await
            {
                Ok(text) => {
                    state.explanations.insert(topic.clone(), text.clone());
                    text
                }
                Err(e) => format!("Error fetching explanation: {}", e),
            },
        };

        let quiz = self.fresh_quiz(&course, &topic).await;
        state.replace_quiz(quiz);
        state.conversation = ConversationState::AwaitingQuizChoice;

        format!("**{}**:\n{}\n\n{}", topic, explanation, QUIZ_OFFER)
    }

    /// Generates a new quiz, degrading to a single unanswerable entry on failure.
    async fn fresh_quiz(&self, course: &str, topic: &str) -> Vec<QuizQuestion> {
        self.guarded(
            "generate_quiz_questions",
            self.quizzer.generate_quiz_questions(course, topic),
        )
        .await
        .unwrap_or_else(|e| {
            vec![QuizQuestion::unanswerable(format!(
                "Error generating quiz: {}",
                e
            ))]
        })
    }

    async fn persist_score(&self, session_id: &str, course: &str, score: u32) {
        if let Err(e) = self.scores.record_score(session_id, course, score).await {
            error!(session_id, course, score, error = %e, "Failed to record score");
        }
    }

    /// Applies the call timeout and logs collaborator failures.
    async fn guarded<T>(&self, call: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        let result = match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("request timed out after {:?}", self.call_timeout)),
        };
        if let Err(e) = &result {
            warn!(call, error = %e, "Tutor service call failed");
        }
        result
    }
}

fn is_affirmative(message: &str) -> bool {
    matches!(message.trim().to_lowercase().as_str(), "yes" | "y")
}

fn reply(state: &SessionState, response: String) -> Reply {
    Reply {
        response,
        progress: state.selected_course.as_ref().map(|course| CourseScore {
            course: course.clone(),
            score: state.score,
        }),
    }
}
