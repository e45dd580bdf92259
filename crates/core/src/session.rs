//! Per-conversation state owned by the dialogue engine.

use crate::quiz::QuizQuestion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The discrete stage of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No course chosen yet.
    #[default]
    WaitingForCourse,
    /// Transient while a topic is being explained. A session only rests here
    /// once every topic of the course has been covered.
    ExplainingTopic,
    /// An explanation was shown; the user may take the quiz or ask for help.
    AwaitingQuizChoice,
    /// The user is asked which part of the topic was unclear.
    AwaitingClarification,
    /// A quiz question is pending an answer letter.
    QuizQuestion,
    /// An answer was graded and more questions remain.
    AwaitingNextQuizQuestion,
    /// The quiz round is over; the user may move on to the next topic.
    AwaitingNextTopicPermission,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingForCourse => "waiting_for_course",
            Self::ExplainingTopic => "explaining_topic",
            Self::AwaitingQuizChoice => "awaiting_quiz_choice",
            Self::AwaitingClarification => "awaiting_clarification",
            Self::QuizQuestion => "quiz_question",
            Self::AwaitingNextQuizQuestion => "awaiting_next_quiz_question",
            Self::AwaitingNextTopicPermission => "awaiting_next_topic_permission",
        }
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of a single conversation.
///
/// `current_topic_index` stays within `0..=topics.len()` and
/// `current_quiz_index` within `0..=quiz_questions.len()`; the upper bound is
/// the end-of-sequence sentinel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub conversation: ConversationState,
    pub selected_course: Option<String>,
    pub topics: Vec<String>,
    pub current_topic_index: usize,
    /// Explanations already fetched for topics of the selected course.
    pub explanations: HashMap<String, String>,
    pub quiz_questions: Vec<QuizQuestion>,
    pub current_quiz_index: usize,
    /// Correct answers across every quiz of this session.
    pub score: u32,
    pub pending_clarification_topic: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `course` from its first topic.
    ///
    /// Switching to a different course drops the cached explanations, since
    /// topic names are only unique within a course.
    pub fn select_course(&mut self, course: &str, topics: Vec<String>) {
        if self.selected_course.as_deref() != Some(course) {
            self.explanations.clear();
        }
        self.selected_course = Some(course.to_string());
        self.topics = topics;
        self.current_topic_index = 0;
    }

    /// The topic under the cursor, if any remain.
    pub fn current_topic(&self) -> Option<&str> {
        self.topics.get(self.current_topic_index).map(String::as_str)
    }

    /// Moves the topic cursor forward, stopping at the end sentinel.
    pub fn advance_topic(&mut self) {
        if self.current_topic_index < self.topics.len() {
            self.current_topic_index += 1;
        }
    }

    /// Replaces the quiz wholesale and rewinds the quiz cursor.
    pub fn replace_quiz(&mut self, questions: Vec<QuizQuestion>) {
        self.quiz_questions = questions;
        self.current_quiz_index = 0;
    }

    /// The question under the quiz cursor, if any remain.
    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.quiz_questions.get(self.current_quiz_index)
    }

    /// Moves the quiz cursor forward, stopping at the end sentinel.
    pub fn advance_quiz(&mut self) {
        if self.current_quiz_index < self.quiz_questions.len() {
            self.current_quiz_index += 1;
        }
    }

    pub fn has_more_questions(&self) -> bool {
        self.current_quiz_index < self.quiz_questions.len()
    }

    /// Remembers the current topic as the subject of the next clarification.
    pub fn request_clarification(&mut self) {
        self.pending_clarification_topic = self.current_topic().map(str::to_string);
        self.conversation = ConversationState::AwaitingClarification;
    }
}
