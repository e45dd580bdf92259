//! API Models
//!
//! Request and response bodies for the HTTP API, annotated for OpenAPI
//! generation with `utoipa`.

use serde::{Deserialize, Serialize};
use tutor_core::SessionState;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug)]
pub struct ChatPayload {
    /// Conversation to continue. Defaults to the caller's user id.
    #[schema(example = "3f1c2a9e")]
    pub session_id: Option<String>,
    #[schema(example = "Python")]
    pub message: Option<String>,
}

#[derive(Serialize, ToSchema, Debug)]
pub struct ChatResponse {
    pub response: String,
}

/// Read-only view of a conversation's progress.
#[derive(Serialize, ToSchema, Debug, PartialEq)]
pub struct SessionView {
    pub session_id: String,
    #[schema(example = "awaiting_quiz_choice")]
    pub state: String,
    pub selected_course: Option<String>,
    pub current_topic: Option<String>,
    pub current_topic_index: usize,
    pub topic_count: usize,
    pub current_quiz_index: usize,
    pub quiz_length: usize,
    pub score: u32,
}

impl SessionView {
    pub fn new(session_id: &str, state: &SessionState) -> Self {
        Self {
            session_id: session_id.to_string(),
            state: state.conversation.to_string(),
            selected_course: state.selected_course.clone(),
            current_topic: state.current_topic().map(str::to_string),
            current_topic_index: state.current_topic_index,
            topic_count: state.topics.len(),
            current_quiz_index: state.current_quiz_index,
            quiz_length: state.quiz_questions.len(),
            score: state.score,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::ConversationState;

    #[test]
    fn test_chat_payload_fields_are_optional() {
        let payload: ChatPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.session_id.is_none());
        assert!(payload.message.is_none());

        let payload: ChatPayload =
            serde_json::from_str(r#"{"session_id": "abc", "message": "yes"}"#).unwrap();
        assert_eq!(payload.session_id.as_deref(), Some("abc"));
        assert_eq!(payload.message.as_deref(), Some("yes"));
    }

    #[test]
    fn test_chat_response_serialization() {
        let json = serde_json::to_string(&ChatResponse {
            response: "Please type a message.".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"response":"Please type a message."}"#);
    }

    #[test]
    fn test_session_view_from_state() {
        let mut state = SessionState::new();
        state.select_course("Python", vec!["Variables".into(), "Loops".into()]);
        state.advance_topic();
        state.conversation = ConversationState::AwaitingQuizChoice;
        state.score = 3;

        let view = SessionView::new("s1", &state);

        assert_eq!(view.state, "awaiting_quiz_choice");
        assert_eq!(view.selected_course.as_deref(), Some("Python"));
        assert_eq!(view.current_topic.as_deref(), Some("Loops"));
        assert_eq!(view.current_topic_index, 1);
        assert_eq!(view.topic_count, 2);
        assert_eq!(view.score, 3);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Session not found".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Session not found"}"#);
    }
}
