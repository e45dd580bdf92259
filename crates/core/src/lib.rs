pub mod catalog;
pub mod dialogue;
pub mod persist;
pub mod quiz;
pub mod score;
pub mod session;
pub mod store;
pub mod tutor;

pub use dialogue::{CourseScore, DialogueEngine, Reply};
pub use session::{ConversationState, SessionState};
