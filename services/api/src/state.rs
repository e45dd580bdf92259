//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the dialogue engine and the progress store.

use crate::progress::ProgressStore;
use std::sync::Arc;
use tutor_core::{DialogueEngine, catalog::ContentCatalog};

/// The shared application state, created once at startup and passed to all handlers.
/// All fields are public to be accessible from other modules.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    pub catalog: Arc<ContentCatalog>,
    pub progress: Arc<ProgressStore>,
}
