//! Tutor API Library Crate
//!
//! This library contains the web-facing side of the tutoring service: the
//! application state, configuration, progress store, API handlers and
//! routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod progress;
pub mod router;
pub mod state;
