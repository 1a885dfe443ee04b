//! Résonance Terminal Application
//!
//! Configuration, shared state, the event loop driving the core controller
//! and the terminal front-end. The `resonance` binary is a thin wrapper
//! around this library.

pub mod clipboard;
pub mod config;
pub mod input;
pub mod runtime;
pub mod state;
pub mod view;
