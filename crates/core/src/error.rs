//! Service-level errors.
//!
//! Transport failures never cross the service boundary; they are logged and
//! translated into one of these user-facing kinds.

/// Topic generation failed. Recoverable by retrying the same request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerationError {
    message: String,
}

impl GenerationError {
    pub const UNAVAILABLE: &'static str = "Impossible de contacter l'IA pour le moment.";

    pub fn unavailable() -> Self {
        Self {
            message: Self::UNAVAILABLE.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A chat turn could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("Le message est vide.")]
    EmptyMessage,
    #[error("Le message n'a pas pu être envoyé. Réessayez.")]
    SendFailed,
}
