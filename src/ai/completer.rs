//! The text-completion seam.
//!
//! The upstream service is unreliable by assumption: callers must treat
//! every error here as a signal to fall back, never as a hard failure.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompleterError {
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion transport failed: {0}")]
    Transport(String),
    #[error("completion service returned an empty response")]
    Empty,
}

impl CompleterError {
    /// Transport failures are worth one retry; the rest are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CompleterError::Transport(_))
    }
}

/// A text-completion service.
pub trait Completer: Send + Sync {
    /// Complete `prompt` within `timeout`.
    ///
    /// Implementations must enforce the timeout themselves; callers
    /// will not wrap this in another timer.
    fn complete(&self, prompt: &str, timeout: Duration) -> Result<String, CompleterError>;
}

/// Completer that replays a fixed response. Used by the CLI's
/// completion-file mode and by tests.
pub struct ScriptedCompleter {
    response: String,
}

impl ScriptedCompleter {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Completer for ScriptedCompleter {
    fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, CompleterError> {
        if self.response.trim().is_empty() {
            Err(CompleterError::Empty)
        } else {
            Ok(self.response.clone())
        }
    }
}

/// Completer that always fails at the transport level. The default
/// when no upstream service is configured.
pub struct UnavailableCompleter;

impl Completer for UnavailableCompleter {
    fn complete(&self, _prompt: &str, _timeout: Duration) -> Result<String, CompleterError> {
        Err(CompleterError::Transport(
            "no completion service configured".to_string(),
        ))
    }
}
