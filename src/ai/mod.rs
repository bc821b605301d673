//! AI-backed risk synthesis plumbing: the completer seam, prompt
//! construction, defensive output parsing, and the deterministic
//! fallback generator.

pub mod completer;
pub mod fallback;
pub mod parser;
pub mod prompt;

pub use completer::{Completer, CompleterError, ScriptedCompleter, UnavailableCompleter};
pub use parser::{ParsedRisk, FALLBACK_MITIGATIONS};
pub use prompt::RiskPromptBuilder;
