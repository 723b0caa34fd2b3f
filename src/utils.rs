use std::fmt;
use std::io;
use thiserror::Error;

use crate::choices::Decision;

/// Custom error types for the grammar generator
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Failed to write generated text")]
    Output(#[from] fmt::Error),

    #[error("Undefined production: {0}")]
    UndefinedProduction(String),

    #[error("Unknown character class: {0}")]
    UnknownCharacterClass(String),

    #[error("Duplicate replacement for production: {0}")]
    DuplicateReplacement(String),

    #[error("Scripted choices exhausted while picking {0}")]
    ScriptExhausted(&'static str),

    #[error("Scripted choice mismatch: expected {expected}, found {found:?}")]
    ScriptMismatch {
        expected: &'static str,
        found: Decision,
    },

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("Generation exceeded maximum depth of {limit}")]
    GenerationTooDeep { limit: usize },

    #[error("Generation exceeded maximum output of {limit} code points")]
    GenerationTooLarge { limit: usize },

    #[error("Empty production: {0}")]
    EmptyProduction(String),

    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;

/// Trait extension for Option<T> to convert to GrammarError
pub trait OptionExt<T> {
    fn ok_or_undefined(self, production: &str) -> Result<T>;

    fn ok_or_invalid_decision<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_undefined(self, production: &str) -> Result<T> {
        self.ok_or_else(|| GrammarError::UndefinedProduction(production.to_string()))
    }

    fn ok_or_invalid_decision<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.ok_or_else(|| GrammarError::InvalidDecision(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GrammarError::UndefinedProduction("expr".to_string());
        assert_eq!(err.to_string(), "Undefined production: expr");

        let err = GrammarError::GenerationTooLarge { limit: 10 };
        assert_eq!(
            err.to_string(),
            "Generation exceeded maximum output of 10 code points"
        );

        let err = GrammarError::ScriptMismatch {
            expected: "an alternative",
            found: Decision::Optional(true),
        };
        assert_eq!(
            err.to_string(),
            "Scripted choice mismatch: expected an alternative, found Optional(true)"
        );
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u8> = None;
        assert!(matches!(
            missing.ok_or_undefined("bar"),
            Err(GrammarError::UndefinedProduction(name)) if name == "bar"
        ));

        let present = Some(3).ok_or_invalid_decision(|| "unused".to_string());
        assert_eq!(present.unwrap(), 3);
    }
}
