//! Centralised error hierarchy for the interpreter.
//!
//! All phases (scanner, parser, resolver, runtime) convert their failure
//! modes into one of the variants defined here.  This enables a uniform
//! `Result<T>` alias throughout the crate while preserving the diagnostic
//! detail each phase needs.
//!
//! The module does not print diagnostics itself; the driver decides where
//! reports go and which exit code they map to.

use log::debug;
use thiserror::Error;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
///
/// Compile-time variants render as `[line N] Error <where>: <message>`,
/// where `<where>` is empty for scanner errors, `at end` at end of input,
/// or `at '<lexeme>'` otherwise.  Runtime errors render as
/// `[line N] <message>`.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human-readable description.
        message: String,

        /// 1-based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error {location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static-analysis failure reported by the resolver.
    #[error("[line {line}] Error {location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.  Fatal to the current program.
    #[error("[line {line}] {message}")]
    Runtime { message: String, line: usize },
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: locate(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", line, message);

        LoxError::Runtime { message, line }
    }

    /// Runtime errors abort a script with exit code 70; everything else is
    /// a compile-time report mapping to exit code 65.
    pub fn is_fatal(&self) -> bool {
        matches!(self, LoxError::Runtime { .. })
    }
}

fn locate(token: &Token) -> String {
    format!("at {}", token)
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
