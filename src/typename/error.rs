//! Ошибки разбора записи типа.

use super::token::{Span, Token};
use thiserror::Error;

/// Ошибка разбора типа.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeParseError {
    /// Неожиданный токен.
    #[error("Unexpected token at position {}: expected {expected}, found {found}", span.start)]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    /// Неожиданный конец ввода.
    #[error("Unexpected end of type at position {}: {message}", span.start)]
    UnexpectedEnd { span: Span, message: String },

    /// Ошибка лексера.
    #[error("Lexer error at position {}: unexpected character", span.start)]
    LexerError { span: Span },

    /// Типы итераторов контейнеров не поддерживаются.
    #[error("Cannot handle iterator types: '{spelling}'")]
    IteratorType { spelling: String },
}

impl TypeParseError {
    /// Создать ошибку "неожиданный токен".
    pub fn unexpected_token(span: Span, expected: impl Into<String>, found: &Token) -> Self {
        Self::UnexpectedToken {
            span,
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Создать ошибку "неожиданный конец".
    pub fn unexpected_end(span: Span, message: impl Into<String>) -> Self {
        Self::UnexpectedEnd {
            span,
            message: message.into(),
        }
    }

    /// Получить позицию ошибки.
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. } => Some(*span),
            Self::UnexpectedEnd { span, .. } => Some(*span),
            Self::LexerError { span } => Some(*span),
            Self::IteratorType { .. } => None,
        }
    }
}
