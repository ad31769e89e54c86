//! Токены и позиции для разбора C++-типов.

use serde::{Deserialize, Serialize};

/// Позиция в строке типа.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Начальная позиция (байт).
    pub start: usize,
    /// Конечная позиция (байт).
    pub end: usize,
}

impl Span {
    /// Создать новый Span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Объединить два Span.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Проверить, что `other` начинается сразу после `self` (без пробелов).
    pub fn touches(self, other: Span) -> bool {
        self.end == other.start
    }
}

/// Токен с позицией.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: Span) -> Self {
        Self { value, span }
    }
}

/// Токены записи C++-типа.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Идентификатор или ключевое слово (`const`, `unsigned`, `vector`)
    Ident(String),
    /// Целочисленный аргумент шаблона или размер массива
    Int(u64),
    /// `::`
    Scope,
    /// `<`
    LAngle,
    /// `>`
    RAngle,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `*`
    Star,
    /// `&`
    Amp,
    /// `&&`
    AmpAmp,
    /// Конец строки
    Eof,
}

impl Token {
    /// Проверить, является ли токен идентификатором с заданным текстом.
    pub fn is_ident(&self, text: &str) -> bool {
        matches!(self, Token::Ident(s) if s == text)
    }

    /// Проверить, закрывает ли токен список аргументов шаблона.
    pub fn is_closing(&self) -> bool {
        matches!(self, Token::RAngle | Token::RBracket)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "{}", s),
            Token::Int(n) => write!(f, "{}", n),
            Token::Scope => write!(f, "::"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Star => write!(f, "*"),
            Token::Amp => write!(f, "&"),
            Token::AmpAmp => write!(f, "&&"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
