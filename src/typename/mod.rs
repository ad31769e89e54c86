//! Разбор и нормализация записи C++-типов.
//!
//! Запись типа из front end (`const std::vector<std::string> &`)
//! приводится к виду, который понимает Cython:
//!
//! ```text
//! std::vector<std::string>            ->  vector[string]
//! std::map<std::string, double>       ->  map[string, double]
//! const char *const                   ->  char *
//! double [5]                          ->  double [5]
//! ```
//!
//! # Пример
//!
//! ```rust
//! use cywrap::typename::normalize;
//!
//! assert_eq!(normalize("const std::vector<int> &").unwrap(), "vector[int]");
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

pub use error::TypeParseError;
pub use lexer::Lexer;
pub use parser::{Parser, TypeArg, TypeExpr};
pub use token::{Span, Spanned, Token};

use std::collections::HashMap;

/// Распарсить запись типа в дерево.
pub fn parse_type(spelling: &str) -> Result<TypeExpr, TypeParseError> {
    Parser::new(spelling).parse()
}

/// Нормализовать запись типа.
///
/// Операция идемпотентна: повторная нормализация результата его не меняет.
pub fn normalize(spelling: &str) -> Result<String, TypeParseError> {
    parse_type(spelling).map(|ty| ty.to_string())
}

/// Тип вида `T *`.
pub fn is_pointer(spelling: &str) -> bool {
    parse_type(spelling).map(|ty| ty.is_pointer()).unwrap_or(false)
}

/// Тип без одного уровня указателя.
pub fn pointee(spelling: &str) -> Result<String, TypeParseError> {
    parse_type(spelling).map(|ty| ty.pointee().to_string())
}

/// Все имена, входящие в запись типа.
pub fn subtypes(spelling: &str) -> Result<Vec<String>, TypeParseError> {
    parse_type(spelling).map(|ty| ty.subtypes())
}

/// Заменить имена в записи типа по таблице (`T` -> `double`).
pub fn substitute(
    spelling: &str,
    table: &HashMap<String, String>,
) -> Result<String, TypeParseError> {
    if table.is_empty() {
        return normalize(spelling);
    }
    let mut parsed = HashMap::with_capacity(table.len());
    for (from, to) in table {
        parsed.insert(from.clone(), parse_type(to)?);
    }
    parse_type(spelling).map(|ty| ty.substitute(&parsed).to_string())
}
