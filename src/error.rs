//! Определения ошибок для cywrap.

use thiserror::Error;

use crate::typename::TypeParseError;

/// Основной тип `Result` для библиотеки.
pub type WrapResult<T> = Result<T, WrapError>;

/// Класс ошибки: определяет, прерывает ли она весь запуск.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Вход невозможно разобрать.
    Fatal,
    /// Некорректная конфигурация или пути.
    Configuration,
    /// Ошибка пользователя генератора, для которой нет разумного поведения по умолчанию.
    Programmer,
}

/// Ошибки уровня всего запуска.
#[derive(Error, Debug)]
pub enum WrapError {
    // === Фатальные ===
    #[error("Frontend error: {0}")]
    Frontend(String),

    #[error("Could not find a typedef for anonymous struct '{0}'")]
    UnmatchedAnonymousStruct(String),

    #[error("Invalid cursor tree: {0}")]
    InvalidCursorTree(String),

    // === Конфигурация ===
    #[error("Invalid path: '{0}'")]
    InvalidPath(String),

    #[error("Module name is required when more than one input is given ({0} inputs)")]
    AmbiguousModuleName(usize),

    #[error("Typedef cycle detected: {}", .0.join(" -> "))]
    TypedefCycle(Vec<String>),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("A template specialization is already active ('{0}')")]
    NestedSpecialization(String),

    // === Ошибки программиста ===
    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Malformed specialization '{key}': {message}")]
    MalformedSpecialization { key: String, message: String },
}

impl WrapError {
    /// Класс ошибки.
    pub fn category(&self) -> ErrorCategory {
        match self {
            WrapError::Frontend(_)
            | WrapError::UnmatchedAnonymousStruct(_)
            | WrapError::InvalidCursorTree(_) => ErrorCategory::Fatal,
            WrapError::InvalidPath(_)
            | WrapError::AmbiguousModuleName(_)
            | WrapError::TypedefCycle(_)
            | WrapError::InvalidConfig(_)
            | WrapError::NestedSpecialization(_) => ErrorCategory::Configuration,
            WrapError::UnknownOperator(_) | WrapError::MalformedSpecialization { .. } => {
                ErrorCategory::Programmer
            }
        }
    }
}

impl From<serde_json::Error> for WrapError {
    fn from(err: serde_json::Error) -> Self {
        WrapError::InvalidConfig(err.to_string())
    }
}

/// Ошибка преобразования одного типа.
///
/// Все варианты, кроме `Fatal`, приводят к пропуску одного объявления.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("No type converter available for type '{0}'")]
    NoConverter(String),

    #[error("Converter {converter} does not support {operation} for '{tname}'")]
    Unsupported {
        converter: &'static str,
        operation: &'static str,
        tname: String,
    },

    #[error("Cannot parse type: {0}")]
    TypeParse(#[from] TypeParseError),

    #[error("{0}")]
    Custom(String),

    #[error(transparent)]
    Fatal(#[from] WrapError),
}

impl ConversionError {
    /// Создать ошибку "операция не поддерживается".
    pub fn unsupported(
        converter: &'static str,
        operation: &'static str,
        tname: impl Into<String>,
    ) -> Self {
        ConversionError::Unsupported {
            converter,
            operation,
            tname: tname.into(),
        }
    }

    /// Прерывает ли ошибка весь запуск.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConversionError::Fatal(_))
    }
}
