//! Диагностика пропущенных объявлений.
//!
//! Каждая запись одновременно пишется в лог (`log::warn!`) и сохраняется,
//! чтобы вызывающий код мог её проверить.

use std::fmt;

/// Причина, по которой объявление было пропущено.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Несколько конструкторов у одного класса.
    DuplicateConstructor,
    /// Повторное имя метода в классе.
    DuplicateMethod,
    /// Повторное имя свободной функции.
    DuplicateFunction,
    /// Шаблон без зарегистрированной специализации.
    MissingSpecialization,
    /// Объявление в чёрном списке.
    Blacklisted,
    /// Конструктор абстрактного класса не генерируется.
    AbstractClass,
    /// Нет конвертера для типа.
    UnsupportedType,
    /// Параметр вне функции.
    OrphanParameter,
    /// Узел front end не может быть обработан.
    IgnoredNode,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::DuplicateConstructor => "duplicate-constructor",
            DiagnosticKind::DuplicateMethod => "duplicate-method",
            DiagnosticKind::DuplicateFunction => "duplicate-function",
            DiagnosticKind::MissingSpecialization => "missing-specialization",
            DiagnosticKind::Blacklisted => "blacklisted",
            DiagnosticKind::AbstractClass => "abstract-class",
            DiagnosticKind::UnsupportedType => "unsupported-type",
            DiagnosticKind::OrphanParameter => "orphan-parameter",
            DiagnosticKind::IgnoredNode => "ignored-node",
        };
        write!(f, "{}", name)
    }
}

/// Одна запись диагностики.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Накопитель диагностики за один запуск.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Создать пустой накопитель.
    pub fn new() -> Self {
        Self::default()
    }

    /// Записать диагностику.
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.entries.push(Diagnostic { kind, message });
    }

    /// Все записи в порядке появления.
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Записи заданного вида.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Есть ли запись, содержащая подстроку.
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Перенести записи из другого накопителя.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}
