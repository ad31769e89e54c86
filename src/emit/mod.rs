//! Генерация файлов Cython по дереву объявлений.
//!
//! Два независимых посетителя: [`DeclarationEmitter`] пишет `.pxd` с
//! внешними объявлениями C++, [`ImplementationEmitter`] пишет `.pyx` с
//! классами и функциями Python, которые преобразуют значения и вызывают C++.

pub mod declarations;
pub mod implementations;

pub use declarations::DeclarationEmitter;
pub use implementations::{ImplementationEmitter, ImplementationListing};

/// Заголовок блока внешних объявлений.
pub(crate) fn extern_header(filename: &str, namespace: &str) -> String {
    format!("cdef extern from \"{}\" namespace \"{}\":", filename, namespace)
}

/// Строка документации Python.
pub(crate) fn docstring(comment: Option<&str>) -> Option<String> {
    let text = comment?.trim();
    if text.is_empty() {
        return None;
    }
    Some(format!("\"\"\"{}\"\"\"", text.replace("\"\"\"", "\\\"\\\"\\\"")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extern_header() {
        assert_eq!(
            extern_header("test.hpp", "ns"),
            "cdef extern from \"test.hpp\" namespace \"ns\":"
        );
    }

    #[test]
    fn test_docstring() {
        assert_eq!(docstring(None), None);
        assert_eq!(docstring(Some("  ")), None);
        assert_eq!(docstring(Some("Adds numbers.")).unwrap(), "\"\"\"Adds numbers.\"\"\"");
    }
}
