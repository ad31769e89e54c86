//! # cywrap
//!
//! Генератор обёрток Cython для библиотек C++.
//!
//! ## Основные модули
//!
//! - [`cursor`] - Дерево объявлений от front end (JSON)
//! - [`ingest`] - Построение модели объявлений
//! - [`ast`] - Модель объявлений, обход и наследование
//! - [`typename`] - Разбор и нормализация записи типов
//! - [`registry`] - Реестр имён типов
//! - [`conversion`] - Конвертеры типов Python <-> C++
//! - [`specialize`] - Явная специализация шаблонов
//! - [`emit`] - Генерация `.pxd` и `.pyx`
//!
//! ## Конвейер
//!
//! ```text
//! Cursor -> ingest -> Ast -> flatten -> TypeRegistry -> specialize -> emit (.pyx, .pxd)
//! ```
//!
//! ## Пример использования
//!
//! ```rust
//! use cywrap::cursor::{Cursor, CursorKind};
//! use cywrap::{generate, Configuration, Input};
//!
//! let root = Cursor::translation_unit("calc.hpp").child(
//!     Cursor::new(CursorKind::FunctionDecl, "add")
//!         .with_result("int")
//!         .child(Cursor::new(CursorKind::ParmDecl, "a").with_type("int"))
//!         .child(Cursor::new(CursorKind::ParmDecl, "b").with_type("int")),
//! );
//!
//! let module = generate(&[Input::new("calc.hpp", root)], None, &Configuration::new()).unwrap();
//! assert_eq!(module.implementation.filename, "calc.pyx");
//! assert!(module.implementation.content.contains("cpdef add(int a, int b):"));
//! ```

// === Модель и вход ===
pub mod ast;
pub mod cursor;
pub mod ingest;
pub mod typename;

// === Преобразование ===
pub mod config;
pub mod conversion;
pub mod registry;
pub mod specialize;

// === Вывод ===
pub mod emit;

// === Общее ===
pub mod diagnostics;
pub mod error;
pub mod utils;

// === Re-exports для удобства ===
pub use ast::{Ast, DeclRef};
pub use config::Configuration;
pub use conversion::{ConversionContext, Includes, TypeConverter};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{ConversionError, WrapError, WrapResult};
pub use registry::TypeRegistry;

use std::path::Path;

use crate::ast::flatten::{apply_blacklist, flatten_inheritance, remove_duplicates};
use crate::cursor::Cursor;
use crate::emit::{DeclarationEmitter, ImplementationEmitter};

/// Один входной заголовок.
#[derive(Debug, Clone)]
pub struct Input {
    pub filename: String,
    pub cursor: Cursor,
}

impl Input {
    pub fn new(filename: impl Into<String>, cursor: Cursor) -> Self {
        Self {
            filename: filename.into(),
            cursor,
        }
    }
}

/// Сгенерированный файл.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub content: String,
}

/// Результат генерации одного модуля.
#[derive(Debug)]
pub struct GeneratedModule {
    pub module: String,
    /// `_<module>.pxd`
    pub declarations: Artifact,
    /// `<module>.pyx`
    pub implementation: Artifact,
    pub diagnostics: Diagnostics,
}

/// Имя модуля по имени файла: `dir/my_lib.hpp` -> `my_lib`.
pub fn derive_module_name(filename: &str) -> WrapResult<String> {
    let stem = Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or("");
    if stem.is_empty() {
        return Err(WrapError::InvalidPath(filename.to_string()));
    }
    Ok(stem.to_string())
}

fn module_name(inputs: &[Input], module_name: Option<&str>) -> WrapResult<String> {
    match (module_name, inputs) {
        (Some(name), _) if !name.is_empty() => Ok(name.to_string()),
        (Some(name), _) => Err(WrapError::InvalidPath(name.to_string())),
        (None, [input]) => derive_module_name(&input.filename),
        (None, _) => Err(WrapError::AmbiguousModuleName(inputs.len())),
    }
}

/// Сгенерировать файлы `.pxd` и `.pyx` для набора заголовков.
pub fn generate(
    inputs: &[Input],
    module: Option<&str>,
    config: &Configuration,
) -> WrapResult<GeneratedModule> {
    let module = module_name(inputs, module)?;
    let mut diagnostics = Diagnostics::new();

    let mut ast = Ast::new();
    for input in inputs {
        log::debug!("Ingesting '{}'", input.filename);
        ast.merge(ingest::ingest(&input.filename, &input.cursor, &mut diagnostics)?);
    }

    flatten_inheritance(&mut ast)?;
    remove_duplicates(&mut ast, &mut diagnostics);
    apply_blacklist(&mut ast, config, &mut diagnostics);

    let registry = TypeRegistry::build(&ast, config)?;
    specialize::specialize(&mut ast, config, &mut diagnostics)?;
    log::trace!("{}\n{}", utils::make_header(&format!("Module '{}'", module)), ast);

    let listing = ImplementationEmitter::new(&module, &ast, registry, config).emit(&ast)?;
    diagnostics.extend(listing.diagnostics);
    ast.mark_ignored(&listing.skipped);

    let declarations = DeclarationEmitter::new(config).emit(&ast)?;
    log::debug!(
        "Generated module '{}' with {} diagnostics",
        module,
        diagnostics.len()
    );

    let settings = &config.settings;
    Ok(GeneratedModule {
        declarations: Artifact {
            filename: format!("_{}.{}", module, settings.declaration_file_ending),
            content: declarations,
        },
        implementation: Artifact {
            filename: format!("{}.{}", module, settings.implementation_file_ending),
            content: listing.content,
        },
        module,
        diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorKind;

    #[test]
    fn test_derive_module_name() {
        assert_eq!(derive_module_name("my_lib.hpp").unwrap(), "my_lib");
        assert_eq!(derive_module_name("include/geo/shapes.h").unwrap(), "shapes");
        assert_eq!(derive_module_name("archive.tar.gz").unwrap(), "archive");
        assert!(matches!(derive_module_name(""), Err(WrapError::InvalidPath(_))));
        assert!(matches!(derive_module_name(".hidden"), Err(WrapError::InvalidPath(_))));
    }

    #[test]
    fn test_module_name_rules() {
        let a = Input::new("a.hpp", Cursor::translation_unit("a.hpp"));
        let b = Input::new("b.hpp", Cursor::translation_unit("b.hpp"));

        assert_eq!(module_name(&[a.clone()], None).unwrap(), "a");
        assert_eq!(module_name(&[a.clone(), b.clone()], Some("both")).unwrap(), "both");
        assert!(matches!(
            module_name(&[a, b], None),
            Err(WrapError::AmbiguousModuleName(2))
        ));
        assert!(matches!(module_name(&[], None), Err(WrapError::AmbiguousModuleName(0))));
    }

    #[test]
    fn test_generate_artifact_names() {
        let root = Cursor::translation_unit("geo.hpp")
            .child(Cursor::new(CursorKind::ClassDecl, "Point").with_location("geo.hpp"));
        let module = generate(&[Input::new("geo.hpp", root)], None, &Configuration::new()).unwrap();

        assert_eq!(module.module, "geo");
        assert_eq!(module.declarations.filename, "_geo.pxd");
        assert_eq!(module.implementation.filename, "geo.pyx");
        assert!(module.declarations.content.contains("cdef cppclass Point:"));
        assert!(module.implementation.content.contains("cimport _geo as cpp"));
        assert!(module.implementation.content.contains("cdef class Point:"));
    }

    #[test]
    fn test_skipped_declarations_left_out_of_pxd() {
        let root = Cursor::translation_unit("m.hpp").child(
            Cursor::new(CursorKind::FunctionDecl, "take")
                .with_result("void")
                .child(Cursor::new(CursorKind::ParmDecl, "w").with_type("Widget")),
        );
        let module = generate(&[Input::new("m.hpp", root)], None, &Configuration::new()).unwrap();

        assert!(!module.implementation.content.contains("take"));
        assert!(!module.declarations.content.contains("take"));
        assert!(module.diagnostics.mentions("function 'take'"));
    }
}
