//! Проходы над деревом после ингестии: наследование, дубликаты, чёрный список.

use std::collections::{HashMap, HashSet};

use super::{Ast, Class, Method};
use crate::config::Configuration;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{WrapError, WrapResult};

/// Индекс классов по имени (первое объявление побеждает).
struct InheritanceIndex<'a> {
    classes: HashMap<&'a str, &'a Class>,
}

impl<'a> InheritanceIndex<'a> {
    fn new(classes: &'a [Class]) -> Self {
        let mut index = HashMap::with_capacity(classes.len());
        for class in classes {
            index.entry(class.name.as_str()).or_insert(class);
        }
        Self { classes: index }
    }
}

/// Скопировать унаследованные методы в каждый класс.
///
/// Итоговый список класса: его собственные методы, затем методы базовых
/// классов (по цепочке вглубь), имена которых ещё не встречались.
pub fn flatten_inheritance(ast: &mut Ast) -> WrapResult<()> {
    let mut memo: HashMap<String, Vec<Method>> = HashMap::new();
    {
        let index = InheritanceIndex::new(&ast.classes);
        for class in &ast.classes {
            let mut chain = Vec::new();
            effective_methods(&index, &class.name, &mut memo, &mut chain)?;
        }
    }

    for class in ast.classes.iter_mut() {
        if class.base.is_none() {
            continue;
        }
        if let Some(methods) = memo.get(&class.name) {
            let inherited = methods.len() - class.methods.len().min(methods.len());
            if inherited > 0 {
                log::debug!(
                    "Class '{}' inherits {} method(s) from '{}'",
                    class.name,
                    inherited,
                    class.base.as_deref().unwrap_or_default()
                );
            }
            class.methods = methods.clone();
        }
    }
    Ok(())
}

fn effective_methods(
    index: &InheritanceIndex<'_>,
    name: &str,
    memo: &mut HashMap<String, Vec<Method>>,
    chain: &mut Vec<String>,
) -> WrapResult<Vec<Method>> {
    if let Some(methods) = memo.get(name) {
        return Ok(methods.clone());
    }
    if chain.iter().any(|c| c == name) {
        chain.push(name.to_string());
        return Err(WrapError::InvalidCursorTree(format!(
            "Inheritance cycle: {}",
            chain.join(" -> ")
        )));
    }
    let Some(class) = index.classes.get(name) else {
        // Базовый класс из другой библиотеки
        return Ok(Vec::new());
    };

    let mut methods = class.methods.clone();
    if let Some(base) = &class.base {
        chain.push(name.to_string());
        let inherited = stacker::maybe_grow(32 * 1024, 1024 * 1024, || {
            effective_methods(index, base, memo, chain)
        })?;
        chain.pop();

        let own: HashSet<String> = methods.iter().map(|m| m.name.clone()).collect();
        for mut method in inherited {
            if own.contains(&method.name) {
                continue;
            }
            method.class_name = class.name.clone();
            methods.push(method);
        }
    }

    memo.insert(name.to_string(), methods.clone());
    Ok(methods)
}

/// Удалить повторяющиеся методы и функции (в Python нет перегрузки).
pub fn remove_duplicates(ast: &mut Ast, diagnostics: &mut Diagnostics) {
    for class in ast.classes.iter_mut() {
        let mut seen = HashSet::new();
        let class_name = class.name.clone();
        class.methods.retain(|method| {
            if seen.insert(method.name.clone()) {
                true
            } else {
                diagnostics.push(
                    DiagnosticKind::DuplicateMethod,
                    format!(
                        "Method '{}.{}' is already defined. Only the first declaration will be exposed.",
                        class_name, method.name
                    ),
                );
                false
            }
        });
    }

    let mut seen = HashSet::new();
    ast.functions.retain(|function| {
        if seen.insert(function.name.clone()) {
            true
        } else {
            diagnostics.push(
                DiagnosticKind::DuplicateFunction,
                format!(
                    "Function '{}' is already defined. Only the first declaration will be exposed.",
                    function.name
                ),
            );
            false
        }
    });
}

/// Применить чёрный список и отметки абстрактных классов из конфигурации.
pub fn apply_blacklist(ast: &mut Ast, config: &Configuration, diagnostics: &mut Diagnostics) {
    for class in ast.classes.iter_mut() {
        if config.is_ignored_class(&class.filename, &class.name) {
            class.ignored = true;
            diagnostics.push(
                DiagnosticKind::Blacklisted,
                format!("Class '{}' is on the blacklist and will be ignored.", class.name),
            );
            continue;
        }
        if config.is_abstract(&class.name) {
            class.is_abstract = true;
        }
        for method in class.methods.iter_mut() {
            if config.is_ignored_method(&class.name, &method.name) {
                method.ignored = true;
                diagnostics.push(
                    DiagnosticKind::Blacklisted,
                    format!(
                        "Method '{}.{}' is on the blacklist and will be ignored.",
                        class.name, method.name
                    ),
                );
            }
        }
    }

    for function in ast.functions.iter_mut() {
        if config.is_ignored_function(&function.namespace, &function.name) {
            function.ignored = true;
            diagnostics.push(
                DiagnosticKind::Blacklisted,
                format!(
                    "Function '{}' is on the blacklist and will be ignored.",
                    function.name
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Function;

    fn class_with(name: &str, base: Option<&str>, methods: &[&str]) -> Class {
        let mut class = Class::new("test.hpp", "", name);
        class.base = base.map(str::to_string);
        for m in methods {
            class.methods.push(Method::new(*m, "void", name));
        }
        class
    }

    fn method_names(ast: &Ast, class: &str) -> Vec<String> {
        ast.class(class)
            .unwrap()
            .methods
            .iter()
            .map(|m| m.name.clone())
            .collect()
    }

    #[test]
    fn test_inherited_method_is_copied() {
        let mut ast = Ast::new();
        ast.classes.push(class_with("Base", None, &["m"]));
        ast.classes.push(class_with("Derived", Some("Base"), &["d"]));

        flatten_inheritance(&mut ast).unwrap();

        assert_eq!(method_names(&ast, "Derived"), vec!["d", "m"]);
        assert_eq!(ast.class("Derived").unwrap().methods[1].class_name, "Derived");
        assert_eq!(method_names(&ast, "Base"), vec!["m"]);
    }

    #[test]
    fn test_override_wins() {
        let mut ast = Ast::new();
        ast.classes.push(class_with("Base", None, &["m", "n"]));
        let mut derived = class_with("Derived", Some("Base"), &[]);
        derived.methods.push(Method::new("m", "int", "Derived"));
        ast.classes.push(derived);

        flatten_inheritance(&mut ast).unwrap();

        let class = ast.class("Derived").unwrap();
        assert_eq!(method_names(&ast, "Derived"), vec!["m", "n"]);
        assert_eq!(class.method("m").unwrap().result_type, "int");
    }

    #[test]
    fn test_deep_chain_every_level() {
        let mut ast = Ast::new();
        // Порядок объявлений не важен
        ast.classes.push(class_with("C", Some("B"), &["c"]));
        ast.classes.push(class_with("B", Some("A"), &["b", "a"]));
        ast.classes.push(class_with("A", None, &["a", "root"]));

        flatten_inheritance(&mut ast).unwrap();

        assert_eq!(method_names(&ast, "B"), vec!["b", "a", "root"]);
        assert_eq!(method_names(&ast, "C"), vec!["c", "b", "a", "root"]);
    }

    #[test]
    fn test_unknown_base_is_ignored() {
        let mut ast = Ast::new();
        ast.classes.push(class_with("Derived", Some("std::exception"), &["d"]));
        flatten_inheritance(&mut ast).unwrap();
        assert_eq!(method_names(&ast, "Derived"), vec!["d"]);
    }

    #[test]
    fn test_inheritance_cycle() {
        let mut ast = Ast::new();
        ast.classes.push(class_with("A", Some("B"), &[]));
        ast.classes.push(class_with("B", Some("A"), &[]));
        let err = flatten_inheritance(&mut ast).unwrap_err();
        assert!(matches!(err, WrapError::InvalidCursorTree(_)));
    }

    #[test]
    fn test_remove_duplicate_methods() {
        let mut ast = Ast::new();
        let mut class = class_with("A", None, &["plusOne"]);
        class.methods.push(Method::new("plusOne", "double", "A"));
        ast.classes.push(class);

        let mut diagnostics = Diagnostics::new();
        remove_duplicates(&mut ast, &mut diagnostics);

        assert_eq!(method_names(&ast, "A"), vec!["plusOne"]);
        assert_eq!(ast.class("A").unwrap().methods[0].result_type, "void");
        assert!(diagnostics.mentions("Method 'A.plusOne' is already defined"));
    }

    #[test]
    fn test_remove_duplicate_functions() {
        let mut ast = Ast::new();
        ast.functions.push(Function::new("a.hpp", "", "plusOne", "int"));
        ast.functions.push(Function::new("a.hpp", "", "plusOne", "double"));

        let mut diagnostics = Diagnostics::new();
        remove_duplicates(&mut ast, &mut diagnostics);

        assert_eq!(ast.functions.len(), 1);
        assert_eq!(ast.functions[0].result_type, "int");
        assert_eq!(
            diagnostics.of_kind(DiagnosticKind::DuplicateFunction).count(),
            1
        );
        assert!(diagnostics.mentions("Function 'plusOne' is already defined"));
    }

    #[test]
    fn test_apply_blacklist() {
        let mut ast = Ast::new();
        ast.classes.push(class_with("A", None, &["keep", "drop"]));
        ast.classes.push(class_with("B", None, &[]));
        ast.functions.push(Function::new("test.hpp", "ns", "gone", "void"));

        let mut config = Configuration::new();
        config.ignore_class(None, "B");
        config.ignore_method("A", "drop");
        config.ignore_function("ns", "gone");
        config.mark_abstract("A");

        let mut diagnostics = Diagnostics::new();
        apply_blacklist(&mut ast, &config, &mut diagnostics);

        let a = ast.class("A").unwrap();
        assert!(a.is_abstract);
        assert!(!a.method("keep").unwrap().ignored);
        assert!(a.method("drop").unwrap().ignored);
        assert!(ast.class("B").unwrap().ignored);
        assert!(ast.functions[0].ignored);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::Blacklisted).count(), 3);
    }
}
