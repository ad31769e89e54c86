//! Таблица необходимых импортов.
//!
//! Конвертеры отмечают, что им нужно, а преамбула файлов строится только
//! из отмеченного.

use std::collections::HashSet;

use crate::typename;

/// Контейнеры STL, для которых есть `libcpp.<name>`, в порядке вывода.
pub const STL_CONTAINERS: &[&str] = &[
    "vector", "string", "deque", "list", "map", "pair", "queue", "set", "stack",
];

/// Какие импорты понадобятся сгенерированному коду.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Includes {
    pub numpy: bool,
    pub boolean: bool,
    pub deref: bool,
    stl: HashSet<&'static str>,
}

impl Includes {
    /// Создать пустую таблицу.
    pub fn new() -> Self {
        Self::default()
    }

    /// Отметить импорты для всех имён, входящих в тип.
    pub fn add_include_for(&mut self, tname: &str) {
        // Нераспознаваемые записи не требуют импортов
        let names = match typename::subtypes(tname) {
            Ok(names) => names,
            Err(_) => return,
        };
        for name in names {
            let bare = name.trim_end_matches('*').trim_end();
            if bare == "bool" {
                self.boolean = true;
            }
            if let Some(container) = STL_CONTAINERS.iter().find(|c| **c == bare) {
                self.stl.insert(*container);
            }
        }
    }

    pub fn add_include_for_deref(&mut self) {
        self.deref = true;
    }

    pub fn add_include_for_numpy(&mut self) {
        self.numpy = true;
    }

    pub fn add_include_for_bool(&mut self) {
        self.boolean = true;
    }

    /// Используется ли контейнер STL.
    pub fn uses(&self, container: &str) -> bool {
        self.stl.contains(container)
    }

    /// Объединить с другой таблицей.
    pub fn merge(&mut self, other: &Includes) {
        self.numpy |= other.numpy;
        self.boolean |= other.boolean;
        self.deref |= other.deref;
        self.stl.extend(other.stl.iter().copied());
    }

    fn stl_imports(&self) -> Vec<String> {
        STL_CONTAINERS
            .iter()
            .filter(|c| self.stl.contains(*c))
            .map(|c| format!("from libcpp.{c} cimport {c}"))
            .collect()
    }

    fn bool_import(&self) -> Option<String> {
        self.boolean.then(|| "from libcpp cimport bool".to_string())
    }

    /// Импорты файла объявлений.
    pub fn declarations_import(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.bool_import().into_iter().collect();
        lines.extend(self.stl_imports());
        lines
    }

    /// Импорты файла реализации.
    pub fn implementations_import(&self, module: &str) -> Vec<String> {
        let mut lines: Vec<String> = self.bool_import().into_iter().collect();
        if self.numpy {
            lines.push("cimport numpy as np".to_string());
            lines.push("import numpy as np".to_string());
        }
        lines.extend(self.stl_imports());
        if self.deref {
            lines.push("from cython.operator cimport dereference as deref".to_string());
        }
        lines.push(format!("cimport _{} as cpp", module));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_string() {
        let mut inc = Includes::new();
        inc.add_include_for("string");
        assert!(inc.uses("string"));
        assert!(!inc.uses("vector"));
    }

    #[test]
    fn test_include_map() {
        let mut inc = Includes::new();
        inc.add_include_for("map[string, int]");
        assert!(inc.uses("map"));
        assert!(inc.uses("string"));
    }

    #[test]
    fn test_include_nested_pointer() {
        let mut inc = Includes::new();
        inc.add_include_for("vector[bool *]");
        assert!(inc.uses("vector"));
        assert!(inc.boolean);
    }

    #[test]
    fn test_implementations_import_order() {
        let mut inc = Includes::new();
        inc.add_include_for("map[string, vector[double]]");
        inc.add_include_for_deref();
        inc.add_include_for_numpy();
        inc.add_include_for_bool();

        assert_eq!(
            inc.implementations_import("mymodule"),
            vec![
                "from libcpp cimport bool",
                "cimport numpy as np",
                "import numpy as np",
                "from libcpp.vector cimport vector",
                "from libcpp.string cimport string",
                "from libcpp.map cimport map",
                "from cython.operator cimport dereference as deref",
                "cimport _mymodule as cpp",
            ]
        );
    }

    #[test]
    fn test_empty_table_imports_nothing() {
        let inc = Includes::new();
        assert!(inc.declarations_import().is_empty());
        assert_eq!(inc.implementations_import("m"), vec!["cimport _m as cpp"]);
    }

    #[test]
    fn test_bool_imported_only_when_used() {
        let mut inc = Includes::new();
        inc.add_include_for("vector[int]");
        assert_eq!(inc.declarations_import(), vec!["from libcpp.vector cimport vector"]);

        inc.add_include_for("bool");
        assert_eq!(inc.declarations_import()[0], "from libcpp cimport bool");
    }
}
