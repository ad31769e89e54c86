//! Реестр известных типов.
//!
//! Строится один раз за запуск по всем деревьям объявлений. Единственная
//! изменяемая часть: подстановка активной специализации шаблона, которая
//! подключается перед генерацией членов специализации и снимается сразу после.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::ast::Ast;
use crate::config::Configuration;
use crate::error::{WrapError, WrapResult};

/// Реестр типов.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    classes: BTreeSet<String>,
    enums: BTreeSet<String>,
    typedefs: HashMap<String, String>,
    /// Имя C++ специализации (`A[double]`) -> имя класса Python.
    class_aliases: HashMap<String, String>,
    specialization: BTreeMap<String, String>,
    /// Имя активной специализации.
    active: Option<String>,
}

impl TypeRegistry {
    /// Создать пустой реестр.
    pub fn new() -> Self {
        Self::default()
    }

    /// Собрать реестр по дереву и проверить цепочки typedef.
    pub fn build(ast: &Ast, config: &Configuration) -> WrapResult<Self> {
        let mut registry = Self::new();

        for class in ast.classes.iter().filter(|c| !c.ignored) {
            if !class.is_template() {
                registry.add_class(&class.name);
                continue;
            }
            let key = qualified_key(&class.namespace, &class.name);
            for entry in config.specializations(&key).unwrap_or_default() {
                registry.add_class(&entry.name);
                let args = class
                    .template_params
                    .iter()
                    .map(|t| entry.types.get(t).cloned().unwrap_or_else(|| t.clone()))
                    .collect::<Vec<_>>();
                registry
                    .class_aliases
                    .insert(format!("{}[{}]", class.name, args.join(", ")), entry.name.clone());
            }
        }
        for e in ast.enums.iter().filter(|e| !e.ignored) {
            registry.add_enum(&e.name);
        }
        for t in ast.typedefs.iter().filter(|t| !t.ignored) {
            registry.add_typedef(&t.name, &t.underlying);
        }

        registry.validate()?;
        Ok(registry)
    }

    pub fn add_class(&mut self, name: &str) {
        self.classes.insert(name.to_string());
    }

    pub fn add_enum(&mut self, name: &str) {
        self.enums.insert(name.to_string());
    }

    pub fn add_typedef(&mut self, name: &str, underlying: &str) {
        self.typedefs.insert(name.to_string(), underlying.to_string());
    }

    /// Проверить, что цепочки typedef не зацикливаются.
    pub fn validate(&self) -> WrapResult<()> {
        let mut names: Vec<&String> = self.typedefs.keys().collect();
        names.sort();
        for name in names {
            self.underlying_type(name)?;
        }
        Ok(())
    }

    /// Раскрыть typedef и активную специализацию до неподвижной точки.
    pub fn underlying_type(&self, name: &str) -> WrapResult<String> {
        let mut current = name.to_string();
        let mut chain = vec![current.clone()];
        let mut seen = HashSet::new();
        seen.insert(current.clone());

        loop {
            let next = match self.typedefs.get(&current) {
                Some(next) => next,
                None => match self.specialization.get(&current) {
                    Some(next) => next,
                    None => return Ok(current),
                },
            };
            chain.push(next.clone());
            if !seen.insert(next.clone()) {
                return Err(WrapError::TypedefCycle(chain));
            }
            current = next.clone();
        }
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.classes.contains(name) || self.class_aliases.contains_key(name)
    }

    /// Имя класса Python для имени C++ (`A[double]` -> `ADouble`).
    pub fn host_class_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if self.classes.contains(name) {
            return Some(name);
        }
        self.class_aliases.get(name).map(|s| s.as_str())
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains(name)
    }

    pub fn is_typedef(&self, name: &str) -> bool {
        self.typedefs.contains_key(name)
    }

    /// Имя с префиксом модуля объявлений, если это typedef из библиотеки.
    pub fn typedef_prefix(&self, name: &str) -> String {
        if self.is_typedef(name) {
            format!("cpp.{}", name)
        } else {
            name.to_string()
        }
    }

    /// Подключить подстановку специализации.
    pub fn attach_specialization(
        &mut self,
        name: &str,
        substitution: &BTreeMap<String, String>,
    ) -> WrapResult<()> {
        if let Some(active) = &self.active {
            return Err(WrapError::NestedSpecialization(active.clone()));
        }
        self.active = Some(name.to_string());
        self.specialization = substitution.clone();
        Ok(())
    }

    /// Снять подстановку специализации.
    pub fn remove_specialization(&mut self) {
        self.active = None;
        self.specialization.clear();
    }
}

/// Ключ `Namespace::Name` (или просто `Name` без пространства имён).
pub fn qualified_key(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", namespace, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Class, Enum, Typedef};

    #[test]
    fn test_underlying_type() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.underlying_type("tdef").unwrap(), "tdef");
        registry.add_typedef("tdef", "float");
        assert_eq!(registry.underlying_type("tdef").unwrap(), "float");
        registry.add_typedef("tdef2", "tdef");
        assert_eq!(registry.underlying_type("tdef2").unwrap(), "float");
    }

    #[test]
    fn test_typedef_cycle_is_detected() {
        let mut registry = TypeRegistry::new();
        registry.add_typedef("tdef1", "tdef2");
        registry.add_typedef("tdef2", "tdef1");

        let err = registry.underlying_type("tdef1").unwrap_err();
        match err {
            WrapError::TypedefCycle(chain) => {
                assert_eq!(chain, vec!["tdef1", "tdef2", "tdef1"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(registry.validate().is_err());
    }

    #[test]
    fn test_typedef_prefix() {
        let mut registry = TypeRegistry::new();
        assert_eq!(registry.typedef_prefix("tdef"), "tdef");
        registry.add_typedef("tdef", "float");
        assert_eq!(registry.typedef_prefix("tdef"), "cpp.tdef");
    }

    #[test]
    fn test_specialization_scope() {
        let mut registry = TypeRegistry::new();
        let mut spec = BTreeMap::new();
        spec.insert("T".to_string(), "double".to_string());

        registry.attach_specialization("ADouble", &spec).unwrap();
        assert_eq!(registry.underlying_type("T").unwrap(), "double");

        let err = registry.attach_specialization("AInt", &spec).unwrap_err();
        assert!(matches!(err, WrapError::NestedSpecialization(ref n) if n == "ADouble"));

        registry.remove_specialization();
        assert_eq!(registry.underlying_type("T").unwrap(), "T");
        assert!(registry.attach_specialization("AInt", &spec).is_ok());
    }

    #[test]
    fn test_build_from_ast() {
        let mut ast = Ast::new();
        ast.classes.push(Class::new("a.hpp", "", "A"));
        let mut template = Class::new("a.hpp", "ns", "Vec");
        template.template_params.push("T".into());
        ast.classes.push(template);
        let mut hidden = Class::new("a.hpp", "", "Hidden");
        hidden.ignored = true;
        ast.classes.push(hidden);
        ast.enums.push(Enum {
            name: "Color".into(),
            ..Enum::default()
        });
        ast.typedefs.push(Typedef {
            name: "real".into(),
            underlying: "double".into(),
            ..Typedef::default()
        });

        let mut config = Configuration::new();
        config.register_class_specialization("ns::Vec", "VecDouble", &[("T", "double")]);

        let registry = TypeRegistry::build(&ast, &config).unwrap();
        assert!(registry.is_class("A"));
        assert!(registry.is_class("VecDouble"));
        assert!(!registry.is_class("Vec"));
        assert!(!registry.is_class("Hidden"));
        assert_eq!(registry.host_class_name("Vec[double]"), Some("VecDouble"));
        assert!(registry.is_enum("Color"));
        assert_eq!(registry.underlying_type("real").unwrap(), "double");
    }

    #[test]
    fn test_build_rejects_cycle() {
        let mut ast = Ast::new();
        for (name, underlying) in [("tdef1", "tdef2"), ("tdef2", "tdef1")] {
            ast.typedefs.push(Typedef {
                name: name.into(),
                underlying: underlying.into(),
                ..Typedef::default()
            });
        }
        let err = TypeRegistry::build(&ast, &Configuration::new()).unwrap_err();
        assert!(matches!(err, WrapError::TypedefCycle(_)));
    }
}
