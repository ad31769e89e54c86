//! Конфигурация генератора.
//!
//! Создаётся один раз и передаётся по ссылке через все этапы.
//! Данные загружаются из JSON, конвертеры регистрируются программно.
//!
//! ```json
//! {
//!     "specializations": {
//!         "MyClass": [{"name": "MyClassDouble", "types": {"T": "double"}}]
//!     },
//!     "ignore": {
//!         "classes": [{"name": "Internal"}],
//!         "methods": [{"class": "A", "name": "debugDump"}],
//!         "functions": [{"namespace": "ns", "name": "helper"}]
//!     },
//!     "abstract_classes": ["Shape"]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conversion::TypeConverter;
use crate::error::{WrapError, WrapResult};

/// Одна специализация шаблона.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecializationEntry {
    /// Имя специализации на стороне Python.
    pub name: String,
    /// Подстановка параметров шаблона.
    pub types: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredClass {
    /// Файл, в котором объявлен класс (необязательно).
    #[serde(default)]
    pub file: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredMethod {
    pub class: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredFunction {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
}

/// Чёрный список.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreList {
    pub classes: Vec<IgnoredClass>,
    pub methods: Vec<IgnoredMethod>,
    pub functions: Vec<IgnoredFunction>,
}

/// Сериализуемая часть конфигурации.
///
/// Отсутствующие ключи берут значения по умолчанию; заданная таблица
/// операторов заменяет таблицу по умолчанию целиком.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub specializations: BTreeMap<String, Vec<SpecializationEntry>>,
    pub ignore: IgnoreList,
    pub abstract_classes: Vec<String>,
    /// Оператор C++ -> специальный метод Python.
    pub operators: BTreeMap<String, String>,
    /// Оператор C++ -> псевдоним, под которым он объявлен в `.pxd`.
    pub call_operators: BTreeMap<String, String>,
    /// Фрагменты, вставляемые в `.pxd` без изменений.
    pub additional_declarations: Vec<String>,
    pub declaration_file_ending: String,
    pub implementation_file_ending: String,
}

const DEFAULT_OPERATORS: &[(&str, &str, &str)] = &[
    ("()", "__call__", "call"),
    ("[]", "__getitem__", "getitem"),
    ("+", "__add__", "add"),
    ("-", "__sub__", "sub"),
    ("*", "__mul__", "mul"),
    ("/", "__truediv__", "div"),
    ("%", "__mod__", "mod"),
    ("&&", "__and__", "and"),
    ("||", "__or__", "or"),
    ("+=", "__iadd__", "iadd"),
    ("-=", "__isub__", "isub"),
    ("*=", "__imul__", "imul"),
    ("/=", "__itruediv__", "idiv"),
    ("%=", "__imod__", "imod"),
    ("&=", "__iand__", "iand"),
    ("|=", "__ior__", "ior"),
];

impl Default for Settings {
    fn default() -> Self {
        let mut operators = BTreeMap::new();
        let mut call_operators = BTreeMap::new();
        for (op, special, alias) in DEFAULT_OPERATORS {
            operators.insert(format!("operator{}", op), special.to_string());
            call_operators.insert(format!("operator{}", op), alias.to_string());
        }
        Self {
            specializations: BTreeMap::new(),
            ignore: IgnoreList::default(),
            abstract_classes: Vec::new(),
            operators,
            call_operators,
            additional_declarations: Vec::new(),
            declaration_file_ending: "pxd".into(),
            implementation_file_ending: "pyx".into(),
        }
    }
}

/// Конфигурация генератора.
#[derive(Default)]
pub struct Configuration {
    pub settings: Settings,
    converters: Vec<Box<dyn TypeConverter>>,
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("settings", &self.settings)
            .field(
                "converters",
                &self.converters.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Configuration {
    /// Конфигурация по умолчанию.
    pub fn new() -> Self {
        Self::default()
    }

    /// Загрузить конфигурацию из JSON.
    pub fn from_json(json: &str) -> WrapResult<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(Self {
            settings,
            converters: Vec::new(),
        })
    }

    /// Загрузить конфигурацию из файла.
    pub fn from_file(path: impl AsRef<Path>) -> WrapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WrapError::InvalidPath(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Зарегистрировать пользовательский конвертер.
    ///
    /// Пользовательские конвертеры проверяются раньше встроенных,
    /// в порядке регистрации.
    pub fn register_converter(&mut self, converter: Box<dyn TypeConverter>) {
        self.converters.push(converter);
    }

    pub fn converters(&self) -> &[Box<dyn TypeConverter>] {
        &self.converters
    }

    /// Специализация шаблонного класса (`key` = `Namespace::Name`).
    pub fn register_class_specialization(
        &mut self,
        key: &str,
        name: &str,
        types: &[(&str, &str)],
    ) {
        self.register_specialization(key.to_string(), name, types);
    }

    /// Специализация шаблонной функции (`key` = `Namespace::Name`).
    pub fn register_function_specialization(
        &mut self,
        key: &str,
        name: &str,
        types: &[(&str, &str)],
    ) {
        self.register_specialization(key.to_string(), name, types);
    }

    /// Специализация шаблонного метода (ключ `Class::method`).
    pub fn register_method_specialization(
        &mut self,
        class: &str,
        method: &str,
        name: &str,
        types: &[(&str, &str)],
    ) {
        self.register_specialization(format!("{}::{}", class, method), name, types);
    }

    fn register_specialization(&mut self, key: String, name: &str, types: &[(&str, &str)]) {
        let types = types
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.settings
            .specializations
            .entry(key)
            .or_default()
            .push(SpecializationEntry {
                name: name.to_string(),
                types,
            });
    }

    pub fn specializations(&self, key: &str) -> Option<&[SpecializationEntry]> {
        self.settings.specializations.get(key).map(|v| v.as_slice())
    }

    pub fn ignore_class(&mut self, file: Option<&str>, name: &str) {
        self.settings.ignore.classes.push(IgnoredClass {
            file: file.map(str::to_string),
            name: name.to_string(),
        });
    }

    pub fn ignore_method(&mut self, class: &str, name: &str) {
        self.settings.ignore.methods.push(IgnoredMethod {
            class: class.to_string(),
            name: name.to_string(),
        });
    }

    pub fn ignore_function(&mut self, namespace: &str, name: &str) {
        self.settings.ignore.functions.push(IgnoredFunction {
            namespace: namespace.to_string(),
            name: name.to_string(),
        });
    }

    pub fn mark_abstract(&mut self, class: &str) {
        self.settings.abstract_classes.push(class.to_string());
    }

    /// Добавить фрагмент в файл объявлений.
    pub fn add_declaration(&mut self, declaration: &str) {
        self.settings
            .additional_declarations
            .push(declaration.to_string());
    }

    pub fn is_ignored_class(&self, filename: &str, name: &str) -> bool {
        self.settings.ignore.classes.iter().any(|c| {
            c.name == name
                && c.file
                    .as_deref()
                    .map(|f| f == filename || Path::new(filename).ends_with(f))
                    .unwrap_or(true)
        })
    }

    pub fn is_ignored_method(&self, class: &str, name: &str) -> bool {
        self.settings
            .ignore
            .methods
            .iter()
            .any(|m| m.class == class && m.name == name)
    }

    pub fn is_ignored_function(&self, namespace: &str, name: &str) -> bool {
        self.settings
            .ignore
            .functions
            .iter()
            .any(|f| f.namespace == namespace && f.name == name)
    }

    pub fn is_abstract(&self, class: &str) -> bool {
        self.settings.abstract_classes.iter().any(|c| c == class)
    }

    /// Является ли имя метода перегрузкой оператора.
    pub fn is_operator(name: &str) -> bool {
        match name.strip_prefix("operator") {
            Some(rest) => rest
                .chars()
                .next()
                .map(|c| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(false),
            None => false,
        }
    }

    /// Специальный метод Python для оператора C++.
    ///
    /// `Ok(None)` для обычных имён, ошибка для неизвестного оператора.
    pub fn host_operator(&self, name: &str) -> WrapResult<Option<&str>> {
        if !Self::is_operator(name) {
            return Ok(None);
        }
        self.settings
            .operators
            .get(name)
            .map(|s| Some(s.as_str()))
            .ok_or_else(|| WrapError::UnknownOperator(name.to_string()))
    }

    /// Псевдоним оператора для объявления и вызова в Cython.
    pub fn call_operator(&self, name: &str) -> WrapResult<Option<&str>> {
        if !Self::is_operator(name) {
            return Ok(None);
        }
        self.settings
            .call_operators
            .get(name)
            .map(|s| Some(s.as_str()))
            .ok_or_else(|| WrapError::UnknownOperator(name.to_string()))
    }
}
