//! Модель объявлений C++-библиотеки.
//!
//! Дерево строится ингестором, затем один раз изменяется проходами
//! [`flatten`] (наследование, дубликаты, чёрный список) и специализатором,
//! после чего эмиттеры только читают его через [`visitor`].

pub mod flatten;
pub mod visitor;

use std::collections::BTreeMap;
use std::fmt;

use crate::registry::qualified_key;
use crate::utils::indent_block;

pub use visitor::{walk_ast, walk_class, walk_function, Visitor};

/// Значение по умолчанию параметра.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Int(n) => write!(f, "{}", n),
            DefaultValue::Float(x) => write!(f, "{:?}", x),
            DefaultValue::Bool(true) => write!(f, "True"),
            DefaultValue::Bool(false) => write!(f, "False"),
            DefaultValue::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Конкретная инстанциация шаблона.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Specialization {
    /// Имя на стороне C++ (`A[double]`, `myFun[int]`).
    pub native_name: String,
    /// Подстановка параметров шаблона.
    pub substitution: BTreeMap<String, String>,
}

/// Параметр функции.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub tipe: String,
    pub default: Option<DefaultValue>,
}

impl Param {
    pub fn new(name: impl Into<String>, tipe: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tipe: tipe.into(),
            default: None,
        }
    }
}

/// Перечисление.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Enum {
    pub filename: String,
    pub namespace: String,
    pub name: String,
    pub constants: Vec<String>,
    pub comment: Option<String>,
    pub ignored: bool,
}

/// Синоним типа.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Typedef {
    pub filename: String,
    pub namespace: String,
    pub name: String,
    pub underlying: String,
    pub ignored: bool,
}

/// Публичное поле класса.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Field {
    pub name: String,
    pub tipe: String,
    pub class_name: String,
    pub ignored: bool,
}

/// Конструктор.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Constructor {
    pub class_name: String,
    pub params: Vec<Param>,
    pub comment: Option<String>,
    pub ignored: bool,
}

/// Метод класса.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Method {
    pub name: String,
    pub class_name: String,
    pub params: Vec<Param>,
    pub result_type: String,
    pub template_params: Vec<String>,
    pub specialization: Option<Specialization>,
    pub comment: Option<String>,
    pub ignored: bool,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        result_type: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            result_type: result_type.into(),
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    /// Общий шаблон, ещё не специализированный.
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty() && self.specialization.is_none()
    }

    /// Имя для вызова на стороне C++.
    pub fn native_name(&self) -> &str {
        match &self.specialization {
            Some(spec) => &spec.native_name,
            None => &self.name,
        }
    }
}

/// Свободная функция (в том числе статический метод).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Function {
    pub filename: String,
    pub namespace: String,
    pub name: String,
    pub params: Vec<Param>,
    pub result_type: String,
    pub template_params: Vec<String>,
    pub specialization: Option<Specialization>,
    pub comment: Option<String>,
    pub ignored: bool,
}

impl Function {
    pub fn new(
        filename: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
        result_type: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            namespace: namespace.into(),
            name: name.into(),
            result_type: result_type.into(),
            ..Self::default()
        }
    }

    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty() && self.specialization.is_none()
    }

    pub fn native_name(&self) -> &str {
        match &self.specialization {
            Some(spec) => &spec.native_name,
            None => &self.name,
        }
    }

    pub fn qualified_name(&self) -> String {
        qualified_key(&self.namespace, &self.name)
    }
}

/// Класс или структура (в том числе шаблонный класс и его специализация).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Class {
    pub filename: String,
    pub namespace: String,
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<Field>,
    pub constructors: Vec<Constructor>,
    pub methods: Vec<Method>,
    pub template_params: Vec<String>,
    pub specialization: Option<Specialization>,
    pub is_abstract: bool,
    pub comment: Option<String>,
    pub ignored: bool,
}

impl Class {
    pub fn new(
        filename: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            namespace: namespace.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty() && self.specialization.is_none()
    }

    /// Имя класса на стороне C++ (`A[double]` для специализации).
    pub fn native_name(&self) -> &str {
        match &self.specialization {
            Some(spec) => &spec.native_name,
            None => &self.name,
        }
    }

    /// `ns::A`, чтобы одноимённые классы разных пространств не смешивались.
    pub fn qualified_name(&self) -> String {
        qualified_key(&self.namespace, &self.name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Ссылка на объявление, которое эмиттер не смог обработать.
///
/// Классы и функции указываются полным именем (`ns::A`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclRef {
    Field { class: String, name: String },
    Constructor { class: String, index: usize },
    Method { class: String, name: String },
    Function(String),
}

/// Дерево объявлений одного модуля.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ast {
    pub enums: Vec<Enum>,
    pub typedefs: Vec<Typedef>,
    pub classes: Vec<Class>,
    pub functions: Vec<Function>,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// Присоединить объявления другого дерева.
    pub fn merge(&mut self, other: Ast) {
        self.enums.extend(other.enums);
        self.typedefs.extend(other.typedefs);
        self.classes.extend(other.classes);
        self.functions.extend(other.functions);
    }

    pub fn class(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Пометить объявления как пропущенные.
    pub fn mark_ignored(&mut self, refs: &[DeclRef]) {
        for r in refs {
            match r {
                DeclRef::Field { class, name } => {
                    for c in self.classes.iter_mut().filter(|c| c.qualified_name() == *class) {
                        for f in c.fields.iter_mut().filter(|f| &f.name == name) {
                            f.ignored = true;
                        }
                    }
                }
                DeclRef::Constructor { class, index } => {
                    for c in self.classes.iter_mut().filter(|c| c.qualified_name() == *class) {
                        if let Some(ctor) = c.constructors.get_mut(*index) {
                            ctor.ignored = true;
                        }
                    }
                }
                DeclRef::Method { class, name } => {
                    for c in self.classes.iter_mut().filter(|c| c.qualified_name() == *class) {
                        for m in c.methods.iter_mut().filter(|m| &m.name == name) {
                            m.ignored = true;
                        }
                    }
                }
                DeclRef::Function(name) => {
                    for f in self.functions.iter_mut().filter(|f| f.qualified_name() == *name) {
                        f.ignored = true;
                    }
                }
            }
        }
    }
}

fn fmt_params(params: &[Param]) -> Vec<String> {
    params
        .iter()
        .map(|p| format!("    Parameter ({}) {}", p.tipe, p.name))
        .collect()
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = vec![format!("Function '{}'", self.name)];
        out.extend(fmt_params(&self.params));
        if self.result_type != "void" {
            out.push(format!("    Returns ({})", self.result_type));
        }
        write!(f, "{}", out.join("\n"))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = vec![format!("Method '{}'", self.name)];
        out.extend(fmt_params(&self.params));
        if self.result_type != "void" {
            out.push(format!("    Returns ({})", self.result_type));
        }
        write!(f, "{}", out.join("\n"))
    }
}

impl fmt::Display for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = vec!["Constructor '__init__'".to_string()];
        out.extend(fmt_params(&self.params));
        write!(f, "{}", out.join("\n"))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = vec![if self.namespace.is_empty() {
            format!("Class '{}'", self.name)
        } else {
            format!("Class '{}' (namespace: '{}')", self.name, self.namespace)
        }];
        for field in &self.fields {
            out.push(format!("    Field ({}) {}", field.tipe, field.name));
        }
        for ctor in &self.constructors {
            out.push(indent_block(&ctor.to_string(), 1));
        }
        for method in &self.methods {
            out.push(indent_block(&method.to_string(), 1));
        }
        write!(f, "{}", out.join("\n"))
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = vec!["AST".to_string()];
        for e in &self.enums {
            out.push(format!("    Enum '{}'", e.name));
        }
        for t in &self.typedefs {
            out.push(format!("    Typedef ({}) {}", t.underlying, t.name));
        }
        for c in &self.classes {
            out.push(indent_block(&c.to_string(), 1));
        }
        for func in &self.functions {
            out.push(indent_block(&func.to_string(), 1));
        }
        write!(f, "{}", out.join("\n"))
    }
}
