//! Явная специализация шаблонов.
//!
//! Шаблоны не инстанцируются автоматически. Для каждого шаблонного класса,
//! функции и метода в конфигурации ищется список `(имя, подстановка)`;
//! каждая пара порождает конкретное объявление с подставленными типами.
//! Шаблон без записи помечается пропущенным.

use std::collections::{BTreeMap, HashMap};

use crate::ast::{Ast, Class, Function, Method, Param, Specialization};
use crate::config::{Configuration, SpecializationEntry};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{WrapError, WrapResult};
use crate::registry::qualified_key;
use crate::typename;

/// Развернуть все шаблоны дерева.
pub fn specialize(ast: &mut Ast, config: &Configuration, diagnostics: &mut Diagnostics) -> WrapResult<()> {
    let mut classes = Vec::new();
    for class in ast.classes.iter_mut().filter(|c| c.is_template() && !c.ignored) {
        let key = qualified_key(&class.namespace, &class.name);
        match config.specializations(&key) {
            Some(entries) => {
                for entry in entries {
                    classes.push(specialize_class(class, &key, entry)?);
                }
            }
            None => missing(diagnostics, "class", &key, &class.template_params, &mut class.ignored),
        }
    }
    ast.classes.extend(classes);

    for class in ast.classes.iter_mut().filter(|c| !c.ignored && !c.is_template()) {
        specialize_methods(class, config, diagnostics)?;
    }

    let mut functions = Vec::new();
    for function in ast.functions.iter_mut().filter(|f| f.is_template() && !f.ignored) {
        let key = qualified_key(&function.namespace, &function.name);
        match config.specializations(&key) {
            Some(entries) => {
                for entry in entries {
                    functions.push(specialize_function(function, &key, entry)?);
                }
            }
            None => missing(
                diagnostics,
                "function",
                &key,
                &function.template_params,
                &mut function.ignored,
            ),
        }
    }
    ast.functions.extend(functions);
    Ok(())
}

fn missing(
    diagnostics: &mut Diagnostics,
    what: &str,
    key: &str,
    template_params: &[String],
    ignored: &mut bool,
) {
    *ignored = true;
    diagnostics.push(
        DiagnosticKind::MissingSpecialization,
        format!(
            "No template specialization registered for template {} '{}' with the following template types: {}",
            what,
            key,
            template_params.join(", ")
        ),
    );
}

/// Проверить, что подстановка покрывает все параметры шаблона.
fn substitution(
    key: &str,
    template_params: &[String],
    entry: &SpecializationEntry,
) -> WrapResult<BTreeMap<String, String>> {
    let mut table = BTreeMap::new();
    for param in template_params {
        let tname = entry.types.get(param).ok_or_else(|| WrapError::MalformedSpecialization {
            key: key.to_string(),
            message: format!("'{}' has no type for template parameter '{}'", entry.name, param),
        })?;
        let tname = typename::normalize(tname).map_err(|err| WrapError::MalformedSpecialization {
            key: key.to_string(),
            message: format!("'{}': {}", entry.name, err),
        })?;
        table.insert(param.clone(), tname);
    }
    Ok(table)
}

/// Имя инстанциации на стороне C++: `name[double, int]`.
fn native_name(name: &str, template_params: &[String], table: &BTreeMap<String, String>) -> String {
    let args = template_params
        .iter()
        .filter_map(|p| table.get(p).map(|s| s.as_str()))
        .collect::<Vec<_>>();
    format!("{}[{}]", name, args.join(", "))
}

/// Подставляет типы специализации в записи типов.
struct Substituter<'a> {
    key: &'a str,
    table: HashMap<String, String>,
}

impl<'a> Substituter<'a> {
    fn new(key: &'a str, table: &BTreeMap<String, String>) -> Self {
        Self {
            key,
            table: table.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    fn tname(&self, tname: &str) -> WrapResult<String> {
        typename::substitute(tname, &self.table).map_err(|err| WrapError::MalformedSpecialization {
            key: self.key.to_string(),
            message: err.to_string(),
        })
    }

    fn params(&self, params: &[Param]) -> WrapResult<Vec<Param>> {
        params
            .iter()
            .map(|p| {
                Ok(Param {
                    tipe: self.tname(&p.tipe)?,
                    ..p.clone()
                })
            })
            .collect()
    }
}

fn specialize_class(class: &Class, key: &str, entry: &SpecializationEntry) -> WrapResult<Class> {
    let table = substitution(key, &class.template_params, entry)?;
    let subst = Substituter::new(key, &table);
    log::debug!("Specializing class '{}' as '{}'", key, entry.name);

    let mut result = class.clone();
    result.name = entry.name.clone();
    result.specialization = Some(Specialization {
        native_name: native_name(&class.name, &class.template_params, &table),
        substitution: table.clone(),
    });
    for field in result.fields.iter_mut() {
        field.tipe = subst.tname(&field.tipe)?;
        field.class_name = entry.name.clone();
    }
    for ctor in result.constructors.iter_mut() {
        ctor.params = subst.params(&ctor.params)?;
        ctor.class_name = entry.name.clone();
    }
    for method in result.methods.iter_mut() {
        method.params = subst.params(&method.params)?;
        method.result_type = subst.tname(&method.result_type)?;
        method.class_name = entry.name.clone();
    }
    Ok(result)
}

fn specialize_function(function: &Function, key: &str, entry: &SpecializationEntry) -> WrapResult<Function> {
    let table = substitution(key, &function.template_params, entry)?;
    let subst = Substituter::new(key, &table);
    log::debug!("Specializing function '{}' as '{}'", key, entry.name);

    Ok(Function {
        name: entry.name.clone(),
        params: subst.params(&function.params)?,
        result_type: subst.tname(&function.result_type)?,
        specialization: Some(Specialization {
            native_name: native_name(&function.name, &function.template_params, &table),
            substitution: table,
        }),
        ..function.clone()
    })
}

fn specialize_methods(class: &mut Class, config: &Configuration, diagnostics: &mut Diagnostics) -> WrapResult<()> {
    let mut methods = Vec::new();
    for method in class.methods.iter_mut().filter(|m| m.is_template() && !m.ignored) {
        let key = format!("{}::{}", class.name, method.name);
        match config.specializations(&key) {
            Some(entries) => {
                for entry in entries {
                    methods.push(specialize_method(method, &key, entry)?);
                }
            }
            None => missing(diagnostics, "method", &key, &method.template_params, &mut method.ignored),
        }
    }
    class.methods.extend(methods);
    Ok(())
}

fn specialize_method(method: &Method, key: &str, entry: &SpecializationEntry) -> WrapResult<Method> {
    let table = substitution(key, &method.template_params, entry)?;
    let subst = Substituter::new(key, &table);

    Ok(Method {
        name: entry.name.clone(),
        params: subst.params(&method.params)?,
        result_type: subst.tname(&method.result_type)?,
        specialization: Some(Specialization {
            native_name: native_name(&method.name, &method.template_params, &table),
            substitution: table,
        }),
        ..method.clone()
    })
}
