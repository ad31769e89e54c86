//! Построение дерева объявлений из дерева курсоров front end.
//!
//! Обход в глубину с накоплением пространства имён и стеком открытых
//! классов. Параметры, константы перечислений и параметры шаблонов
//! прикрепляются к ближайшему открытому владельцу.

use std::path::Path;

use crate::ast::{Ast, Class, Constructor, DefaultValue, Enum, Field, Function, Method, Param, Typedef};
use crate::conversion::builtin::is_integer;
use crate::cursor::{Access, Cursor, CursorKind};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{WrapError, WrapResult};
use crate::typename;

/// Сколько стека должно оставаться перед спуском в дочерний узел.
const RED_ZONE: usize = 32 * 1024;
/// Размер нового сегмента стека.
const STACK_SIZE: usize = 1024 * 1024;

/// Имя безымянной структуры в записи typedef.
const ANONYMOUS_STRUCT: &str = "struct *anonymous*";

/// Функция, к которой прикрепляются параметры.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Callable {
    Function(usize),
    Method { class: usize, index: usize },
    Constructor { class: usize, index: usize },
}

/// Построить дерево объявлений для одного входного файла.
///
/// Ошибки front end фатальны; неподдерживаемые объявления пропускаются с
/// диагностикой.
pub fn ingest(filename: &str, root: &Cursor, diagnostics: &mut Diagnostics) -> WrapResult<Ast> {
    root.check_diagnostics()?;
    if root.kind != CursorKind::TranslationUnit {
        return Err(WrapError::InvalidCursorTree(format!(
            "expected TRANSLATION_UNIT at the root, found {}",
            root.kind
        )));
    }

    let mut ingestor = Ingestor::new(filename, diagnostics);
    ingestor.visit(root)?;
    ingestor.finish()
}

/// Состояние обхода.
struct Ingestor<'d> {
    filename: String,
    namespace: String,
    ast: Ast,
    diagnostics: &'d mut Diagnostics,
    /// Открытые классы (индексы в `ast.classes`), внутренний последним.
    classes: Vec<usize>,
    /// Безымянная структура, ожидающая свой typedef.
    anonymous: Option<usize>,
    enumeration: Option<usize>,
    callable: Option<Callable>,
    /// Параметр, которому достанется значение по умолчанию.
    param: Option<(Callable, usize)>,
    negate: bool,
}

impl<'d> Ingestor<'d> {
    fn new(filename: &str, diagnostics: &'d mut Diagnostics) -> Self {
        Self {
            filename: filename.to_string(),
            namespace: String::new(),
            ast: Ast::new(),
            diagnostics,
            classes: Vec::new(),
            anonymous: None,
            enumeration: None,
            callable: None,
            param: None,
            negate: false,
        }
    }

    fn finish(self) -> WrapResult<Ast> {
        if self.anonymous.is_some() {
            return Err(WrapError::UnmatchedAnonymousStruct(self.filename));
        }
        Ok(self.ast)
    }

    fn visit(&mut self, cursor: &Cursor) -> WrapResult<()> {
        stacker::maybe_grow(RED_ZONE, STACK_SIZE, || self.visit_node(cursor))
    }

    fn visit_children(&mut self, cursor: &Cursor) -> WrapResult<()> {
        for child in &cursor.children {
            self.visit(child)?;
        }
        Ok(())
    }

    fn visit_node(&mut self, cursor: &Cursor) -> WrapResult<()> {
        if let Some(file) = cursor.file() {
            if !same_file(file, &self.filename) {
                log::trace!("Skipping '{}' declared in '{}'", cursor.spelling, file);
                return Ok(());
            }
        }
        if cursor.access != Access::Public {
            log::trace!("Skipping non-public {} '{}'", cursor.kind, cursor.spelling);
            return Ok(());
        }

        match &cursor.kind {
            CursorKind::TranslationUnit | CursorKind::UnexposedDecl => self.visit_children(cursor),
            CursorKind::Namespace => self.visit_namespace(cursor),
            CursorKind::ClassDecl | CursorKind::ClassTemplate => self.visit_class(cursor, false),
            CursorKind::StructDecl => self.visit_class(cursor, cursor.spelling.is_empty()),
            CursorKind::EnumDecl => self.visit_enum(cursor),
            CursorKind::EnumConstantDecl => {
                self.add_enum_constant(cursor);
                Ok(())
            }
            CursorKind::TypedefDecl => self.visit_typedef(cursor),
            CursorKind::FunctionDecl | CursorKind::FunctionTemplate | CursorKind::CxxMethod => {
                self.visit_callable(cursor)
            }
            CursorKind::Constructor => self.visit_constructor(cursor),
            CursorKind::FieldDecl => {
                self.add_field(cursor);
                Ok(())
            }
            CursorKind::ParmDecl => self.visit_param(cursor),
            CursorKind::TemplateTypeParameter => {
                self.add_template_param(cursor);
                Ok(())
            }
            CursorKind::CxxBaseSpecifier => {
                self.set_base(cursor);
                Ok(())
            }
            CursorKind::IntegerLiteral
            | CursorKind::FloatingLiteral
            | CursorKind::CxxBoolLiteralExpr
            | CursorKind::StringLiteral => {
                self.set_default(cursor);
                Ok(())
            }
            CursorKind::Unknown(name) if name == "UNARY_OPERATOR" && self.param.is_some() => {
                self.negate = cursor.tokens.first().map(|t| t == "-").unwrap_or(false);
                self.visit_children(cursor)
            }
            CursorKind::Unknown(name) => {
                log::debug!("Unknown node: {}, '{}'", name, cursor.spelling);
                if self.param.is_none() {
                    self.visit_children(cursor)
                } else {
                    Ok(())
                }
            }
            other => {
                log::trace!("Ignored node: {}, '{}'", other, cursor.spelling);
                Ok(())
            }
        }
    }

    // =========================================================================
    // Области видимости
    // =========================================================================

    fn visit_namespace(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let saved = self.namespace.clone();
        if self.namespace.is_empty() {
            self.namespace = cursor.spelling.clone();
        } else {
            self.namespace = format!("{}::{}", self.namespace, cursor.spelling);
        }
        let result = self.visit_children(cursor);
        self.namespace = saved;
        result
    }

    /// Пространство имён с именами открытых классов.
    fn member_namespace(&self) -> String {
        let mut namespace = self.namespace.clone();
        for &index in &self.classes {
            let name = &self.ast.classes[index].name;
            if namespace.is_empty() {
                namespace = name.clone();
            } else {
                namespace = format!("{}::{}", namespace, name);
            }
        }
        namespace
    }

    fn visit_class(&mut self, cursor: &Cursor, anonymous: bool) -> WrapResult<()> {
        if anonymous && self.anonymous.is_some() {
            return Err(WrapError::UnmatchedAnonymousStruct(self.filename.clone()));
        }

        let name = cursor.spelling.split('<').next().unwrap_or_default().to_string();
        let mut class = Class::new(&self.filename, self.member_namespace(), name);
        class.comment = cursor.comment.clone();
        let index = self.ast.classes.len();
        self.ast.classes.push(class);
        if anonymous {
            self.anonymous = Some(index);
        }

        let saved_callable = self.callable.take();
        self.classes.push(index);
        let result = self.visit_children(cursor);
        self.classes.pop();
        self.callable = saved_callable;
        result
    }

    fn visit_enum(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let index = self.ast.enums.len();
        self.ast.enums.push(Enum {
            filename: self.filename.clone(),
            namespace: self.member_namespace(),
            name: cursor.spelling.clone(),
            constants: Vec::new(),
            comment: cursor.comment.clone(),
            ignored: false,
        });

        let saved = self.enumeration.replace(index);
        let result = self.visit_children(cursor);
        self.enumeration = saved;
        result
    }

    fn add_enum_constant(&mut self, cursor: &Cursor) {
        match self.enumeration {
            Some(index) => self.ast.enums[index].constants.push(cursor.spelling.clone()),
            None => log::debug!("Enum constant '{}' outside of an enum", cursor.spelling),
        }
    }

    fn visit_typedef(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let name = cursor.spelling.clone();
        let underlying = cursor.underlying_type.clone().unwrap_or_default();

        if is_anonymous_struct(&underlying, &name) {
            return self.name_anonymous_struct(&name, &underlying);
        }

        let underlying = match typename::normalize(&underlying) {
            Ok(underlying) => underlying,
            Err(err) => {
                self.diagnostics.push(
                    DiagnosticKind::UnsupportedType,
                    format!("Ignoring typedef '{}': {}", name, err),
                );
                return Ok(());
            }
        };
        self.ast.typedefs.push(Typedef {
            filename: self.filename.clone(),
            namespace: self.member_namespace(),
            name,
            underlying,
            ignored: false,
        });
        Ok(())
    }

    /// `typedef struct { ... } Name;`
    fn name_anonymous_struct(&mut self, name: &str, underlying: &str) -> WrapResult<()> {
        match self.anonymous.take() {
            Some(index) => {
                let class = &mut self.ast.classes[index];
                class.name = name.to_string();
                for field in class.fields.iter_mut() {
                    field.class_name = name.to_string();
                }
                for ctor in class.constructors.iter_mut() {
                    ctor.class_name = name.to_string();
                }
                for method in class.methods.iter_mut() {
                    method.class_name = name.to_string();
                }
                Ok(())
            }
            // `typedef struct X X;` для уже объявленной структуры
            None if underlying == format!("struct {}", name) && self.ast.class(name).is_some() => {
                Ok(())
            }
            None => Err(WrapError::UnmatchedAnonymousStruct(name.to_string())),
        }
    }

    // =========================================================================
    // Функции
    // =========================================================================

    fn visit_callable(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let class = self.classes.last().copied();
        let result_type = cursor.result_type.clone().unwrap_or_else(|| "void".to_string());

        let callable = match class {
            Some(class) if cursor.kind != CursorKind::FunctionDecl && !cursor.is_static => {
                if cursor.is_pure_virtual {
                    self.ast.classes[class].is_abstract = true;
                }
                let mut method =
                    Method::new(&cursor.spelling, "", self.ast.classes[class].name.clone());
                method.comment = cursor.comment.clone();
                let methods = &mut self.ast.classes[class].methods;
                methods.push(method);
                Callable::Method {
                    class,
                    index: methods.len() - 1,
                }
            }
            None if cursor.kind == CursorKind::CxxMethod => {
                log::trace!("Skipping out-of-class method '{}'", cursor.spelling);
                return Ok(());
            }
            _ => {
                let namespace = if cursor.is_static {
                    self.member_namespace()
                } else {
                    self.namespace.clone()
                };
                let mut function = Function::new(&self.filename, namespace, &cursor.spelling, "");
                function.comment = cursor.comment.clone();
                self.ast.functions.push(function);
                Callable::Function(self.ast.functions.len() - 1)
            }
        };

        match typename::normalize(&result_type) {
            Ok(tname) => self.set_result_type(callable, tname),
            Err(err) => {
                self.set_result_type(callable, result_type);
                self.ignore_callable(
                    callable,
                    format!("Ignoring '{}': unsupported result type: {}", cursor.spelling, err),
                );
                return Ok(());
            }
        }
        self.with_callable(callable, cursor)
    }

    fn visit_constructor(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let class = match self.classes.last().copied() {
            Some(class) => class,
            None => return Ok(()),
        };
        let class_name = self.ast.classes[class].name.clone();
        self.ast.classes[class].constructors.push(Constructor {
            class_name,
            params: Vec::new(),
            comment: cursor.comment.clone(),
            ignored: false,
        });
        let index = self.ast.classes[class].constructors.len() - 1;
        self.with_callable(Callable::Constructor { class, index }, cursor)
    }

    fn with_callable(&mut self, callable: Callable, cursor: &Cursor) -> WrapResult<()> {
        let saved = self.callable.replace(callable);
        let result = self.visit_children(cursor);
        self.callable = saved;
        result
    }

    fn set_result_type(&mut self, callable: Callable, tname: String) {
        match callable {
            Callable::Function(index) => self.ast.functions[index].result_type = tname,
            Callable::Method { class, index } => {
                self.ast.classes[class].methods[index].result_type = tname
            }
            Callable::Constructor { .. } => {}
        }
    }

    fn params_mut(&mut self, callable: Callable) -> &mut Vec<Param> {
        match callable {
            Callable::Function(index) => &mut self.ast.functions[index].params,
            Callable::Method { class, index } => &mut self.ast.classes[class].methods[index].params,
            Callable::Constructor { class, index } => {
                &mut self.ast.classes[class].constructors[index].params
            }
        }
    }

    fn ignore_callable(&mut self, callable: Callable, message: String) {
        match callable {
            Callable::Function(index) => self.ast.functions[index].ignored = true,
            Callable::Method { class, index } => {
                self.ast.classes[class].methods[index].ignored = true
            }
            Callable::Constructor { class, index } => {
                self.ast.classes[class].constructors[index].ignored = true
            }
        }
        self.diagnostics.push(DiagnosticKind::UnsupportedType, message);
    }

    fn visit_param(&mut self, cursor: &Cursor) -> WrapResult<()> {
        let callable = match self.callable {
            Some(callable) => callable,
            None => {
                self.diagnostics.push(
                    DiagnosticKind::OrphanParameter,
                    format!(
                        "Ignored function parameter '{}' (type: '{}'), no function in current context.",
                        cursor.spelling,
                        cursor.type_spelling.as_deref().unwrap_or_default()
                    ),
                );
                return Ok(());
            }
        };

        let position = self.params_mut(callable).len();
        let name = if cursor.spelling.is_empty() {
            format!("arg{}", position)
        } else {
            cursor.spelling.clone()
        };
        let spelling = cursor.type_spelling.clone().unwrap_or_default();
        let tname = match typename::normalize(&spelling) {
            Ok(tname) => tname,
            Err(err) => {
                self.ignore_callable(
                    callable,
                    format!("Ignoring function with parameter '{}': {}", name, err),
                );
                spelling
            }
        };
        self.params_mut(callable).push(Param::new(name, tname));

        self.param = Some((callable, position));
        self.negate = false;
        let result = self.visit_children(cursor);
        self.param = None;
        self.negate = false;
        result
    }

    fn add_template_param(&mut self, cursor: &Cursor) {
        let name = cursor.spelling.clone();
        match (self.callable, self.classes.last().copied()) {
            (Some(Callable::Function(index)), _) => {
                self.ast.functions[index].template_params.push(name)
            }
            (Some(Callable::Method { class, index }), _) => {
                self.ast.classes[class].methods[index].template_params.push(name)
            }
            (None, Some(class)) => self.ast.classes[class].template_params.push(name),
            _ => log::debug!("Template parameter '{}' without a template", name),
        }
    }

    fn set_default(&mut self, cursor: &Cursor) {
        let (callable, index) = match self.param {
            Some(param) => param,
            None => return,
        };
        let negate = self.negate;
        let literal = cursor
            .tokens
            .first()
            .cloned()
            .unwrap_or_else(|| cursor.spelling.clone());
        let param = &mut self.params_mut(callable)[index];
        if let Some(value) = default_value(&cursor.kind, &param.tipe, &literal, negate) {
            param.default = Some(value);
        }
    }

    // =========================================================================
    // Члены класса
    // =========================================================================

    fn add_field(&mut self, cursor: &Cursor) {
        let class = match self.classes.last().copied() {
            Some(class) => class,
            None => return,
        };
        let spelling = cursor.type_spelling.clone().unwrap_or_default();
        let class_name = self.ast.classes[class].name.clone();
        let (tipe, ignored) = match typename::normalize(&spelling) {
            Ok(tipe) => (tipe, false),
            Err(err) => {
                self.diagnostics.push(
                    DiagnosticKind::UnsupportedType,
                    format!("Ignoring field '{}.{}': {}", class_name, cursor.spelling, err),
                );
                (spelling, true)
            }
        };
        self.ast.classes[class].fields.push(Field {
            name: cursor.spelling.clone(),
            tipe,
            class_name,
            ignored,
        });
    }

    fn set_base(&mut self, cursor: &Cursor) {
        let class = match self.classes.last().copied() {
            Some(class) => class,
            None => return,
        };
        let spelling = cursor.type_spelling.as_deref().unwrap_or(&cursor.spelling);
        match typename::normalize(spelling) {
            Ok(base) => self.ast.classes[class].base = Some(base),
            Err(err) => log::debug!("Ignoring base '{}': {}", spelling, err),
        }
    }
}

/// Совпадают ли пути (с точностью до префикса каталога).
fn same_file(node: &str, input: &str) -> bool {
    node == input || Path::new(node).ends_with(input) || Path::new(input).ends_with(node)
}

fn is_anonymous_struct(underlying: &str, name: &str) -> bool {
    underlying == ANONYMOUS_STRUCT
        || underlying.starts_with("struct (anonymous")
        || underlying == format!("struct {}", name)
}

/// Значение по умолчанию, если вид литерала подходит к типу параметра.
fn default_value(kind: &CursorKind, tipe: &str, literal: &str, negate: bool) -> Option<DefaultValue> {
    match kind {
        CursorKind::IntegerLiteral if is_integer(tipe) => {
            let digits = literal.trim_end_matches(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'));
            let value: i64 = digits.parse().ok()?;
            Some(DefaultValue::Int(if negate { -value } else { value }))
        }
        CursorKind::FloatingLiteral if tipe == "double" || tipe == "float" => {
            let value: f64 = literal.trim_end_matches(['f', 'F']).parse().ok()?;
            Some(DefaultValue::Float(if negate { -value } else { value }))
        }
        CursorKind::CxxBoolLiteralExpr if tipe == "bool" => {
            Some(DefaultValue::Bool(literal == "true"))
        }
        CursorKind::StringLiteral if tipe == "string" => {
            Some(DefaultValue::Str(literal.trim_matches('"').to_string()))
        }
        _ => None,
    }
}
