//! Эмиттер файла реализации (`.pyx`).

use std::mem;

use super::docstring;
use crate::ast::{walk_ast, Ast, Class, Constructor, DeclRef, Enum, Field, Function, Method, Param, Visitor};
use crate::config::Configuration;
use crate::conversion::{create_type_converter, ConversionContext, Includes};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{ConversionError, WrapResult};
use crate::registry::TypeRegistry;
use crate::utils::{escape_keyword, from_camel_case, indent_block, lines};

/// Что нужно знать о классе при генерации его членов.
#[derive(Debug, Clone)]
struct ClassInfo {
    /// `ns::A`
    key: String,
    native_name: String,
    is_abstract: bool,
    skipped: bool,
}

/// Готовый файл реализации.
#[derive(Debug)]
pub struct ImplementationListing {
    pub content: String,
    /// Импорты, понадобившиеся сгенерированному коду.
    pub includes: Includes,
    pub diagnostics: Diagnostics,
    /// Объявления, для которых не нашлось преобразования типов.
    pub skipped: Vec<DeclRef>,
}

/// Преобразованные параметры функции.
#[derive(Debug, Default)]
struct Arguments {
    host: Vec<String>,
    body: Vec<String>,
    call: Vec<String>,
}

/// Объявление переменной результата и операторы возврата.
#[derive(Debug)]
struct Returned {
    declaration: String,
    body: Vec<String>,
}

/// Посетитель, генерирующий `.pyx`.
pub struct ImplementationEmitter<'a> {
    module: String,
    config: &'a Configuration,
    registry: TypeRegistry,
    includes: Includes,
    diagnostics: Diagnostics,
    skipped: Vec<DeclRef>,
    /// Классы в порядке обхода; члены посещаются до `visit_class`.
    classes: Vec<ClassInfo>,
    current_class: usize,
    /// Члены текущего класса (уже с отступом).
    fields: Vec<String>,
    constructors: Vec<String>,
    methods: Vec<String>,
    constructor_index: usize,
    blocks: Vec<String>,
}

impl<'a> ImplementationEmitter<'a> {
    pub fn new(module: &str, ast: &Ast, registry: TypeRegistry, config: &'a Configuration) -> Self {
        let classes = ast
            .classes
            .iter()
            .map(|c| ClassInfo {
                key: c.qualified_name(),
                native_name: c.native_name().to_string(),
                is_abstract: c.is_abstract,
                skipped: c.ignored || c.is_template(),
            })
            .collect();

        Self {
            module: module.to_string(),
            config,
            registry,
            includes: Includes::new(),
            diagnostics: Diagnostics::new(),
            skipped: Vec::new(),
            classes,
            current_class: 0,
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            constructor_index: 0,
            blocks: Vec::new(),
        }
    }

    /// Обойти дерево и собрать файл.
    pub fn emit(mut self, ast: &Ast) -> WrapResult<ImplementationListing> {
        walk_ast(&mut self, ast)?;
        Ok(self.export())
    }

    fn export(self) -> ImplementationListing {
        let mut parts = vec![lines(&self.includes.implementations_import(&self.module))];
        parts.extend(self.blocks);
        ImplementationListing {
            content: parts.join("\n\n\n") + "\n",
            includes: self.includes,
            diagnostics: self.diagnostics,
            skipped: self.skipped,
        }
    }

    /// Класс, члены которого сейчас обходятся.
    fn class_info(&self) -> Option<&ClassInfo> {
        self.classes.get(self.current_class)
    }

    fn member_skipped(&self) -> bool {
        self.class_info().map(|c| c.skipped).unwrap_or(true)
    }

    fn class_key(&self) -> String {
        self.class_info().map(|c| c.key.clone()).unwrap_or_default()
    }

    /// Разделить ошибки: фатальные наверх, остальные в пропуск с диагностикой.
    fn settle(
        &mut self,
        result: Result<String, ConversionError>,
        what: String,
        decl: DeclRef,
    ) -> WrapResult<Option<String>> {
        match result {
            Ok(code) => Ok(Some(code)),
            Err(ConversionError::Fatal(err)) => Err(err),
            Err(err) => {
                self.diagnostics
                    .push(DiagnosticKind::UnsupportedType, format!("Ignoring {}: {}", what, err));
                self.skipped.push(decl);
                Ok(None)
            }
        }
    }

    // =========================================================================
    // Определения
    // =========================================================================

    fn function_def(&mut self, function: &Function) -> Result<String, ConversionError> {
        let config = self.config;
        let name = if function.specialization.is_some() {
            function.name.clone()
        } else {
            from_camel_case(&function.name)
        };

        let mut includes = Includes::new();
        let args = convert_params(&self.registry, config, &mut includes, &function.params)?;
        let result = convert_result(&self.registry, config, &mut includes, &function.result_type, false)?;
        let call = format!("cpp.{}({})", function.native_name(), args.call.join(", "));

        let mut body = args.body;
        body.extend(call_with_result(call, &result));
        self.includes.merge(&includes);
        Ok(definition(
            format!("cpdef {}({}):", name, args.host.join(", ")),
            function.comment.as_deref(),
            body,
        ))
    }

    fn method_def(&mut self, method: &Method) -> Result<String, ConversionError> {
        let config = self.config;
        let special = config.host_operator(&method.name)?;
        let (keyword, name) = match special {
            Some(special) => ("def", special.to_string()),
            None if method.specialization.is_some() => ("cpdef", method.name.clone()),
            None => ("cpdef", from_camel_case(&method.name)),
        };
        let native = match config.call_operator(&method.name)? {
            Some(alias) => alias.to_string(),
            None => method.native_name().to_string(),
        };

        let mut includes = Includes::new();
        let args = convert_params(&self.registry, config, &mut includes, &method.params)?;
        let call = format!("self.thisptr.{}({})", native, args.call.join(", "));

        let mut body = args.body;
        if is_in_place(&method.name) {
            body.push(call);
            body.push("return self".to_string());
        } else {
            let result =
                convert_result(&self.registry, config, &mut includes, &method.result_type, false)?;
            body.extend(call_with_result(call, &result));
        }

        let mut host = vec![format!("{} self", method.class_name)];
        host.extend(args.host);
        self.includes.merge(&includes);
        Ok(definition(
            format!("{} {}({}):", keyword, name, host.join(", ")),
            method.comment.as_deref(),
            body,
        ))
    }

    fn constructor_def(&mut self, ctor: &Constructor, native: &str) -> Result<String, ConversionError> {
        let mut includes = Includes::new();
        let args = convert_params(&self.registry, self.config, &mut includes, &ctor.params)?;

        let mut host = vec![format!("{} self", ctor.class_name)];
        host.extend(args.host);
        let mut body = args.body;
        body.push(format!("self.thisptr = new cpp.{}({})", native, args.call.join(", ")));
        self.includes.merge(&includes);
        Ok(definition(
            format!("def __init__({}):", host.join(", ")),
            ctor.comment.as_deref(),
            body,
        ))
    }

    fn setter_def(&mut self, field: &Field) -> Result<String, ConversionError> {
        let params = [Param::new(field.name.clone(), field.tipe.clone())];
        let mut includes = Includes::new();
        let args = convert_params(&self.registry, self.config, &mut includes, &params)?;

        let mut host = vec![format!("{} self", field.class_name)];
        host.extend(args.host);
        let mut body = args.body;
        body.push(format!("self.thisptr.{} = {}", field.name, args.call.join(", ")));
        self.includes.merge(&includes);
        Ok(definition(
            format!("cpdef set_{}({}):", from_camel_case(&field.name), host.join(", ")),
            None,
            body,
        ))
    }

    fn getter_def(&mut self, field: &Field) -> Result<String, ConversionError> {
        let mut includes = Includes::new();
        // Поле принадлежит объекту: результат не освобождается отдельно
        let result = convert_result(&self.registry, self.config, &mut includes, &field.tipe, true)?;
        let body = call_with_result(format!("self.thisptr.{}", field.name), &result);
        self.includes.merge(&includes);
        Ok(definition(
            format!("cpdef get_{}({} self):", from_camel_case(&field.name), field.class_name),
            None,
            body,
        ))
    }

    fn field_def(&mut self, field: &Field) -> Result<String, ConversionError> {
        let setter = self.setter_def(field)?;
        let getter = self.getter_def(field)?;
        let snake = from_camel_case(&field.name);
        Ok(lines(&[
            setter,
            String::new(),
            getter,
            String::new(),
            format!("{} = property(get_{}, set_{})", field.name, snake, snake),
        ]))
    }

    fn class_def(&mut self, class: &Class, constructors: Vec<String>) -> String {
        // `cdef bool delete_thisptr`
        self.includes.add_include_for_bool();
        let mut out = vec![format!("cdef class {}:", class.name)];
        if let Some(doc) = docstring(class.comment.as_deref()) {
            out.push(format!("    {}", doc));
        }
        out.extend([
            format!("    cdef cpp.{} * thisptr", class.native_name()),
            "    cdef bool delete_thisptr".to_string(),
            String::new(),
            "    def __cinit__(self):".to_string(),
            "        self.thisptr = NULL".to_string(),
            "        self.delete_thisptr = True".to_string(),
            String::new(),
            "    def __dealloc__(self):".to_string(),
            "        if self.delete_thisptr and self.thisptr != NULL:".to_string(),
            "            del self.thisptr".to_string(),
        ]);

        let members = constructors
            .into_iter()
            .chain(mem::take(&mut self.methods))
            .chain(mem::take(&mut self.fields));
        for member in members {
            out.push(String::new());
            out.push(member);
        }
        lines(&out)
    }
}

impl<'a> Visitor for ImplementationEmitter<'a> {
    fn visit_enum(&mut self, node: &Enum) -> WrapResult<()> {
        if node.ignored {
            return Ok(());
        }
        let mut out = vec![format!("cdef class {}:", node.name)];
        if let Some(doc) = docstring(node.comment.as_deref()) {
            out.push(format!("    {}", doc));
        }
        for constant in &node.constants {
            out.push(format!("    {} = cpp.{}", constant, constant));
        }
        if node.constants.is_empty() {
            out.push("    pass".to_string());
        }
        self.blocks.push(lines(&out));
        Ok(())
    }

    fn visit_field(&mut self, node: &Field) -> WrapResult<()> {
        if node.ignored || self.member_skipped() {
            return Ok(());
        }
        let result = self.field_def(node);
        let decl = DeclRef::Field {
            class: self.class_key(),
            name: node.name.clone(),
        };
        let what = format!("field '{}.{}'", node.class_name, node.name);
        if let Some(code) = self.settle(result, what, decl)? {
            self.fields.push(indent_block(&code, 1));
        }
        Ok(())
    }

    fn visit_constructor(&mut self, node: &Constructor) -> WrapResult<()> {
        let index = self.constructor_index;
        self.constructor_index += 1;

        let info = match self.class_info() {
            Some(info) if !info.skipped && !info.is_abstract => info.clone(),
            _ => return Ok(()),
        };
        if node.ignored {
            return Ok(());
        }
        let result = self.constructor_def(node, &info.native_name);
        let decl = DeclRef::Constructor {
            class: info.key.clone(),
            index,
        };
        let what = format!("constructor of '{}'", node.class_name);
        if let Some(code) = self.settle(result, what, decl)? {
            self.constructors.push(indent_block(&code, 1));
        }
        Ok(())
    }

    fn visit_method(&mut self, node: &Method) -> WrapResult<()> {
        if node.ignored || node.is_template() || self.member_skipped() {
            return Ok(());
        }
        let result = self.method_def(node);
        let decl = DeclRef::Method {
            class: self.class_key(),
            name: node.name.clone(),
        };
        let what = format!("method '{}.{}'", node.class_name, node.name);
        if let Some(code) = self.settle(result, what, decl)? {
            self.methods.push(indent_block(&code, 1));
        }
        Ok(())
    }

    fn visit_class(&mut self, node: &Class) -> WrapResult<()> {
        self.constructor_index = 0;
        self.current_class += 1;
        let mut constructors = mem::take(&mut self.constructors);
        if node.ignored || node.is_template() {
            self.methods.clear();
            self.fields.clear();
            return Ok(());
        }

        if node.is_abstract {
            self.diagnostics.push(
                DiagnosticKind::AbstractClass,
                format!("Class '{}' is abstract, no constructor will be exposed.", node.name),
            );
        } else if constructors.len() > 1 {
            self.diagnostics.push(
                DiagnosticKind::DuplicateConstructor,
                format!(
                    "Class '{}' has more than one constructor. This is not compatible to Python. \
                     The last constructor will overwrite all others.",
                    node.name
                ),
            );
            constructors = constructors.split_off(constructors.len() - 1);
        } else if constructors.is_empty() && node.constructors.is_empty() {
            constructors.push(indent_block(&default_constructor_def(node), 1));
        }

        let block = self.class_def(node, constructors);
        self.blocks.push(block);
        Ok(())
    }

    fn visit_function(&mut self, node: &Function) -> WrapResult<()> {
        if node.ignored || node.is_template() {
            return Ok(());
        }
        let result = self.function_def(node);
        let what = format!("function '{}'", node.name);
        let decl = DeclRef::Function(node.qualified_name());
        if let Some(code) = self.settle(result, what, decl)? {
            self.blocks.push(code);
        }
        Ok(())
    }

    fn enter_specialization(&mut self, node: &Class) -> WrapResult<()> {
        if let Some(spec) = &node.specialization {
            self.registry.attach_specialization(&node.name, &spec.substitution)?;
        }
        Ok(())
    }

    fn leave_specialization(&mut self, _node: &Class) {
        self.registry.remove_specialization();
    }
}

/// Преобразовать параметры по порядку; конвертер может забрать несколько.
fn convert_params(
    registry: &TypeRegistry,
    config: &Configuration,
    includes: &mut Includes,
    params: &[Param],
) -> Result<Arguments, ConversionError> {
    let argnames: Vec<String> = params.iter().map(|p| escape_keyword(&p.name)).collect();
    let mut args = Arguments::default();

    let mut index = 0;
    while index < params.len() {
        let ctx = ConversionContext::param(registry, params, index, &argnames[index]);
        let converter = create_type_converter(ctx, config)?;
        converter.register_includes(includes)?;

        let mut host = converter.host_signature()?;
        if let Some(default) = &params[index].default {
            host = format!("{}={}", host, default);
        }
        args.host.push(host);
        args.body.extend(converter.source_to_native()?);
        args.call.extend(converter.call_arguments()?);
        index += converter.params_consumed();
    }
    Ok(args)
}

fn convert_result(
    registry: &TypeRegistry,
    config: &Configuration,
    includes: &mut Includes,
    result_type: &str,
    alias: bool,
) -> Result<Returned, ConversionError> {
    let tname = match result_type {
        "" | "void" => None,
        tname => Some(tname),
    };
    let ctx = ConversionContext::value(registry, tname, "result");
    let converter = create_type_converter(ctx, config)?;
    converter.register_includes(includes)?;
    Ok(Returned {
        declaration: converter.native_signature()?,
        body: converter.return_conversion(alias)?,
    })
}

fn call_with_result(call: String, result: &Returned) -> Vec<String> {
    let mut body = Vec::with_capacity(result.body.len() + 1);
    if result.declaration.is_empty() {
        body.push(call);
    } else {
        body.push(format!("{} result = {}", result.declaration, call));
    }
    body.extend(result.body.iter().cloned());
    body
}

fn definition(header: String, comment: Option<&str>, body: Vec<String>) -> String {
    let mut block = Vec::with_capacity(body.len() + 1);
    block.extend(docstring(comment));
    block.extend(body);
    format!("{}\n{}", header, indent_block(&lines(&block), 1))
}

/// Конструктор без параметров для класса, не объявившего ни одного.
fn default_constructor_def(class: &Class) -> String {
    definition(
        format!("def __init__({} self):", class.name),
        None,
        vec![format!("self.thisptr = new cpp.{}()", class.native_name())],
    )
}

/// `operator+=` и подобные изменяют объект и возвращают его же.
fn is_in_place(name: &str) -> bool {
    match name.strip_prefix("operator") {
        Some(op) => op.len() > 1 && op.ends_with('=') && !matches!(op, "==" | "!=" | "<=" | ">="),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DefaultValue;
    use crate::error::WrapError;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.add_class("A");
        registry.add_class("MyClass");
        registry.add_class("Testclass");
        registry
    }

    fn emitter<'a>(ast: &Ast, config: &'a Configuration) -> ImplementationEmitter<'a> {
        ImplementationEmitter::new("test", ast, registry(), config)
    }

    #[test]
    fn test_simple_method_def() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let method = Method::new("testfun", "void", "Testclass");
        assert_eq!(
            e.method_def(&method).unwrap(),
            lines(&["cpdef testfun(Testclass self):", "    self.thisptr.testfun()"])
        );
    }

    #[test]
    fn test_array_arg_method_def() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let mut method = Method::new("testfun", "void", "Testclass");
        method.params = vec![Param::new("a", "double *"), Param::new("aSize", "unsigned int")];
        assert_eq!(
            e.method_def(&method).unwrap(),
            lines(&[
                "cpdef testfun(Testclass self, np.ndarray[double, ndim=1] a):",
                "    self.thisptr.testfun(&a[0], a.shape[0])",
            ])
        );
        assert!(e.includes.numpy);
    }

    #[test]
    fn test_setter_and_getter() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let field = Field {
            name: "myField".into(),
            tipe: "double".into(),
            class_name: "MyClass".into(),
            ignored: false,
        };
        assert_eq!(
            e.setter_def(&field).unwrap(),
            lines(&[
                "cpdef set_my_field(MyClass self, double myField):",
                "    cdef double cpp_myField = myField",
                "    self.thisptr.myField = cpp_myField",
            ])
        );
        assert_eq!(
            e.getter_def(&field).unwrap(),
            lines(&[
                "cpdef get_my_field(MyClass self):",
                "    cdef double result = self.thisptr.myField",
                "    return result",
            ])
        );
        assert!(e
            .field_def(&field)
            .unwrap()
            .ends_with("myField = property(get_my_field, set_my_field)"));
    }

    #[test]
    fn test_default_ctor_def() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let ctor = Constructor {
            class_name: "MyClass".into(),
            ..Constructor::default()
        };
        let expected = lines(&["def __init__(MyClass self):", "    self.thisptr = new cpp.MyClass()"]);
        assert_eq!(e.constructor_def(&ctor, "MyClass").unwrap(), expected);
        assert_eq!(default_constructor_def(&Class::new("test.hpp", "", "MyClass")), expected);
    }

    #[test]
    fn test_function_def() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let function = Function::new("test.hpp", "", "myFun", "void");
        assert_eq!(
            e.function_def(&function).unwrap(),
            lines(&["cpdef my_fun():", "    cpp.myFun()"])
        );
    }

    #[test]
    fn test_keyword_and_default_argument() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);
        let mut function = Function::new("test.hpp", "", "f", "void");
        let mut param = Param::new("lambda", "int");
        param.default = Some(DefaultValue::Int(5));
        function.params.push(param);
        function.comment = Some("Does things.".into());
        assert_eq!(
            e.function_def(&function).unwrap(),
            lines(&[
                "cpdef f(int lambda_=5):",
                "    \"\"\"Does things.\"\"\"",
                "    cdef int cpp_lambda_ = lambda_",
                "    cpp.f(cpp_lambda_)",
            ])
        );
    }

    #[test]
    fn test_operators() {
        let config = Configuration::new();
        let mut e = emitter(&Ast::new(), &config);

        let mut call = Method::new("operator()", "double", "A");
        call.params.push(Param::new("x", "double"));
        assert_eq!(
            e.method_def(&call).unwrap(),
            lines(&[
                "def __call__(A self, double x):",
                "    cdef double cpp_x = x",
                "    cdef double result = self.thisptr.call(cpp_x)",
                "    return result",
            ])
        );

        let mut add = Method::new("operator+=", "A", "A");
        add.params.push(Param::new("other", "A"));
        assert_eq!(
            e.method_def(&add).unwrap(),
            lines(&[
                "def __iadd__(A self, A other):",
                "    cdef cpp.A * cpp_other = other.thisptr",
                "    self.thisptr.iadd(deref(cpp_other))",
                "    return self",
            ])
        );
    }

    #[test]
    fn test_unknown_operator_is_fatal() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        let mut class = Class::new("test.hpp", "", "A");
        class.methods.push(Method::new("operator=", "A", "A"));
        ast.classes.push(class);

        let err = emitter(&ast, &config).emit(&ast).unwrap_err();
        assert!(matches!(err, WrapError::UnknownOperator(ref op) if op == "operator="));
    }

    fn class_a() -> Class {
        let mut class = Class::new("test.hpp", "", "A");
        let mut add = Method::new("add", "int", "A");
        add.params = vec![Param::new("a", "int"), Param::new("b", "int")];
        class.methods.push(add);
        let mut broken = Method::new("broken", "void", "A");
        broken.params.push(Param::new("u", "Unknown"));
        class.methods.push(broken);
        class
    }

    #[test]
    fn test_class_with_default_constructor() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        ast.classes.push(class_a());

        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert!(listing.content.starts_with("from libcpp cimport bool\n"));
        assert!(listing.content.contains("cimport _test as cpp"));
        assert!(listing.content.contains("cdef class A:\n    cdef cpp.A * thisptr"));
        assert!(listing.content.contains("    def __init__(A self):\n        self.thisptr = new cpp.A()"));
        assert!(listing.content.contains("    cpdef add(A self, int a, int b):"));
        assert!(!listing.content.contains("broken"));

        assert_eq!(
            listing.skipped,
            vec![DeclRef::Method {
                class: "A".into(),
                name: "broken".into()
            }]
        );
        assert!(listing.diagnostics.mentions("No type converter available for type 'Unknown'"));
    }

    #[test]
    fn test_skipped_members_carry_namespace() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        let mut broken = class_a();
        broken.namespace = "ns1".into();
        let mut fine = Class::new("test.hpp", "ns2", "A");
        fine.methods.push(Method::new("broken", "void", "A"));
        ast.classes.push(broken);
        ast.classes.push(fine);
        let mut function = Function::new("test.hpp", "ns1", "g", "void");
        function.params.push(Param::new("u", "Unknown"));
        ast.functions.push(function);

        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert_eq!(
            listing.skipped,
            vec![
                DeclRef::Method {
                    class: "ns1::A".into(),
                    name: "broken".into()
                },
                DeclRef::Function("ns1::g".into()),
            ]
        );

        ast.mark_ignored(&listing.skipped);
        assert!(ast.classes[0].method("broken").unwrap().ignored);
        assert!(!ast.classes[1].method("broken").unwrap().ignored);
    }

    #[test]
    fn test_bool_imported_for_classes_only() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        ast.functions.push(Function::new("test.hpp", "", "f", "int"));
        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert!(!listing.content.contains("cimport bool"));
        assert!(!listing.includes.boolean);

        ast.classes.push(Class::new("test.hpp", "", "A"));
        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert!(listing.content.starts_with("from libcpp cimport bool\n"));
        assert!(listing.includes.boolean);
    }

    #[test]
    fn test_last_constructor_wins() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        let mut class = Class::new("test.hpp", "", "A");
        for tipe in ["int", "double"] {
            class.constructors.push(Constructor {
                class_name: "A".into(),
                params: vec![Param::new("x", tipe)],
                ..Constructor::default()
            });
        }
        ast.classes.push(class);

        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert_eq!(listing.content.matches("def __init__").count(), 1);
        assert!(listing.content.contains("def __init__(A self, double x):"));
        assert_eq!(
            listing.diagnostics.of_kind(DiagnosticKind::DuplicateConstructor).count(),
            1
        );
    }

    #[test]
    fn test_abstract_class_has_no_constructor() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        let mut class = class_a();
        class.is_abstract = true;
        class.constructors.push(Constructor {
            class_name: "A".into(),
            ..Constructor::default()
        });
        ast.classes.push(class);

        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert!(!listing.content.contains("__init__"));
        assert_eq!(listing.diagnostics.of_kind(DiagnosticKind::AbstractClass).count(), 1);
    }

    #[test]
    fn test_enum_and_templates_skipped() {
        let config = Configuration::new();
        let mut ast = Ast::new();
        ast.enums.push(Enum {
            name: "Color".into(),
            constants: vec!["red".into(), "green".into()],
            ..Enum::default()
        });
        let mut template = Class::new("test.hpp", "", "Vec");
        template.template_params.push("T".into());
        ast.classes.push(template);

        let listing = emitter(&ast, &config).emit(&ast).unwrap();
        assert!(listing
            .content
            .contains("cdef class Color:\n    red = cpp.red\n    green = cpp.green"));
        assert!(!listing.content.contains("Vec"));
    }

    #[test]
    fn test_in_place_detection() {
        assert!(is_in_place("operator+="));
        assert!(is_in_place("operator|="));
        assert!(!is_in_place("operator=="));
        assert!(!is_in_place("operator="));
        assert!(!is_in_place("operator+"));
        assert!(!is_in_place("plus"));
    }
}
