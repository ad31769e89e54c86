//! Эмиттер файла объявлений (`.pxd`).
//!
//! Каждое объявление получает собственный блок `cdef extern from`, поэтому
//! порядок блоков не зависит от пространств имён.

use std::mem;

use super::extern_header;
use crate::ast::{walk_ast, Ast, Class, Constructor, Enum, Field, Function, Method, Param, Typedef, Visitor};
use crate::config::Configuration;
use crate::conversion::Includes;
use crate::error::WrapResult;
use crate::utils::{escape_keyword, indent_block, lines};

/// Посетитель, генерирующий `.pxd`.
pub struct DeclarationEmitter<'a> {
    config: &'a Configuration,
    includes: Includes,
    fields: Vec<String>,
    constructors: Vec<String>,
    methods: Vec<String>,
    blocks: Vec<String>,
}

impl<'a> DeclarationEmitter<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self {
            config,
            includes: Includes::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Обойти дерево и собрать файл.
    pub fn emit(mut self, ast: &Ast) -> WrapResult<String> {
        walk_ast(&mut self, ast)?;
        Ok(self.export())
    }

    fn export(self) -> String {
        let imports = self.includes.declarations_import();
        let mut parts = Vec::new();
        if !imports.is_empty() {
            parts.push(lines(&imports));
        }
        parts.extend(self.config.settings.additional_declarations.iter().cloned());
        parts.extend(self.blocks);
        parts.join("\n\n") + "\n"
    }

    fn params(&mut self, params: &[Param]) -> String {
        params
            .iter()
            .map(|p| {
                self.includes.add_include_for(&p.tipe);
                format!("{} {}", p.tipe, escape_keyword(&p.name))
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn push_block(&mut self, filename: &str, namespace: &str, body: &str) {
        self.blocks.push(format!(
            "{}\n{}",
            extern_header(filename, namespace),
            indent_block(body, 1)
        ));
    }
}

fn template_name(name: &str, template_params: &[String]) -> String {
    if template_params.is_empty() {
        name.to_string()
    } else {
        format!("{}[{}]", name, template_params.join(", "))
    }
}

impl<'a> Visitor for DeclarationEmitter<'a> {
    fn visit_enum(&mut self, node: &Enum) -> WrapResult<()> {
        if node.ignored {
            return Ok(());
        }
        let mut out = vec![format!("cdef enum {}:", node.name)];
        out.extend(node.constants.iter().map(|c| format!("    {}", c)));
        if node.constants.is_empty() {
            out.push("    pass".to_string());
        }
        self.push_block(&node.filename, &node.namespace, &lines(&out));
        Ok(())
    }

    fn visit_typedef(&mut self, node: &Typedef) -> WrapResult<()> {
        if node.ignored {
            return Ok(());
        }
        self.includes.add_include_for(&node.underlying);
        let body = format!("ctypedef {} {}", node.underlying, node.name);
        self.push_block(&node.filename, &node.namespace, &body);
        Ok(())
    }

    fn visit_field(&mut self, node: &Field) -> WrapResult<()> {
        if node.ignored {
            return Ok(());
        }
        self.includes.add_include_for(&node.tipe);
        self.fields.push(format!("{} {}", node.tipe, node.name));
        Ok(())
    }

    fn visit_constructor(&mut self, node: &Constructor) -> WrapResult<()> {
        if node.ignored {
            return Ok(());
        }
        let params = self.params(&node.params);
        self.constructors
            .push(format!("{}({}) except +", node.class_name, params));
        Ok(())
    }

    fn visit_method(&mut self, node: &Method) -> WrapResult<()> {
        // Специализации вызывают общий шаблон, объявленный ниже
        if node.ignored || node.specialization.is_some() {
            return Ok(());
        }
        self.includes.add_include_for(&node.result_type);
        let params = self.params(&node.params);
        let name = match self.config.call_operator(&node.name)? {
            Some(alias) => format!("{} \"{}\"", alias, node.name),
            None => template_name(&node.name, &node.template_params),
        };
        self.methods
            .push(format!("{} {}({}) except +", node.result_type, name, params));
        Ok(())
    }

    fn visit_class(&mut self, node: &Class) -> WrapResult<()> {
        let fields = mem::take(&mut self.fields);
        let constructors = mem::take(&mut self.constructors);
        let methods = mem::take(&mut self.methods);
        if node.ignored || node.specialization.is_some() {
            return Ok(());
        }

        let mut members: Vec<String> = fields.into_iter().chain(constructors).chain(methods).collect();
        if members.is_empty() {
            members.push("pass".to_string());
        }
        let body = format!(
            "cdef cppclass {}:\n{}",
            template_name(&node.name, &node.template_params),
            indent_block(&lines(&members), 1)
        );
        self.push_block(&node.filename, &node.namespace, &body);
        Ok(())
    }

    fn visit_function(&mut self, node: &Function) -> WrapResult<()> {
        if node.ignored || node.specialization.is_some() {
            return Ok(());
        }
        self.includes.add_include_for(&node.result_type);
        let params = self.params(&node.params);
        let body = format!(
            "{} {}({}) except +",
            node.result_type,
            template_name(&node.name, &node.template_params),
            params
        );
        self.push_block(&node.filename, &node.namespace, &body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Specialization;
    use std::collections::BTreeMap;

    fn emit(ast: &Ast) -> String {
        DeclarationEmitter::new(&Configuration::new()).emit(ast).unwrap()
    }

    #[test]
    fn test_function_decl() {
        let mut ast = Ast::new();
        let mut function = Function::new("test.hpp", "", "add", "int");
        function.params = vec![Param::new("a", "int"), Param::new("b", "int")];
        ast.functions.push(function);

        assert_eq!(
            emit(&ast),
            lines(&[
                "cdef extern from \"test.hpp\" namespace \"\":",
                "    int add(int a, int b) except +",
                "",
            ])
        );
    }

    #[test]
    fn test_enum_and_typedef_decl() {
        let mut ast = Ast::new();
        ast.enums.push(Enum {
            filename: "test.hpp".into(),
            namespace: "ns".into(),
            name: "Color".into(),
            constants: vec!["red".into(), "green".into()],
            ..Enum::default()
        });
        ast.typedefs.push(Typedef {
            filename: "test.hpp".into(),
            namespace: "ns".into(),
            name: "real".into(),
            underlying: "double".into(),
            ignored: false,
        });

        let pxd = emit(&ast);
        assert!(pxd.contains(&lines(&[
            "cdef extern from \"test.hpp\" namespace \"ns\":",
            "    cdef enum Color:",
            "        red",
            "        green",
        ])));
        assert!(pxd.contains("    ctypedef double real"));
    }

    #[test]
    fn test_class_decl() {
        let mut ast = Ast::new();
        let mut class = Class::new("test.hpp", "", "A");
        class.fields.push(Field {
            name: "value".into(),
            tipe: "vector[double]".into(),
            class_name: "A".into(),
            ignored: false,
        });
        class.constructors.push(Constructor {
            class_name: "A".into(),
            params: vec![Param::new("x", "double")],
            ..Constructor::default()
        });
        let mut method = Method::new("set", "void", "A");
        method.params.push(Param::new("lambda", "bool"));
        class.methods.push(method);
        let mut call = Method::new("operator()", "double", "A");
        call.params.push(Param::new("x", "double"));
        class.methods.push(call);
        let mut hidden = Method::new("hidden", "void", "A");
        hidden.ignored = true;
        class.methods.push(hidden);
        ast.classes.push(class);

        let pxd = emit(&ast);
        assert!(pxd.starts_with(&lines(&[
            "from libcpp cimport bool",
            "from libcpp.vector cimport vector",
        ])));
        assert!(pxd.contains(&lines(&[
            "    cdef cppclass A:",
            "        vector[double] value",
            "        A(double x) except +",
            "        void set(bool lambda_) except +",
            "        double call \"operator()\"(double x) except +",
        ])));
        assert!(!pxd.contains("hidden"));
    }

    #[test]
    fn test_templates_declared_specializations_not() {
        let mut ast = Ast::new();
        let mut template = Class::new("test.hpp", "", "Vec");
        template.template_params.push("T".into());
        let mut get = Method::new("get", "T", "Vec");
        get.params.push(Param::new("i", "int"));
        template.methods.push(get);
        let mut specialized = template.clone();
        specialized.name = "VecDouble".into();
        specialized.specialization = Some(Specialization {
            native_name: "Vec[double]".into(),
            substitution: BTreeMap::new(),
        });
        ast.classes.push(template);
        ast.classes.push(specialized);

        let mut function = Function::new("test.hpp", "", "twice", "T");
        function.template_params.push("T".into());
        function.params.push(Param::new("x", "T"));
        ast.functions.push(function);

        let pxd = emit(&ast);
        assert!(pxd.contains("    cdef cppclass Vec[T]:\n        T get(int i) except +"));
        assert!(pxd.contains("    T twice[T](T x) except +"));
        assert!(!pxd.contains("VecDouble"));
    }

    #[test]
    fn test_empty_class_and_additional_declarations() {
        let mut ast = Ast::new();
        ast.classes.push(Class::new("test.hpp", "", "Empty"));
        let mut config = Configuration::new();
        config.add_declaration("cdef extern from \"extra.hpp\":\n    int extra()");

        let pxd = DeclarationEmitter::new(&config).emit(&ast).unwrap();
        assert!(pxd.contains("    cdef cppclass Empty:\n        pass"));
        let extra = pxd.find("extra.hpp").unwrap();
        let class = pxd.find("Empty").unwrap();
        assert!(extra < class);
    }
}
