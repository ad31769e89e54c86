//! Конкретное синтаксическое дерево, полученное от front end (clang).
//!
//! Front end передаёт дерево курсоров в JSON; ингестор читает только его.

use serde::{Deserialize, Serialize};

use crate::error::{WrapError, WrapResult};

/// Вид курсора (имена как в libclang `CursorKind`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CursorKind {
    TranslationUnit,
    Namespace,
    ClassDecl,
    StructDecl,
    ClassTemplate,
    FunctionDecl,
    FunctionTemplate,
    TemplateTypeParameter,
    CxxMethod,
    Constructor,
    Destructor,
    FieldDecl,
    ParmDecl,
    TypedefDecl,
    EnumDecl,
    EnumConstantDecl,
    CxxBaseSpecifier,
    CxxAccessSpecDecl,
    CompoundStmt,
    IntegerLiteral,
    FloatingLiteral,
    CxxBoolLiteralExpr,
    StringLiteral,
    CallExpr,
    DeclRefExpr,
    MemberRef,
    NamespaceRef,
    TemplateRef,
    TypeRef,
    UnexposedExpr,
    UnexposedDecl,
    VarDecl,
    /// Вид, о котором генератор ничего не знает.
    Unknown(String),
}

const KIND_NAMES: &[(&str, CursorKind)] = &[
    ("TRANSLATION_UNIT", CursorKind::TranslationUnit),
    ("NAMESPACE", CursorKind::Namespace),
    ("CLASS_DECL", CursorKind::ClassDecl),
    ("STRUCT_DECL", CursorKind::StructDecl),
    ("CLASS_TEMPLATE", CursorKind::ClassTemplate),
    ("FUNCTION_DECL", CursorKind::FunctionDecl),
    ("FUNCTION_TEMPLATE", CursorKind::FunctionTemplate),
    ("TEMPLATE_TYPE_PARAMETER", CursorKind::TemplateTypeParameter),
    ("CXX_METHOD", CursorKind::CxxMethod),
    ("CONSTRUCTOR", CursorKind::Constructor),
    ("DESTRUCTOR", CursorKind::Destructor),
    ("FIELD_DECL", CursorKind::FieldDecl),
    ("PARM_DECL", CursorKind::ParmDecl),
    ("TYPEDEF_DECL", CursorKind::TypedefDecl),
    ("ENUM_DECL", CursorKind::EnumDecl),
    ("ENUM_CONSTANT_DECL", CursorKind::EnumConstantDecl),
    ("CXX_BASE_SPECIFIER", CursorKind::CxxBaseSpecifier),
    ("CXX_ACCESS_SPEC_DECL", CursorKind::CxxAccessSpecDecl),
    ("COMPOUND_STMT", CursorKind::CompoundStmt),
    ("INTEGER_LITERAL", CursorKind::IntegerLiteral),
    ("FLOATING_LITERAL", CursorKind::FloatingLiteral),
    ("CXX_BOOL_LITERAL_EXPR", CursorKind::CxxBoolLiteralExpr),
    ("STRING_LITERAL", CursorKind::StringLiteral),
    ("CALL_EXPR", CursorKind::CallExpr),
    ("DECL_REF_EXPR", CursorKind::DeclRefExpr),
    ("MEMBER_REF", CursorKind::MemberRef),
    ("NAMESPACE_REF", CursorKind::NamespaceRef),
    ("TEMPLATE_REF", CursorKind::TemplateRef),
    ("TYPE_REF", CursorKind::TypeRef),
    ("UNEXPOSED_EXPR", CursorKind::UnexposedExpr),
    ("UNEXPOSED_DECL", CursorKind::UnexposedDecl),
    ("VAR_DECL", CursorKind::VarDecl),
];

impl CursorKind {
    /// Имя вида в нотации libclang.
    pub fn name(&self) -> &str {
        if let CursorKind::Unknown(name) = self {
            return name;
        }
        KIND_NAMES
            .iter()
            .find(|(_, kind)| kind == self)
            .map(|(name, _)| *name)
            .unwrap_or("UNKNOWN")
    }
}

impl From<String> for CursorKind {
    fn from(name: String) -> Self {
        KIND_NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, kind)| kind.clone())
            .unwrap_or(CursorKind::Unknown(name))
    }
}

impl From<CursorKind> for String {
    fn from(kind: CursorKind) -> Self {
        kind.name().to_string()
    }
}

impl std::fmt::Display for CursorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Спецификатор доступа члена класса.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// Позиция узла в исходном файле.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Диагностика front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontendDiagnostic {
    /// `note`, `warning`, `error` или `fatal`.
    pub severity: String,
    pub message: String,
}

impl FrontendDiagnostic {
    pub fn is_fatal(&self) -> bool {
        matches!(self.severity.as_str(), "error" | "fatal")
    }
}

/// Узел дерева front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub kind: CursorKind,
    #[serde(default)]
    pub spelling: String,
    #[serde(default)]
    pub display_name: String,
    /// Запись типа (`PARM_DECL`, `FIELD_DECL`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_spelling: Option<String>,
    /// Тип результата (функции и методы).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    /// Исходный тип typedef.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underlying_type: Option<String>,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_pure_virtual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Токены узла (нужны для литералов).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    /// Краткий документирующий комментарий.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Диагностика front end (только у корня).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<FrontendDiagnostic>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Cursor>,
}

impl Cursor {
    /// Создать курсор заданного вида и имени.
    pub fn new(kind: CursorKind, spelling: impl Into<String>) -> Self {
        let spelling = spelling.into();
        Self {
            kind,
            display_name: spelling.clone(),
            spelling,
            type_spelling: None,
            result_type: None,
            underlying_type: None,
            access: Access::Public,
            is_static: false,
            is_pure_virtual: false,
            location: None,
            tokens: Vec::new(),
            comment: None,
            diagnostics: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Корень дерева для файла.
    pub fn translation_unit(filename: impl Into<String>) -> Self {
        Self::new(CursorKind::TranslationUnit, filename)
    }

    pub fn with_type(mut self, tname: impl Into<String>) -> Self {
        self.type_spelling = Some(tname.into());
        self
    }

    pub fn with_result(mut self, tname: impl Into<String>) -> Self {
        self.result_type = Some(tname.into());
        self
    }

    pub fn with_underlying(mut self, tname: impl Into<String>) -> Self {
        self.underlying_type = Some(tname.into());
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line: 0,
            column: 0,
        });
        self
    }

    pub fn with_tokens(mut self, tokens: &[&str]) -> Self {
        self.tokens = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn pure_virtual(mut self) -> Self {
        self.is_pure_virtual = true;
        self
    }

    /// Добавить дочерний узел.
    pub fn child(mut self, child: Cursor) -> Self {
        self.children.push(child);
        self
    }

    /// Разобрать дерево из JSON.
    ///
    /// Некорректный документ и ошибки компиляции front end фатальны.
    pub fn from_json(json: &str) -> WrapResult<Cursor> {
        let cursor: Cursor =
            serde_json::from_str(json).map_err(|e| WrapError::Frontend(e.to_string()))?;
        cursor.check_diagnostics()?;
        Ok(cursor)
    }

    /// Сериализовать дерево в JSON.
    pub fn to_json(&self) -> WrapResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| WrapError::Frontend(e.to_string()))
    }

    /// Проверить диагностику front end.
    pub fn check_diagnostics(&self) -> WrapResult<()> {
        match self.diagnostics.iter().find(|d| d.is_fatal()) {
            Some(d) => Err(WrapError::Frontend(d.message.clone())),
            None => Ok(()),
        }
    }

    /// Отображаемое имя, если оно есть, иначе `spelling`.
    pub fn name(&self) -> &str {
        if self.display_name.is_empty() {
            &self.spelling
        } else {
            &self.display_name
        }
    }

    /// Файл, в котором объявлен узел.
    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip_names() {
        assert_eq!(CursorKind::from("CXX_METHOD".to_string()), CursorKind::CxxMethod);
        assert_eq!(CursorKind::CxxMethod.name(), "CXX_METHOD");
        assert_eq!(
            CursorKind::from("LAMBDA_EXPR".to_string()),
            CursorKind::Unknown("LAMBDA_EXPR".to_string())
        );
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "kind": "TRANSLATION_UNIT",
            "spelling": "test.hpp",
            "children": [
                {
                    "kind": "CLASS_DECL",
                    "spelling": "A",
                    "location": {"file": "test.hpp", "line": 1},
                    "children": [
                        {"kind": "FIELD_DECL", "spelling": "x", "type_spelling": "double", "access": "private"}
                    ]
                }
            ]
        }"#;
        let cursor = Cursor::from_json(json).unwrap();
        assert_eq!(cursor.kind, CursorKind::TranslationUnit);
        let class = &cursor.children[0];
        assert_eq!(class.kind, CursorKind::ClassDecl);
        assert_eq!(class.file(), Some("test.hpp"));
        assert_eq!(class.children[0].access, Access::Private);
    }

    #[test]
    fn test_malformed_json_is_fatal() {
        let err = Cursor::from_json("{ not json").unwrap_err();
        assert!(matches!(err, WrapError::Frontend(_)));
    }

    #[test]
    fn test_frontend_error_is_fatal() {
        let json = r#"{
            "kind": "TRANSLATION_UNIT",
            "diagnostics": [{"severity": "error", "message": "expected ';'"}]
        }"#;
        let err = Cursor::from_json(json).unwrap_err();
        assert_eq!(err.to_string(), "Frontend error: expected ';'");
    }

    #[test]
    fn test_warning_is_not_fatal() {
        let json = r#"{
            "kind": "TRANSLATION_UNIT",
            "diagnostics": [{"severity": "warning", "message": "unused"}]
        }"#;
        assert!(Cursor::from_json(json).is_ok());
    }

    #[test]
    fn test_serialize_roundtrip() {
        let cursor = Cursor::translation_unit("a.hpp")
            .child(Cursor::new(CursorKind::FunctionDecl, "f").with_result("void"));
        let json = cursor.to_json().unwrap();
        assert_eq!(Cursor::from_json(&json).unwrap(), cursor);
    }
}
