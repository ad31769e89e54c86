//! Парсер записи C++-типа в дерево [`TypeExpr`].

use std::collections::HashMap;
use std::fmt;

use super::error::TypeParseError;
use super::lexer::Lexer;
use super::token::{Span, Token};

/// Квалификаторы и уточняющие ключевые слова, которые не влияют на имя типа.
const DROPPED_KEYWORDS: &[&str] = &[
    "const", "volatile", "struct", "class", "enum", "union", "typename",
];

/// Слова встроенных типов, которые могут идти подряд (`unsigned long int`).
const BUILTIN_WORDS: &[&str] = &[
    "unsigned", "signed", "short", "long", "int", "char", "double", "float", "bool", "void",
    "wchar_t",
];

/// Члены контейнеров, которые нельзя обернуть.
const ITERATOR_MEMBERS: &[&str] = &["iterator", "const_iterator"];

/// Аргумент шаблона.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    /// Типовой аргумент.
    Type(TypeExpr),
    /// Целочисленный аргумент (`Matrix<double, 3>`).
    Value(u64),
}

/// Нормализованное дерево типа.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeExpr {
    /// Имя без пространства имён (`vector`, `unsigned int`).
    pub name: String,
    /// Аргументы шаблона.
    pub args: Vec<TypeArg>,
    /// Количество уровней указателя.
    pub pointers: usize,
    /// Размерности массива (`None` для `[]`).
    pub arrays: Vec<Option<u64>>,
}

impl TypeExpr {
    /// Создать простой тип по имени.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Тип вида `T *` (ровно один уровень указателя, без массивов).
    pub fn is_pointer(&self) -> bool {
        self.pointers == 1 && self.arrays.is_empty()
    }

    /// Тип без одного уровня указателя.
    pub fn pointee(&self) -> TypeExpr {
        let mut inner = self.clone();
        inner.pointers = inner.pointers.saturating_sub(1);
        inner
    }

    /// Проверить, является ли тип шаблонным.
    pub fn is_generic(&self) -> bool {
        !self.args.is_empty()
    }

    /// Имя вместе с суффиксом указателя, без аргументов шаблона.
    pub fn head(&self) -> String {
        let mut head = self.name.clone();
        push_suffixes(&mut head, self.pointers, &[]);
        head
    }

    /// Все имена в дереве (включая корень), в порядке обхода.
    pub fn subtypes(&self) -> Vec<String> {
        let mut result = Vec::new();
        self.collect_subtypes(&mut result);
        result
    }

    fn collect_subtypes(&self, result: &mut Vec<String>) {
        let head = self.head();
        if !result.contains(&head) {
            result.push(head);
        }
        for arg in &self.args {
            if let TypeArg::Type(inner) = arg {
                inner.collect_subtypes(result);
            }
        }
    }

    /// Заменить имена без аргументов по таблице подстановки.
    ///
    /// Подставленный тип наследует указатели и массивы заменяемого узла.
    pub fn substitute(&self, table: &HashMap<String, TypeExpr>) -> TypeExpr {
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                TypeArg::Type(inner) => TypeArg::Type(inner.substitute(table)),
                TypeArg::Value(n) => TypeArg::Value(*n),
            })
            .collect::<Vec<_>>();

        match table.get(&self.name) {
            Some(replacement) if self.args.is_empty() => {
                let mut result = replacement.clone();
                result.pointers += self.pointers;
                result.arrays.extend(self.arrays.iter().copied());
                result
            }
            _ => TypeExpr {
                name: self.name.clone(),
                args,
                pointers: self.pointers,
                arrays: self.arrays.clone(),
            },
        }
    }
}

fn push_suffixes(out: &mut String, pointers: usize, arrays: &[Option<u64>]) {
    if pointers > 0 {
        out.push(' ');
        out.push_str(&"*".repeat(pointers));
    }
    for dim in arrays {
        match dim {
            Some(n) => out.push_str(&format!(" [{}]", n)),
            None => out.push_str(" []"),
        }
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeArg::Type(ty) => write!(f, "{}", ty),
            TypeArg::Value(n) => write!(f, "{}", n),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.name.clone();
        if !self.args.is_empty() {
            let args = self
                .args
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            out.push('[');
            out.push_str(&args);
            out.push(']');
        }
        push_suffixes(&mut out, self.pointers, &self.arrays);
        write!(f, "{}", out)
    }
}

/// Парсер записи типа.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    /// Создать новый парсер.
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Распарсить полную запись типа (до конца строки).
    pub fn parse(&mut self) -> Result<TypeExpr, TypeParseError> {
        let ty = self.parse_type()?;
        let token = self.lexer.next_token()?;
        match token.value {
            Token::Eof => Ok(ty),
            other => Err(TypeParseError::unexpected_token(
                token.span,
                "end of type",
                &other,
            )),
        }
    }

    /// Распарсить один тип (возможно, вложенный в аргументы шаблона).
    fn parse_type(&mut self) -> Result<TypeExpr, TypeParseError> {
        self.skip_dropped_keywords()?;

        let (mut ty, _) = self.parse_segment()?;

        // Пространства имён отбрасываются: остаётся последний сегмент
        loop {
            let peeked = self.lexer.peek_token()?.value.clone();
            if peeked != Token::Scope {
                break;
            }
            self.lexer.next_token()?;
            self.skip_dropped_keywords()?;
            let (segment, _) = self.parse_segment()?;
            if ITERATOR_MEMBERS.contains(&segment.name.as_str()) {
                return Err(TypeParseError::IteratorType {
                    spelling: self.lexer.source().to_string(),
                });
            }
            ty = segment;
        }

        self.parse_suffixes(&mut ty)?;
        Ok(ty)
    }

    /// Имя (возможно из нескольких встроенных слов) и аргументы шаблона.
    fn parse_segment(&mut self) -> Result<(TypeExpr, Span), TypeParseError> {
        let first = self.lexer.next_token()?;
        let mut span = first.span;
        let mut name = match first.value {
            Token::Ident(s) => s,
            Token::Eof => {
                return Err(TypeParseError::unexpected_end(first.span, "expected type name"))
            }
            other => {
                return Err(TypeParseError::unexpected_token(
                    first.span,
                    "type name",
                    &other,
                ))
            }
        };

        if BUILTIN_WORDS.contains(&name.as_str()) {
            loop {
                let peeked = self.lexer.peek_token()?.value.clone();
                match peeked {
                    Token::Ident(word) if BUILTIN_WORDS.contains(&word.as_str()) => {
                        let next = self.lexer.next_token()?;
                        span = span.merge(next.span);
                        name.push(' ');
                        name.push_str(&word);
                    }
                    Token::Ident(word) if word == "const" || word == "volatile" => {
                        self.lexer.next_token()?;
                    }
                    _ => break,
                }
            }
        }

        let mut ty = TypeExpr::named(name);

        let next = self.lexer.peek_token()?.clone();
        let opens_args = match next.value {
            Token::LAngle => true,
            // Уже нормализованная запись: `vector[int]` без пробела
            Token::LBracket => span.touches(next.span),
            _ => false,
        };
        if opens_args {
            self.lexer.next_token()?;
            ty.args = self.parse_args(next.span)?;
            span = span.merge(next.span);
        }

        Ok((ty, span))
    }

    /// Аргументы шаблона после открывающей скобки.
    fn parse_args(&mut self, open: Span) -> Result<Vec<TypeArg>, TypeParseError> {
        let mut args = Vec::new();
        loop {
            let next = self.lexer.peek_token()?.clone();
            let arg = match next.value {
                Token::Int(n) => {
                    self.lexer.next_token()?;
                    TypeArg::Value(n)
                }
                Token::Eof => {
                    return Err(TypeParseError::unexpected_end(
                        open,
                        "unclosed template argument list",
                    ))
                }
                _ => TypeArg::Type(self.parse_type()?),
            };
            args.push(arg);

            let sep = self.lexer.next_token()?;
            match sep.value {
                Token::Comma => continue,
                ref close if close.is_closing() => return Ok(args),
                Token::Eof => {
                    return Err(TypeParseError::unexpected_end(
                        open,
                        "unclosed template argument list",
                    ))
                }
                other => {
                    return Err(TypeParseError::unexpected_token(
                        sep.span,
                        "',' or closing bracket",
                        &other,
                    ))
                }
            }
        }
    }

    /// Указатели, ссылки, квалификаторы и размерности массивов.
    fn parse_suffixes(&mut self, ty: &mut TypeExpr) -> Result<(), TypeParseError> {
        loop {
            let next = self.lexer.peek_token()?.clone();
            match next.value {
                Token::Star => {
                    self.lexer.next_token()?;
                    ty.pointers += 1;
                }
                Token::Amp | Token::AmpAmp => {
                    self.lexer.next_token()?;
                }
                Token::Ident(ref w) if w == "const" || w == "volatile" => {
                    self.lexer.next_token()?;
                }
                Token::LBracket => {
                    self.lexer.next_token()?;
                    let token = self.lexer.next_token()?;
                    let dim = match token.value {
                        Token::Int(n) => {
                            let close = self.lexer.next_token()?;
                            if close.value != Token::RBracket {
                                return Err(TypeParseError::unexpected_token(
                                    close.span,
                                    "']'",
                                    &close.value,
                                ));
                            }
                            Some(n)
                        }
                        Token::RBracket => None,
                        other => {
                            return Err(TypeParseError::unexpected_token(
                                token.span,
                                "array size",
                                &other,
                            ))
                        }
                    };
                    ty.arrays.push(dim);
                }
                _ => return Ok(()),
            }
        }
    }

    /// Пропустить `const`, `struct` и т.п. перед именем.
    fn skip_dropped_keywords(&mut self) -> Result<(), TypeParseError> {
        loop {
            let peeked = self.lexer.peek_token()?.value.clone();
            match peeked {
                Token::Ident(w) if DROPPED_KEYWORDS.contains(&w.as_str()) => {
                    self.lexer.next_token()?;
                }
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> TypeExpr {
        Parser::new(source).parse().unwrap()
    }

    #[test]
    fn test_parse_builtin_words() {
        let ty = parse("unsigned long int");
        assert_eq!(ty.name, "unsigned long int");
        assert_eq!(ty.pointers, 0);
    }

    #[test]
    fn test_parse_nested_templates() {
        let ty = parse("std::map<std::string, std::vector<int> >");
        assert_eq!(ty.name, "map");
        assert_eq!(ty.args.len(), 2);
        assert_eq!(ty.to_string(), "map[string, vector[int]]");
    }

    #[test]
    fn test_parse_pointer_and_const() {
        let ty = parse("const char *const");
        assert_eq!(ty.name, "char");
        assert!(ty.is_pointer());
        assert_eq!(ty.to_string(), "char *");
    }

    #[test]
    fn test_parse_array_is_not_template() {
        let ty = parse("double [5]");
        assert!(ty.args.is_empty());
        assert_eq!(ty.arrays, vec![Some(5)]);
        assert_eq!(ty.to_string(), "double [5]");
    }

    #[test]
    fn test_parse_value_argument() {
        let ty = parse("Eigen::Matrix<double, 3, 1>");
        assert_eq!(ty.to_string(), "Matrix[double, 3, 1]");
    }

    #[test]
    fn test_parse_iterator_rejected() {
        let err = Parser::new("std::vector<int>::const_iterator").parse();
        assert!(matches!(err, Err(TypeParseError::IteratorType { .. })));
    }

    #[test]
    fn test_parse_unclosed() {
        let err = Parser::new("vector<int").parse();
        assert!(matches!(err, Err(TypeParseError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_subtypes_keep_pointer() {
        let ty = parse("vector[double *]");
        assert_eq!(ty.subtypes(), vec!["vector".to_string(), "double *".to_string()]);
    }

    #[test]
    fn test_substitute_keeps_pointer_of_placeholder() {
        let mut table = HashMap::new();
        table.insert("T".to_string(), parse("double"));
        let ty = parse("vector<T *>").substitute(&table);
        assert_eq!(ty.to_string(), "vector[double *]");
    }
}
