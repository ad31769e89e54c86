//! Вспомогательные функции для работы с текстом.

/// Ширина баннера [`make_header`].
const HEADER_WIDTH: usize = 80;

/// Зарезервированные слова Python, которые нельзя использовать как имена параметров.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield", "print", "exec",
];

/// Склеить строки через перевод строки.
pub fn lines<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|p| p.as_ref())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Сдвинуть каждую непустую строку блока на `level` уровней (по 4 пробела).
pub fn indent_block(block: &str, level: usize) -> String {
    let prefix = "    ".repeat(level);
    block
        .split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `MyFunctionName` -> `my_function_name`.
pub fn from_camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                // Конец аббревиатуры: `HTTPServer` -> `http_server`
                Some(p) if p.is_ascii_uppercase() => {
                    next.map(|n| n.is_ascii_lowercase()).unwrap_or(false)
                }
                Some(_) => false,
            };
            if boundary {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Является ли имя зарезервированным словом Python.
pub fn is_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Экранировать зарезервированное слово подчёркиванием в конце.
pub fn escape_keyword(name: &str) -> String {
    if is_keyword(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Баннер для отладочного вывода.
pub fn make_header(title: &str) -> String {
    let border = format!("+{}+", "=".repeat(HEADER_WIDTH - 2));
    let inner = HEADER_WIDTH - 4;
    let line = format!("| {:<width$} |", title, width = inner);
    lines(&[border.as_str(), line.as_str(), border.as_str()])
}
