//! Преобразование типов между Python и C++.
//!
//! Для каждого параметра и результата выбирается ровно один конвертер:
//! сначала пользовательские (в порядке регистрации), затем встроенные.
//! Конвертер порождает фрагменты кода Cython:
//!
//! ```text
//! cpdef my_function(MyClass self, object a, double b):   <- host_signature
//!     cdef vector[double] cpp_a = a                      <- source_to_native
//!     cdef double cpp_b = b
//!     cdef int result = self.thisptr.myFunction(cpp_a, cpp_b)
//!     return result                                      <- return_conversion
//! ```

pub mod builtin;
pub mod includes;

pub use builtin::BUILTIN_CONVERTERS;
pub use includes::Includes;

use crate::ast::Param;
use crate::config::Configuration;
use crate::error::ConversionError;
use crate::registry::TypeRegistry;
use crate::typename::{self, TypeArg, TypeExpr};

/// Всё, что конвертер знает о преобразуемом значении.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'a> {
    /// Нормализованный тип; `None` для результата без типа.
    pub tname: Option<&'a str>,
    /// Имя аргумента на стороне Python.
    pub argname: &'a str,
    pub registry: &'a TypeRegistry,
    /// Все параметры функции (для конвертеров, потребляющих несколько).
    pub params: &'a [Param],
    /// Индекс текущего параметра.
    pub index: usize,
}

impl<'a> ConversionContext<'a> {
    /// Контекст параметра `params[index]`.
    pub fn param(
        registry: &'a TypeRegistry,
        params: &'a [Param],
        index: usize,
        argname: &'a str,
    ) -> Self {
        Self {
            tname: params.get(index).map(|p| p.tipe.as_str()),
            argname,
            registry,
            params,
            index,
        }
    }

    /// Контекст отдельного значения (результат, поле).
    pub fn value(registry: &'a TypeRegistry, tname: Option<&'a str>, argname: &'a str) -> Self {
        Self {
            tname,
            argname,
            registry,
            params: &[],
            index: 0,
        }
    }

    /// Тип (`void` для отсутствующего).
    pub fn tname(&self) -> &'a str {
        self.tname.unwrap_or("void")
    }

    /// Имя локальной переменной C++ для аргумента.
    pub fn native_argname(&self) -> String {
        format!("cpp_{}", self.argname)
    }

    /// Тип после раскрытия typedef и специализации.
    pub fn underlying(&self) -> Result<String, ConversionError> {
        Ok(self.registry.underlying_type(self.tname())?)
    }

    /// Следующий параметр функции.
    pub fn next_param(&self) -> Option<&'a Param> {
        self.params.get(self.index + 1)
    }
}

/// Стратегия преобразования одного типа.
///
/// Реализации не хранят состояние: всё нужное приходит в [`ConversionContext`].
pub trait TypeConverter: Send + Sync {
    /// Имя для диагностики.
    fn name(&self) -> &'static str;

    /// Применим ли конвертер.
    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError>;

    /// Сколько параметров C++ покрывает один аргумент Python.
    fn params_consumed(&self) -> usize {
        1
    }

    /// Отметить нужные импорты.
    fn register_includes(
        &self,
        ctx: &ConversionContext<'_>,
        includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        includes.add_include_for(ctx.tname());
        Ok(())
    }

    /// Операторы, превращающие объект Python в значение C++.
    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError>;

    /// Выражения, передаваемые в вызов C++.
    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError>;

    /// Операторы, возвращающие `result` в Python.
    ///
    /// `alias` означает, что результат ссылается на чужую память и не должен освобождаться.
    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        let _ = (ctx, alias);
        Ok(vec!["return result".to_string()])
    }

    /// Фрагмент сигнатуры функции Python (`double a`).
    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError>;

    /// Объявление переменной C++ (`cdef double`).
    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError>;
}

/// Конвертер, выбранный для конкретного значения.
pub struct BoundConverter<'a> {
    converter: &'a dyn TypeConverter,
    ctx: ConversionContext<'a>,
}

impl<'a> std::fmt::Debug for BoundConverter<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundConverter")
            .field("converter", &self.converter.name())
            .field("tname", &self.ctx.tname)
            .field("argname", &self.ctx.argname)
            .finish()
    }
}

impl<'a> BoundConverter<'a> {
    pub fn name(&self) -> &'static str {
        self.converter.name()
    }

    pub fn context(&self) -> &ConversionContext<'a> {
        &self.ctx
    }

    pub fn params_consumed(&self) -> usize {
        self.converter.params_consumed().max(1)
    }

    pub fn register_includes(&self, includes: &mut Includes) -> Result<(), ConversionError> {
        self.converter.register_includes(&self.ctx, includes)
    }

    pub fn source_to_native(&self) -> Result<Vec<String>, ConversionError> {
        self.converter.source_to_native(&self.ctx)
    }

    pub fn call_arguments(&self) -> Result<Vec<String>, ConversionError> {
        self.converter.call_arguments(&self.ctx)
    }

    pub fn return_conversion(&self, alias: bool) -> Result<Vec<String>, ConversionError> {
        self.converter.return_conversion(&self.ctx, alias)
    }

    pub fn host_signature(&self) -> Result<String, ConversionError> {
        self.converter.host_signature(&self.ctx)
    }

    pub fn native_signature(&self) -> Result<String, ConversionError> {
        self.converter.native_signature(&self.ctx)
    }
}

/// Выбрать первый подходящий конвертер.
pub fn create_type_converter<'a>(
    ctx: ConversionContext<'a>,
    config: &'a Configuration,
) -> Result<BoundConverter<'a>, ConversionError> {
    let mut candidates: Vec<&'a dyn TypeConverter> =
        Vec::with_capacity(config.converters().len() + BUILTIN_CONVERTERS.len());
    for converter in config.converters() {
        candidates.push(converter.as_ref());
    }
    for converter in BUILTIN_CONVERTERS {
        candidates.push(*converter);
    }

    for converter in candidates {
        if converter.matches(&ctx)? {
            log::trace!(
                "Type '{}' of '{}' handled by {}",
                ctx.tname(),
                ctx.argname,
                converter.name()
            );
            return Ok(BoundConverter { converter, ctx });
        }
    }
    Err(ConversionError::NoConverter(ctx.tname().to_string()))
}

/// Запись типа C++ для Cython: имена из библиотеки получают префикс `cpp.`.
pub fn native_type(tname: &str, registry: &TypeRegistry) -> Result<String, ConversionError> {
    let mut ty = typename::parse_type(tname)?;
    prefix_library_names(&mut ty, registry);
    Ok(ty.to_string())
}

fn prefix_library_names(ty: &mut TypeExpr, registry: &TypeRegistry) {
    let known = if ty.args.is_empty() {
        registry.is_enum(&ty.name) || registry.is_typedef(&ty.name) || registry.is_class(&ty.name)
    } else {
        // Специализация шаблонного класса: `A[double]`
        let bare = TypeExpr {
            pointers: 0,
            arrays: Vec::new(),
            ..ty.clone()
        };
        registry.is_class(&bare.to_string())
    };

    for arg in ty.args.iter_mut() {
        if let TypeArg::Type(inner) = arg {
            prefix_library_names(inner, registry);
        }
    }
    if known {
        ty.name = format!("cpp.{}", ty.name);
    }
}
