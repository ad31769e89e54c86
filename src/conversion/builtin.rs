//! Встроенные конвертеры (в порядке приоритета).

use super::{native_type, ConversionContext, Includes, TypeConverter};
use crate::error::ConversionError;
use crate::typename::{self, TypeArg, TypeExpr};

/// Типы, которые Cython преобразует сам.
pub const AUTOMATIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "char *",
    "short",
    "unsigned short",
    "int",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "size_t",
    "float",
    "double",
];

/// Целочисленные типы (для длины массива и литералов по умолчанию).
pub const INTEGER_TYPES: &[&str] = &[
    "short",
    "unsigned short",
    "int",
    "unsigned int",
    "long",
    "unsigned long",
    "long long",
    "unsigned long long",
    "size_t",
];

/// Контейнеры, которые Cython преобразует сам.
const STL_AUTOMATIC: &[&str] = &["string", "map", "vector", "list", "set", "pair"];

/// Элементы массивов, передаваемых как numpy-массив.
const ARRAY_ELEMENTS: &[&str] = &["double", "float"];

/// Встроенные конвертеры в порядке проверки.
pub static BUILTIN_CONVERTERS: &[&dyn TypeConverter] = &[
    &ArrayWithLengthConverter,
    &CStringConverter,
    &VoidConverter,
    &AutomaticConverter,
    &AutomaticPointerConverter,
    &EnumConverter,
    &ClassByValueConverter,
    &ClassByPointerConverter,
    &StlConverter,
];

pub fn is_automatic(tname: &str) -> bool {
    AUTOMATIC_TYPES.contains(&tname)
}

pub fn is_integer(tname: &str) -> bool {
    INTEGER_TYPES.contains(&tname)
}

fn parse(tname: &str) -> Result<TypeExpr, ConversionError> {
    Ok(typename::parse_type(tname)?)
}

/// Тип, на который указывает значение, после раскрытия typedef.
fn pointee_underlying(ctx: &ConversionContext<'_>) -> Result<Option<String>, ConversionError> {
    let ty = parse(ctx.tname())?;
    if !ty.is_pointer() {
        return Ok(None);
    }
    let pointee = ty.pointee().to_string();
    Ok(Some(ctx.registry.underlying_type(&pointee)?))
}

// =============================================================================
// Массив с длиной
// =============================================================================

/// `(double * data, int size)` -> один аргумент numpy.
pub struct ArrayWithLengthConverter;

impl ArrayWithLengthConverter {
    fn element(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        pointee_underlying(ctx)?
            .ok_or_else(|| ConversionError::unsupported(self.name(), "element", ctx.tname()))
    }
}

impl TypeConverter for ArrayWithLengthConverter {
    fn name(&self) -> &'static str {
        "ArrayWithLengthConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        if ctx.tname.is_none() {
            return Ok(false);
        }
        let next = match ctx.next_param() {
            Some(next) => next,
            None => return Ok(false),
        };
        let element = match pointee_underlying(ctx)? {
            Some(element) => element,
            None => return Ok(false),
        };
        let length = ctx.registry.underlying_type(&next.tipe)?;
        Ok(ARRAY_ELEMENTS.contains(&element.as_str()) && is_integer(&length))
    }

    fn params_consumed(&self) -> usize {
        2
    }

    fn register_includes(
        &self,
        _ctx: &ConversionContext<'_>,
        includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        includes.add_include_for_numpy();
        Ok(())
    }

    fn source_to_native(&self, _ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(Vec::new())
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![
            format!("&{}[0]", ctx.argname),
            format!("{}.shape[0]", ctx.argname),
        ])
    }

    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        _alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        Err(ConversionError::unsupported(self.name(), "return", ctx.tname()))
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!(
            "np.ndarray[{}, ndim=1] {}",
            self.element(ctx)?,
            ctx.argname
        ))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {} *", self.element(ctx)?))
    }
}

// =============================================================================
// Строка C
// =============================================================================

/// `char *` передаётся как есть.
pub struct CStringConverter;

impl TypeConverter for CStringConverter {
    fn name(&self) -> &'static str {
        "CStringConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        Ok(ctx.tname.is_some() && ctx.underlying()? == "char *")
    }

    fn source_to_native(&self, _ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(Vec::new())
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.argname.to_string()])
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("char * {}", ctx.argname))
    }

    fn native_signature(&self, _ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok("cdef const char *".to_string())
    }
}

// =============================================================================
// void
// =============================================================================

/// Отсутствующий результат.
pub struct VoidConverter;

impl TypeConverter for VoidConverter {
    fn name(&self) -> &'static str {
        "VoidConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        Ok(ctx.tname.is_none() || ctx.underlying()? == "void")
    }

    fn register_includes(
        &self,
        _ctx: &ConversionContext<'_>,
        _includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        Ok(())
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Err(ConversionError::unsupported(self.name(), "argument", ctx.tname()))
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Err(ConversionError::unsupported(self.name(), "argument", ctx.tname()))
    }

    fn return_conversion(
        &self,
        _ctx: &ConversionContext<'_>,
        _alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        Ok(Vec::new())
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Err(ConversionError::unsupported(self.name(), "argument", ctx.tname()))
    }

    fn native_signature(&self, _ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(String::new())
    }
}

// =============================================================================
// Примитивы
// =============================================================================

/// bool, целые, вещественные, string.
pub struct AutomaticConverter;

impl TypeConverter for AutomaticConverter {
    fn name(&self) -> &'static str {
        "AutomaticConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        Ok(ctx.tname.is_some() && is_automatic(&ctx.underlying()?))
    }

    fn register_includes(
        &self,
        ctx: &ConversionContext<'_>,
        includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        includes.add_include_for(&ctx.underlying()?);
        Ok(())
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![format!(
            "{} {} = {}",
            self.native_signature(ctx)?,
            ctx.native_argname(),
            ctx.argname
        )])
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.native_argname()])
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!(
            "{} {}",
            ctx.registry.typedef_prefix(ctx.tname()),
            ctx.argname
        ))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {}", ctx.registry.typedef_prefix(ctx.tname())))
    }
}

/// Указатель на примитив: передаётся адрес локальной переменной.
pub struct AutomaticPointerConverter;

impl TypeConverter for AutomaticPointerConverter {
    fn name(&self) -> &'static str {
        "AutomaticPointerConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        if ctx.tname.is_none() {
            return Ok(false);
        }
        Ok(pointee_underlying(ctx)?
            .map(|p| is_automatic(&p))
            .unwrap_or(false))
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![format!(
            "{} {} = &{}",
            self.native_signature(ctx)?,
            ctx.native_argname(),
            ctx.argname
        )])
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.native_argname()])
    }

    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        _alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        Err(ConversionError::unsupported(self.name(), "return", ctx.tname()))
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        let pointee = parse(ctx.tname())?.pointee().to_string();
        Ok(format!(
            "{} {}",
            ctx.registry.typedef_prefix(&pointee),
            ctx.argname
        ))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {}", native_type(ctx.tname(), ctx.registry)?))
    }
}

// =============================================================================
// Перечисления
// =============================================================================

/// Перечисление по значению.
pub struct EnumConverter;

impl TypeConverter for EnumConverter {
    fn name(&self) -> &'static str {
        "EnumConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        Ok(ctx.tname.is_some() && ctx.registry.is_enum(&ctx.underlying()?))
    }

    fn register_includes(
        &self,
        _ctx: &ConversionContext<'_>,
        _includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        Ok(())
    }

    fn source_to_native(&self, _ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(Vec::new())
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.argname.to_string()])
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!(
            "{} {}",
            native_type(ctx.tname(), ctx.registry)?,
            ctx.argname
        ))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {}", native_type(ctx.tname(), ctx.registry)?))
    }
}

// =============================================================================
// Классы библиотеки
// =============================================================================

/// Имя класса Python и тип C++ для значения класса.
fn class_names(
    ctx: &ConversionContext<'_>,
    underlying: &str,
) -> Result<(String, String), ConversionError> {
    let host = ctx
        .registry
        .host_class_name(underlying)
        .ok_or_else(|| ConversionError::NoConverter(ctx.tname().to_string()))?
        .to_string();
    let native = native_type(underlying, ctx.registry)?;
    Ok((host, native))
}

/// Класс по значению: передаётся разыменованный указатель обёртки.
pub struct ClassByValueConverter;

impl TypeConverter for ClassByValueConverter {
    fn name(&self) -> &'static str {
        "ClassByValueConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        Ok(ctx.tname.is_some() && ctx.registry.is_class(&ctx.underlying()?))
    }

    fn register_includes(
        &self,
        ctx: &ConversionContext<'_>,
        includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        includes.add_include_for_deref();
        includes.add_include_for(ctx.tname());
        Ok(())
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        let (_, native) = class_names(ctx, &ctx.underlying()?)?;
        Ok(vec![format!(
            "cdef {} * {} = {}.thisptr",
            native,
            ctx.native_argname(),
            ctx.argname
        )])
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![format!("deref({})", ctx.native_argname())])
    }

    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        _alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        let (host, native) = class_names(ctx, &ctx.underlying()?)?;
        Ok(vec![
            format!("cdef {} ret = {}.__new__({})", host, host, host),
            format!("ret.thisptr = new {}(result)", native),
            "return ret".to_string(),
        ])
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        let (host, _) = class_names(ctx, &ctx.underlying()?)?;
        Ok(format!("{} {}", host, ctx.argname))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {}", native_type(ctx.tname(), ctx.registry)?))
    }
}

/// Указатель на класс: передаётся указатель обёртки.
pub struct ClassByPointerConverter;

impl ClassByPointerConverter {
    /// Раскрытый тип класса, на который указывает значение.
    fn target(&self, ctx: &ConversionContext<'_>) -> Result<Option<String>, ConversionError> {
        if let Some(pointee) = pointee_underlying(ctx)? {
            if ctx.registry.is_class(&pointee) {
                return Ok(Some(pointee));
            }
            return Ok(None);
        }
        // typedef на указатель: `typedef A * APtr`
        let underlying = parse(&ctx.underlying()?)?;
        if underlying.is_pointer() {
            let pointee = ctx.registry.underlying_type(&underlying.pointee().to_string())?;
            if ctx.registry.is_class(&pointee) {
                return Ok(Some(pointee));
            }
        }
        Ok(None)
    }

    fn names(&self, ctx: &ConversionContext<'_>) -> Result<(String, String), ConversionError> {
        let target = self
            .target(ctx)?
            .ok_or_else(|| ConversionError::NoConverter(ctx.tname().to_string()))?;
        class_names(ctx, &target)
    }
}

impl TypeConverter for ClassByPointerConverter {
    fn name(&self) -> &'static str {
        "ClassByPointerConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        if ctx.tname.is_none() {
            return Ok(false);
        }
        Ok(self.target(ctx)?.is_some())
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        let (_, native) = self.names(ctx)?;
        Ok(vec![format!(
            "cdef {} * {} = {}.thisptr",
            native,
            ctx.native_argname(),
            ctx.argname
        )])
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.native_argname()])
    }

    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        let (host, _) = self.names(ctx)?;
        let mut lines = vec![
            format!("cdef {} ret = {}.__new__({})", host, host, host),
            "ret.thisptr = result".to_string(),
        ];
        if alias {
            lines.push("ret.delete_thisptr = False".to_string());
        }
        lines.push("return ret".to_string());
        Ok(lines)
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        let (host, _) = self.names(ctx)?;
        Ok(format!("{} {}", host, ctx.argname))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        let (_, native) = self.names(ctx)?;
        Ok(format!("cdef {} *", native))
    }
}

// =============================================================================
// Контейнеры STL
// =============================================================================

/// Контейнеры STL, которые Cython преобразует автоматически.
pub struct StlConverter;

impl StlConverter {
    /// Класс элемента для `vector[A]`: (имя Python, тип C++).
    fn class_element(
        &self,
        ctx: &ConversionContext<'_>,
    ) -> Result<Option<(String, String)>, ConversionError> {
        let ty = parse(&ctx.underlying()?)?;
        if ty.name != "vector" {
            return Ok(None);
        }
        let element = match ty.args.first() {
            Some(TypeArg::Type(element)) if element.pointers == 0 => element.to_string(),
            _ => return Ok(None),
        };
        let element = ctx.registry.underlying_type(&element)?;
        if !ctx.registry.is_class(&element) {
            return Ok(None);
        }
        Ok(Some(class_names(ctx, &element)?))
    }
}

impl TypeConverter for StlConverter {
    fn name(&self) -> &'static str {
        "StlConverter"
    }

    fn matches(&self, ctx: &ConversionContext<'_>) -> Result<bool, ConversionError> {
        if ctx.tname.is_none() {
            return Ok(false);
        }
        let ty = parse(&ctx.underlying()?)?;
        Ok(ty.pointers == 0 && ty.arrays.is_empty() && STL_AUTOMATIC.contains(&ty.name.as_str()))
    }

    fn register_includes(
        &self,
        ctx: &ConversionContext<'_>,
        includes: &mut Includes,
    ) -> Result<(), ConversionError> {
        let underlying = ctx.underlying()?;
        includes.add_include_for(&underlying);
        for name in typename::subtypes(&underlying)? {
            let resolved = ctx.registry.underlying_type(&name)?;
            includes.add_include_for(&resolved);
            if ctx.registry.is_class(&resolved) {
                includes.add_include_for_deref();
            }
        }
        Ok(())
    }

    fn source_to_native(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        let native = native_type(ctx.tname(), ctx.registry)?;
        let cpp_arg = ctx.native_argname();
        match self.class_element(ctx)? {
            Some((host, _)) => {
                let value = format!("value_{}", ctx.argname);
                Ok(vec![
                    format!("cdef {} {}", native, cpp_arg),
                    format!("cdef {} {}", host, value),
                    format!("for {} in {}:", value, ctx.argname),
                    format!("    {}.push_back(deref({}.thisptr))", cpp_arg, value),
                ])
            }
            None => Ok(vec![format!("cdef {} {} = {}", native, cpp_arg, ctx.argname)]),
        }
    }

    fn call_arguments(&self, ctx: &ConversionContext<'_>) -> Result<Vec<String>, ConversionError> {
        Ok(vec![ctx.native_argname()])
    }

    fn return_conversion(
        &self,
        ctx: &ConversionContext<'_>,
        _alias: bool,
    ) -> Result<Vec<String>, ConversionError> {
        match self.class_element(ctx)? {
            Some((host, native)) => Ok(vec![
                format!("cdef {} element_result", host),
                "ret = []".to_string(),
                "for i_result in range(result.size()):".to_string(),
                format!("    element_result = {}.__new__({})", host, host),
                format!("    element_result.thisptr = new {}(result[i_result])", native),
                "    ret.append(element_result)".to_string(),
                "return ret".to_string(),
            ]),
            None => Ok(vec!["return result".to_string()]),
        }
    }

    fn host_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("object {}", ctx.argname))
    }

    fn native_signature(&self, ctx: &ConversionContext<'_>) -> Result<String, ConversionError> {
        Ok(format!("cdef {}", native_type(ctx.tname(), ctx.registry)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;
    use crate::config::Configuration;
    use crate::conversion::{create_type_converter, BoundConverter};
    use crate::registry::TypeRegistry;

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.add_class("A");
        registry.add_enum("Color");
        registry.add_typedef("real", "double");
        registry.add_typedef("APtr", "A *");
        registry
    }

    fn bind<'a>(
        registry: &'a TypeRegistry,
        config: &'a Configuration,
        params: &'a [Param],
        index: usize,
    ) -> BoundConverter<'a> {
        let ctx = crate::conversion::ConversionContext::param(
            registry,
            params,
            index,
            &params[index].name,
        );
        create_type_converter(ctx, config).unwrap()
    }

    #[test]
    fn test_array_with_length() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("a", "double *"), Param::new("aSize", "unsigned int")];
        let conv = bind(&registry, &config, &params, 0);

        assert_eq!(conv.params_consumed(), 2);
        assert_eq!(conv.host_signature().unwrap(), "np.ndarray[double, ndim=1] a");
        assert_eq!(conv.call_arguments().unwrap(), vec!["&a[0]", "a.shape[0]"]);
        assert!(conv.source_to_native().unwrap().is_empty());

        let mut includes = Includes::new();
        conv.register_includes(&mut includes).unwrap();
        assert!(includes.numpy);
    }

    #[test]
    fn test_array_requires_integer_length() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("a", "double *"), Param::new("b", "double")];
        assert_eq!(bind(&registry, &config, &params, 0).name(), "AutomaticPointerConverter");
    }

    #[test]
    fn test_automatic() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("myField", "double"), Param::new("x", "real")];

        let conv = bind(&registry, &config, &params, 0);
        assert_eq!(
            conv.source_to_native().unwrap(),
            vec!["cdef double cpp_myField = myField"]
        );
        assert_eq!(conv.host_signature().unwrap(), "double myField");

        let conv = bind(&registry, &config, &params, 1);
        assert_eq!(conv.host_signature().unwrap(), "cpp.real x");
        assert_eq!(conv.native_signature().unwrap(), "cdef cpp.real");
    }

    #[test]
    fn test_automatic_pointer() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("a", "int *")];
        let conv = bind(&registry, &config, &params, 0);
        assert_eq!(conv.source_to_native().unwrap(), vec!["cdef int * cpp_a = &a"]);
        assert_eq!(conv.host_signature().unwrap(), "int a");
        assert!(conv.return_conversion(false).is_err());
    }

    #[test]
    fn test_enum() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("c", "Color")];
        let conv = bind(&registry, &config, &params, 0);
        assert_eq!(conv.host_signature().unwrap(), "cpp.Color c");
        assert_eq!(conv.call_arguments().unwrap(), vec!["c"]);
        assert_eq!(conv.return_conversion(false).unwrap(), vec!["return result"]);
    }

    #[test]
    fn test_class_by_value() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("a", "A")];
        let conv = bind(&registry, &config, &params, 0);

        assert_eq!(conv.host_signature().unwrap(), "A a");
        assert_eq!(
            conv.source_to_native().unwrap(),
            vec!["cdef cpp.A * cpp_a = a.thisptr"]
        );
        assert_eq!(conv.call_arguments().unwrap(), vec!["deref(cpp_a)"]);
        assert_eq!(
            conv.return_conversion(false).unwrap(),
            vec![
                "cdef A ret = A.__new__(A)",
                "ret.thisptr = new cpp.A(result)",
                "return ret"
            ]
        );

        let mut includes = Includes::new();
        conv.register_includes(&mut includes).unwrap();
        assert!(includes.deref);
    }

    #[test]
    fn test_class_by_pointer_alias() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("a", "A *"), Param::new("b", "APtr")];

        let conv = bind(&registry, &config, &params, 0);
        assert_eq!(conv.call_arguments().unwrap(), vec!["cpp_a"]);
        assert_eq!(conv.native_signature().unwrap(), "cdef cpp.A *");
        let copy = conv.return_conversion(false).unwrap();
        let alias = conv.return_conversion(true).unwrap();
        assert!(!copy.contains(&"ret.delete_thisptr = False".to_string()));
        assert!(alias.contains(&"ret.delete_thisptr = False".to_string()));

        let conv = bind(&registry, &config, &params, 1);
        assert_eq!(conv.name(), "ClassByPointerConverter");
        assert_eq!(conv.host_signature().unwrap(), "A b");
    }

    #[test]
    fn test_stl() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![
            Param::new("v", "vector[double]"),
            Param::new("m", "map[string, Color]"),
        ];

        let conv = bind(&registry, &config, &params, 0);
        assert_eq!(conv.host_signature().unwrap(), "object v");
        assert_eq!(
            conv.source_to_native().unwrap(),
            vec!["cdef vector[double] cpp_v = v"]
        );

        let conv = bind(&registry, &config, &params, 1);
        assert_eq!(conv.native_signature().unwrap(), "cdef map[string, cpp.Color]");
        let mut includes = Includes::new();
        conv.register_includes(&mut includes).unwrap();
        assert!(includes.uses("map"));
        assert!(includes.uses("string"));
    }

    #[test]
    fn test_stl_vector_of_class() {
        let registry = registry();
        let config = Configuration::new();
        let params = vec![Param::new("items", "vector[A]")];
        let conv = bind(&registry, &config, &params, 0);

        assert_eq!(
            conv.source_to_native().unwrap(),
            vec![
                "cdef vector[cpp.A] cpp_items",
                "cdef A value_items",
                "for value_items in items:",
                "    cpp_items.push_back(deref(value_items.thisptr))",
            ]
        );
        let ret = conv.return_conversion(false).unwrap();
        assert_eq!(ret.last().unwrap(), "return ret");
        assert!(ret.contains(&"    element_result.thisptr = new cpp.A(result[i_result])".to_string()));

        let mut includes = Includes::new();
        conv.register_includes(&mut includes).unwrap();
        assert!(includes.deref);
        assert!(includes.uses("vector"));
    }

    #[test]
    fn test_void_return() {
        let registry = registry();
        let config = Configuration::new();
        let ctx = crate::conversion::ConversionContext::value(&registry, Some("void"), "result");
        let conv = create_type_converter(ctx, &config).unwrap();
        assert_eq!(conv.name(), "VoidConverter");
        assert!(conv.return_conversion(false).unwrap().is_empty());
        assert!(conv.call_arguments().is_err());
    }
}
