//! Обход дерева объявлений.
//!
//! Обход строго post-order: узел посещает всех своих детей до вызова
//! собственного обработчика, поэтому к моменту `visit_class` результаты
//! для полей, конструкторов и методов уже готовы.
//!
//! ```text
//! enums -> typedefs -> classes (fields, constructors, methods) -> functions -> visit_ast
//! ```

use super::{Ast, Class, Constructor, Enum, Field, Function, Method, Param, Typedef};
use crate::error::WrapResult;

/// Посетитель дерева объявлений.
///
/// Реализации переопределяют только нужные методы; по умолчанию они ничего не делают.
#[allow(unused_variables)]
pub trait Visitor {
    fn visit_enum(&mut self, node: &Enum) -> WrapResult<()> {
        Ok(())
    }

    fn visit_typedef(&mut self, node: &Typedef) -> WrapResult<()> {
        Ok(())
    }

    fn visit_param(&mut self, node: &Param) -> WrapResult<()> {
        Ok(())
    }

    fn visit_field(&mut self, node: &Field) -> WrapResult<()> {
        Ok(())
    }

    fn visit_constructor(&mut self, node: &Constructor) -> WrapResult<()> {
        Ok(())
    }

    fn visit_method(&mut self, node: &Method) -> WrapResult<()> {
        Ok(())
    }

    fn visit_class(&mut self, node: &Class) -> WrapResult<()> {
        Ok(())
    }

    fn visit_function(&mut self, node: &Function) -> WrapResult<()> {
        Ok(())
    }

    /// Вызывается после всех объявлений.
    fn visit_ast(&mut self, ast: &Ast) -> WrapResult<()> {
        Ok(())
    }

    /// Вызывается перед членами специализации шаблонного класса.
    fn enter_specialization(&mut self, node: &Class) -> WrapResult<()> {
        Ok(())
    }

    /// Вызывается после членов специализации, даже если обход завершился ошибкой.
    fn leave_specialization(&mut self, node: &Class) {}
}

/// Обойти всё дерево.
pub fn walk_ast<V: Visitor + ?Sized>(visitor: &mut V, ast: &Ast) -> WrapResult<()> {
    for node in &ast.enums {
        visitor.visit_enum(node)?;
    }
    for node in &ast.typedefs {
        visitor.visit_typedef(node)?;
    }
    for node in &ast.classes {
        walk_class(visitor, node)?;
    }
    for node in &ast.functions {
        walk_function(visitor, node)?;
    }
    visitor.visit_ast(ast)
}

/// Обойти класс: поля, конструкторы, методы, затем сам класс.
pub fn walk_class<V: Visitor + ?Sized>(visitor: &mut V, class: &Class) -> WrapResult<()> {
    if class.specialization.is_none() {
        return walk_class_members(visitor, class);
    }

    visitor.enter_specialization(class)?;
    let result = walk_class_members(visitor, class);
    visitor.leave_specialization(class);
    result
}

fn walk_class_members<V: Visitor + ?Sized>(visitor: &mut V, class: &Class) -> WrapResult<()> {
    for field in &class.fields {
        visitor.visit_field(field)?;
    }
    for ctor in &class.constructors {
        for param in &ctor.params {
            visitor.visit_param(param)?;
        }
        visitor.visit_constructor(ctor)?;
    }
    for method in &class.methods {
        for param in &method.params {
            visitor.visit_param(param)?;
        }
        visitor.visit_method(method)?;
    }
    visitor.visit_class(class)
}

/// Обойти свободную функцию.
pub fn walk_function<V: Visitor + ?Sized>(visitor: &mut V, function: &Function) -> WrapResult<()> {
    for param in &function.params {
        visitor.visit_param(param)?;
    }
    visitor.visit_function(function)
}
