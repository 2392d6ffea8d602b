use std::collections::HashMap;
use std::mem;

use crate::error::ResolveError;
use crate::expr::{Expr, NodeId};
use crate::stmt::{FunData, Stmt};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Single pre-execution pass over the statement list. Produces a side
/// table mapping every variable-use node to the number of environment
/// frames the evaluator must walk to find its binding; nodes absent from
/// the table are global.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_class: ClassType,
    locals: HashMap<NodeId, usize>,
    errors: Vec<ResolveError>,
}

impl Resolver {
    pub fn new() -> Self {
        Resolver {
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            locals: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, statements: &[Stmt]) -> (HashMap<NodeId, usize>, Vec<ResolveError>) {
        self.resolve_stmts(statements);
        (self.locals, self.errors)
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_function(&mut self, function: &FunData, kind: FunctionType) {
        let enclosing_function = mem::replace(&mut self.current_function, kind);

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else { return };

        if scope.contains_key(&name.lexeme) {
            self.errors.push(ResolveError {
                token: name.clone(),
                message: format!("variable with name '{}' already declared in this scope", name.lexeme),
            });
        }
        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, id: NodeId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.locals.insert(id, depth);
                return;
            }
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(data) => {
                self.begin_scope();
                self.resolve_stmts(&data.statements);
                self.end_scope();
            }
            Stmt::Var(data) => {
                self.declare(&data.name);
                if let Some(initializer) = &data.initializer {
                    self.resolve_expr(initializer);
                }
                self.define(&data.name);
            }
            Stmt::Fun(data) => {
                self.declare(&data.name);
                self.define(&data.name);
                self.resolve_function(data, FunctionType::Function);
            }
            Stmt::Expression(data) => self.resolve_expr(&data.expr),
            Stmt::If(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.then_branch);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::Print(data) => self.resolve_expr(&data.expr),
            Stmt::Return(data) => {
                if self.current_function == FunctionType::None {
                    self.errors.push(ResolveError {
                        token: data.keyword.clone(),
                        message: "cannot return outside of a function".to_string(),
                    });
                }

                if let Some(value) = &data.value {
                    if self.current_function == FunctionType::Initializer {
                        self.errors.push(ResolveError {
                            token: data.keyword.clone(),
                            message: "cannot return a value from an initializer".to_string(),
                        });
                    } else {
                        self.resolve_expr(value);
                    }
                }
            }
            Stmt::While(data) => {
                self.resolve_expr(&data.condition);
                self.resolve_stmt(&data.body);
            }
            Stmt::Class(data) => self.resolve_class(data),
        }
    }

    fn resolve_class(&mut self, class: &crate::stmt::ClassData) {
        let enclosing_class = mem::replace(&mut self.current_class, ClassType::Class);

        self.declare(&class.name);
        self.define(&class.name);

        if let Some(superclass) = &class.superclass {
            let Expr::Variable(variable) = superclass else {
                unreachable!("parser only ever builds a Variable superclass expression")
            };

            if class.name.lexeme == variable.name.lexeme {
                self.errors.push(ResolveError {
                    token: variable.name.clone(),
                    message: "a class cannot inherit from itself".to_string(),
                });
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.scopes.last_mut().expect("scope just pushed").insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().expect("scope just pushed").insert("this".to_string(), true);

        for method in &class.methods {
            let kind = if method.name.lexeme == "init" { FunctionType::Initializer } else { FunctionType::Method };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if class.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    /// An anonymous function resolves like a named one, minus declaring a
    /// name in the enclosing scope: `return` becomes legal inside it, and
    /// its parameters get their own scope around the body.
    fn resolve_lambda(&mut self, lambda: &crate::expr::FunctionData) {
        let enclosing_function = mem::replace(&mut self.current_function, FunctionType::Function);

        self.begin_scope();
        for param in &lambda.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&lambda.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        self.errors.push(ResolveError {
                            token: data.name.clone(),
                            message: "cannot read local variable in its own initializer".to_string(),
                        });
                    }
                }
                self.resolve_local(data.id, &data.name);
            }
            Expr::Assign(data) => {
                self.resolve_expr(&data.value);
                self.resolve_local(data.id, &data.name);
            }
            Expr::Literal(_) => {}
            Expr::Logical(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Unary(data) => self.resolve_expr(&data.expr),
            Expr::Binary(data) => {
                self.resolve_expr(&data.left);
                self.resolve_expr(&data.right);
            }
            Expr::Grouping(data) => self.resolve_expr(&data.expr),
            Expr::Call(data) => {
                self.resolve_expr(&data.callee);
                for argument in &data.arguments {
                    self.resolve_expr(argument);
                }
            }
            Expr::Get(data) => self.resolve_expr(&data.object),
            Expr::Set(data) => {
                self.resolve_expr(&data.value);
                self.resolve_expr(&data.object);
            }
            Expr::This(data) => {
                if self.current_class == ClassType::None {
                    self.errors.push(ResolveError {
                        token: data.keyword.clone(),
                        message: "cannot use 'this' outside of a class".to_string(),
                    });
                    return;
                }
                self.resolve_local(data.id, &data.keyword);
            }
            Expr::Function(data) => self.resolve_lambda(data),
            Expr::Super(data) => {
                match self.current_class {
                    ClassType::Subclass => {}
                    ClassType::None => self.errors.push(ResolveError {
                        token: data.keyword.clone(),
                        message: "cannot use 'super' outside of a class".to_string(),
                    }),
                    ClassType::Class => self.errors.push(ResolveError {
                        token: data.keyword.clone(),
                        message: "cannot use 'super' in a class with no superclass".to_string(),
                    }),
                }
                self.resolve_local(data.id, &data.keyword);
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (HashMap<NodeId, usize>, Vec<ResolveError>) {
        let (tokens, _) = Scanner::new(source).scan_tokens();
        let (stmts, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {parse_errors:?}");
        Resolver::new().resolve(&stmts)
    }

    #[test]
    fn own_initializer_read_is_an_error() {
        let (_, errors) = resolve("{ var a = a; }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("own initializer"));
    }

    #[test]
    fn return_outside_function_is_an_error() {
        let (_, errors) = resolve("return 1;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("outside of a function"));
    }

    #[test]
    fn this_outside_class_is_an_error() {
        let (_, errors) = resolve("print this;");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("outside of a class"));
    }

    #[test]
    fn super_without_superclass_is_an_error() {
        let (_, errors) = resolve("class A { f() { super.f(); } }");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("no superclass"));
    }

    #[test]
    fn block_local_resolves_to_depth_zero() {
        let (locals, errors) = resolve("{ var a = 1; print a; }");
        assert!(errors.is_empty());
        assert_eq!(locals.values().next().copied(), Some(0));
    }
}
