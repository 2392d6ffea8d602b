use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::Class;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{Expr, NodeId};
use crate::function::{Function, NativeFunction};
use crate::literal::Literal;
use crate::object::{Callable, Object};
use crate::stmt::{FunData, Stmt};
use crate::token::{Token, Type};

/// Threaded through statement execution instead of a native panic/exception
/// for `return` unwinding: `Return` carries the value up to the nearest
/// call boundary; every intermediate `Block`/`If`/`While` propagates it.
#[derive(Debug, Clone)]
pub enum Signal {
    Normal,
    Return(Object),
}

/// Tree-walking evaluator. Holds the global frame, the current frame, and
/// the resolver's depth side-table. `stdout` is the sink `print` writes to
/// — the same byte stream the driver uses for diagnostics, so tests can
/// observe both interleaved in program order.
pub struct Interpreter<'a> {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<NodeId, usize>,
    stdout: &'a mut dyn Write,
}

impl<'a> Interpreter<'a> {
    pub fn new(locals: HashMap<NodeId, usize>, stdout: &'a mut dyn Write) -> Self {
        Self::with_globals(locals, stdout, Self::globals_with_natives())
    }

    /// Builds an interpreter sharing an existing global frame, so a driver
    /// can keep variables defined in one REPL line visible to the next.
    pub fn with_globals(
        locals: HashMap<NodeId, usize>,
        stdout: &'a mut dyn Write,
        globals: Rc<RefCell<Environment>>,
    ) -> Self {
        Interpreter { environment: Rc::clone(&globals), globals, locals, stdout }
    }

    /// A fresh global frame with the natives pre-installed.
    pub fn globals_with_natives() -> Rc<RefCell<Environment>> {
        let globals = Rc::new(RefCell::new(Environment::new(None)));
        for native in NativeFunction::globals() {
            globals.borrow_mut().define(&native.name.lexeme.clone(), Object::from(native));
        }
        globals
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Signal, RuntimeError> {
        match stmt {
            Stmt::Expression(data) => {
                self.evaluate(&data.expr)?;
                Ok(Signal::Normal)
            }
            Stmt::Print(data) => {
                let value = self.evaluate(&data.expr)?;
                let _ = writeln!(self.stdout, "{value}");
                Ok(Signal::Normal)
            }
            Stmt::Var(data) => {
                let value = match &data.initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::nil(),
                };
                self.environment.borrow_mut().define(&data.name.lexeme, value);
                Ok(Signal::Normal)
            }
            Stmt::Block(data) => {
                let environment = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
                self.execute_block(&data.statements, environment)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Signal::Normal)
                }
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    match self.execute(&data.body)? {
                        Signal::Normal => {}
                        signal => return Ok(signal),
                    }
                }
                Ok(Signal::Normal)
            }
            Stmt::Fun(data) => {
                let function = Function::new(Rc::new(data.clone()), Rc::clone(&self.environment), false);
                self.environment.borrow_mut().define(&data.name.lexeme, Object::from(function));
                Ok(Signal::Normal)
            }
            Stmt::Return(data) => {
                let value = match &data.value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Object::nil(),
                };
                Ok(Signal::Return(value))
            }
            Stmt::Class(data) => self.execute_class(data),
        }
    }

    /// Runs `statements` in a fresh frame enclosing `environment`'s parent,
    /// restoring the previous frame on every exit path: normal completion,
    /// an early `Return`, or a propagated error.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<Signal, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(Signal::Normal);
        for statement in statements {
            match self.execute(statement) {
                Ok(Signal::Normal) => continue,
                other => {
                    result = other;
                    break;
                }
            }
        }

        self.environment = previous;
        result
    }

    fn execute_class(&mut self, data: &crate::stmt::ClassData) -> Result<Signal, RuntimeError> {
        let superclass = match &data.superclass {
            Some(expr) => {
                let value = self.evaluate(expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(variable) = expr else {
                            unreachable!("parser only ever builds a Variable superclass expression")
                        };
                        return Err(RuntimeError::new(variable.name.clone(), "superclass must be a class"));
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&data.name.lexeme, Object::nil());

        let previous_environment = superclass.as_ref().map(|superclass| {
            let enclosing = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
            enclosing.borrow_mut().define("super", Object::Class(Rc::clone(superclass)));
            std::mem::replace(&mut self.environment, enclosing)
        });

        let mut methods = HashMap::new();
        for method in &data.methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Function::new(Rc::new(method.clone()), Rc::clone(&self.environment), is_initializer);
            methods.insert(method.name.lexeme.clone(), function);
        }

        if let Some(previous_environment) = previous_environment {
            self.environment = previous_environment;
        }

        let class = Rc::new(RefCell::new(Class::new(data.name.lexeme.clone(), superclass, methods)));
        self.environment.borrow_mut().assign(&data.name, Object::Class(class))?;

        Ok(Signal::Normal)
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Object, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(Object::Literal(literal.clone())),
            Expr::Grouping(data) => self.evaluate(&data.expr),
            Expr::Unary(data) => self.evaluate_unary(data),
            Expr::Binary(data) => self.evaluate_binary(data),
            Expr::Logical(data) => self.evaluate_logical(data),
            Expr::Variable(data) => self.look_up_variable(data.id, &data.name),
            Expr::Assign(data) => self.evaluate_assign(data),
            Expr::Call(data) => self.evaluate_call(data),
            Expr::Get(data) => self.evaluate_get(data),
            Expr::Set(data) => self.evaluate_set(data),
            Expr::This(data) => self.look_up_variable(data.id, &data.keyword),
            Expr::Super(data) => self.evaluate_super(data),
            Expr::Function(data) => Ok(self.evaluate_lambda(data)),
        }
    }

    /// An anonymous function captures the environment live at the point it
    /// is evaluated, same as a `fun` declaration captures the environment
    /// live at the point it is executed.
    fn evaluate_lambda(&mut self, data: &crate::expr::FunctionData) -> Object {
        let declaration = Rc::new(FunData {
            name: Token::from_identifier("anonymous"),
            params: data.params.clone(),
            body: data.body.clone(),
        });
        Object::from(Function::new(declaration, Rc::clone(&self.environment), false))
    }

    fn evaluate_unary(&mut self, data: &crate::expr::UnaryData) -> Result<Object, RuntimeError> {
        let right = self.evaluate(&data.expr)?;

        match data.operator.r#type {
            Type::Minus => Ok(Object::from(-check_number(&right, &data.operator)?)),
            Type::Bang => Ok(Object::from(!right.is_truthy())),
            _ => unreachable!("parser never emits other unary operators"),
        }
    }

    fn evaluate_binary(&mut self, data: &crate::expr::BinaryData) -> Result<Object, RuntimeError> {
        let left = self.evaluate(&data.left)?;
        let right = self.evaluate(&data.right)?;
        let op = &data.operator;

        match op.r#type {
            Type::BangEqual => Ok(Object::from(left != right)),
            Type::EqualEqual => Ok(Object::from(left == right)),
            Type::Greater => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l > r))
            }
            Type::GreaterEqual => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l >= r))
            }
            Type::Less => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l < r))
            }
            Type::LessEqual => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l <= r))
            }
            Type::Minus => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l - r))
            }
            Type::Slash => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l / r))
            }
            Type::Star => {
                let (l, r) = check_numbers(&left, &right, op)?;
                Ok(Object::from(l * r))
            }
            Type::Plus => match (&left, &right) {
                (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => Ok(Object::from(l + r)),
                (Object::Literal(Literal::String(l)), Object::Literal(Literal::String(r))) => {
                    Ok(Object::from(format!("{l}{r}")))
                }
                _ => Err(RuntimeError::new(op.clone(), "operands must be two numbers or two strings")),
            },
            _ => unreachable!("parser never emits other binary operators"),
        }
    }

    fn evaluate_logical(&mut self, data: &crate::expr::LogicalData) -> Result<Object, RuntimeError> {
        let left = self.evaluate(&data.left)?;

        match data.operator.r#type {
            Type::Or if left.is_truthy() => Ok(left),
            Type::And if !left.is_truthy() => Ok(left),
            _ => self.evaluate(&data.right),
        }
    }

    fn evaluate_assign(&mut self, data: &crate::expr::AssignData) -> Result<Object, RuntimeError> {
        let value = self.evaluate(&data.value)?;

        match self.locals.get(&data.id) {
            Some(&depth) => Environment::assign_at(&self.environment, depth, &data.name, value.clone()),
            None => self.globals.borrow_mut().assign(&data.name, value.clone())?,
        }

        Ok(value)
    }

    fn evaluate_call(&mut self, data: &crate::expr::CallData) -> Result<Object, RuntimeError> {
        let callee = self.evaluate(&data.callee)?;

        let mut arguments = Vec::with_capacity(data.arguments.len());
        for argument in &data.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        self.call_value(callee, &data.paren, arguments)
    }

    fn call_value(&mut self, callee: Object, paren: &Token, arguments: Vec<Object>) -> Result<Object, RuntimeError> {
        let arity = match &callee {
            Object::Function(function) => function.arity(),
            Object::NativeFunction(function) => function.arity(),
            Object::Class(class) => class.borrow().arity(),
            _ => return Err(RuntimeError::new(paren.clone(), "can only call functions and classes")),
        };

        if arguments.len() != arity {
            return Err(RuntimeError::new(
                paren.clone(),
                format!("expected {arity} arguments but got {}", arguments.len()),
            ));
        }

        match callee {
            Object::Function(function) => function.call(self, arguments),
            Object::NativeFunction(function) => function.call(self, arguments),
            Object::Class(class) => Class::instantiate(&class, self, arguments),
            _ => unreachable!("checked above"),
        }
    }

    fn evaluate_get(&mut self, data: &crate::expr::GetData) -> Result<Object, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match &object {
            Object::Instance(instance) => instance.borrow().get(&data.name, &object),
            _ => Err(RuntimeError::new(data.name.clone(), "only instances have properties")),
        }
    }

    fn evaluate_set(&mut self, data: &crate::expr::SetData) -> Result<Object, RuntimeError> {
        let object = self.evaluate(&data.object)?;

        match object {
            Object::Instance(instance) => {
                let value = self.evaluate(&data.value)?;
                instance.borrow_mut().set(&data.name, value.clone());
                Ok(value)
            }
            _ => Err(RuntimeError::new(data.name.clone(), "only instances have fields")),
        }
    }

    fn evaluate_super(&mut self, data: &crate::expr::SuperData) -> Result<Object, RuntimeError> {
        let distance = *self
            .locals
            .get(&data.id)
            .expect("resolver resolves every 'super' use to a depth");

        let superclass = Environment::get_at(&self.environment, distance, "super");
        let receiver = Environment::get_at(&self.environment, distance - 1, "this");

        let Object::Class(superclass) = superclass else {
            unreachable!("resolver only ever binds 'super' to a class value")
        };

        let method = superclass
            .borrow()
            .find_method(&data.method.lexeme)
            .ok_or_else(|| RuntimeError::new(data.method.clone(), format!("undefined property '{}'", data.method.lexeme)))?;

        Ok(Object::from(method.bind(receiver)))
    }

    fn look_up_variable(&self, id: NodeId, name: &Token) -> Result<Object, RuntimeError> {
        match self.locals.get(&id) {
            Some(&depth) => Ok(Environment::get_at(&self.environment, depth, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }
}

fn check_number(operand: &Object, operator: &Token) -> Result<f64, RuntimeError> {
    match operand {
        Object::Literal(Literal::Number(n)) => Ok(*n),
        _ => Err(RuntimeError::new(operator.clone(), "operand must be a number")),
    }
}

fn check_numbers(left: &Object, right: &Object, operator: &Token) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Object::Literal(Literal::Number(l)), Object::Literal(Literal::Number(r))) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(operator.clone(), "operands must be numbers")),
    }
}
