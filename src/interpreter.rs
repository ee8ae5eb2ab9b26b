//! Tree-walking evaluator.
//!
//! Owns the global environment, the currently active environment, and the
//! depth map filled in by the resolver.  `run` is the whole pipeline:
//! scan, parse, resolve, evaluate, with each phase suppressed when the
//! previous one reported errors.  The interpreter value is persistent: a
//! REPL keeps one instance alive so globals, recorded depths and the
//! expression-id counter survive between lines.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::environment::Environment;
use crate::error::LoxError;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};
use crate::value::{LoxCallable, LoxClass, LoxFunction, LoxInstance, NativeFn, Value};

/// Non-local control transfer, threaded through every evaluator entry
/// point.  `Return` is raised by a `return` statement and caught exactly
/// at the function call frame that pushed the running body; `Error` is a
/// runtime error unwinding to the top of `run`.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

pub struct Interpreter {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    next_id: usize,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Construct an interpreter writing `print` output to the given sink.
    /// Tests use this to capture program output.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction(NativeFn {
                name: "clock",
                arity: 0,
                func: clock_native,
            }),
        );

        Interpreter {
            environment: globals.clone(),
            globals,
            locals: HashMap::new(),
            next_id: 0,
            output,
        }
    }

    /// Run one source unit through the full pipeline.  Returns every error
    /// the failing phase reported; an empty vector means success.  Global
    /// state mutated by successfully evaluated statements is kept even
    /// when a later statement fails.
    pub fn run(&mut self, source: &str) -> Vec<LoxError> {
        let scanner = Scanner::new(source.as_bytes());

        let mut tokens: Vec<Token> = Vec::new();
        let mut errors: Vec<LoxError> = Vec::new();

        for item in scanner {
            match item {
                Ok(token) => tokens.push(token),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            return errors;
        }

        let mut parser = Parser::new(tokens, self.next_id);
        let statements = parser.parse();
        self.next_id = parser.next_id();

        let errors = parser.take_errors();
        if !errors.is_empty() {
            return errors;
        }

        let mut resolver = Resolver::new(self);
        resolver.resolve(&statements);

        let errors = resolver.take_errors();
        if !errors.is_empty() {
            return errors;
        }

        match self.interpret(&statements) {
            Ok(()) => Vec::new(),
            Err(e) => vec![e],
        }
    }

    /// Resolver callback: record that the expression occurrence `id` binds
    /// `depth` frames up from its evaluation environment.
    pub fn resolve(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), LoxError> {
        info!("Interpreting {} statement(s)", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(Unwind::Error(e)) => return Err(e),

                Err(Unwind::Return(_)) => {
                    unreachable!("top-level 'return' is rejected by the resolver")
                }
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value).map_err(|e| {
                    Unwind::Error(LoxError::runtime(0, format!("Could not write output: {e}.")))
                })?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let env = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(env)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if is_truthy(&self.evaluate(condition)?) {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function =
                    LoxFunction::new(decl.clone(), self.environment.clone(), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value: Value = if let Some(expr) = value {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Unwind> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass_value: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),

                _ => {
                    let line = match expr {
                        Expr::Variable { name, .. } => name.line,
                        _ => name.line,
                    };

                    return Err(LoxError::runtime(line, "Superclass must be a class.").into());
                }
            },

            None => None,
        };

        // Defined as nil first so methods can refer to the class by name;
        // the finished class value is assigned over it below.
        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Nil);

        // Methods close over an environment that binds `super` when there
        // is a superclass, and over the current environment otherwise.
        let method_env: Rc<RefCell<Environment>> = match &superclass_value {
            Some(superclass) => {
                let mut env = Environment::with_enclosing(self.environment.clone());
                env.define("super", Value::Class(superclass.clone()));
                Rc::new(RefCell::new(env))
            }

            None => self.environment.clone(),
        };

        let mut method_map: HashMap<String, Rc<LoxFunction>> = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";

            method_map.insert(
                method.name.lexeme.clone(),
                Rc::new(LoxFunction::new(
                    method.clone(),
                    method_env.clone(),
                    is_initializer,
                )),
            );
        }

        let class = Value::Class(Rc::new(LoxClass {
            name: name.lexeme.clone(),
            superclass: superclass_value,
            methods: method_map,
        }));

        self.environment
            .borrow_mut()
            .assign(&name.lexeme, class, name.line)?;

        Ok(())
    }

    /// Run `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path, including `return` unwinds.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Unwind> {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result: Result<(), Unwind> = Ok(());

        for stmt in statements {
            result = self.execute(stmt);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, Unwind> {
        match expr {
            Expr::Literal(token) => Ok(evaluate_literal(token)),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { op, right } => {
                let right = self.evaluate(right)?;
                self.evaluate_unary(op, right)
            }

            Expr::Binary { left, op, right } => {
                // Strict left-before-right evaluation order.
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.evaluate_binary(left, op, right)
            }

            Expr::Logical { left, op, right } => {
                let left_value = self.evaluate(left)?;

                match op.token_type {
                    TokenType::OR => {
                        if is_truthy(&left_value) {
                            Ok(left_value)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    TokenType::AND => {
                        if !is_truthy(&left_value) {
                            Ok(left_value)
                        } else {
                            self.evaluate(right)
                        }
                    }

                    _ => unreachable!("parser only builds 'and'/'or' logical nodes"),
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(distance) => {
                        self.environment.borrow_mut().assign_at(
                            *distance,
                            &name.lexeme,
                            value.clone(),
                        );
                    }

                    None => {
                        self.globals
                            .borrow_mut()
                            .assign(&name.lexeme, value.clone(), name.line)?;
                    }
                }

                // Assignment is an expression; it yields the stored value.
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_value = self.evaluate(callee)?;

                let mut args: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                let callable: &dyn LoxCallable = match &callee_value {
                    Value::Function(function) => function.as_ref(),
                    Value::Class(class) => class,
                    Value::NativeFunction(native) => native,

                    _ => {
                        return Err(LoxError::runtime(
                            paren.line,
                            "Can only call functions and classes.",
                        )
                        .into())
                    }
                };

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    )
                    .into());
                }

                callable.call(self, args).map_err(Unwind::Error)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    LoxInstance::get(&instance, name).map_err(Unwind::Error)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(&name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
            },

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super { id, method, .. } => {
                let distance = *self
                    .locals
                    .get(id)
                    .unwrap_or_else(|| unreachable!("'super' use was not resolved"));

                let superclass = match self.environment.borrow().get_at(distance, "super") {
                    Value::Class(class) => class,
                    _ => unreachable!("'super' is always bound to a class"),
                };

                // `this` lives in the frame just inside the one holding
                // `super`.
                let instance = match self.environment.borrow().get_at(distance - 1, "this") {
                    Value::Instance(instance) => instance,
                    _ => unreachable!("'this' is always bound to an instance"),
                };

                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                    .into()),
                }
            }
        }
    }

    fn evaluate_unary(&mut self, op: &Token, right: Value) -> Result<Value, Unwind> {
        match op.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(op.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right))),

            _ => unreachable!("parser only builds '!'/'-' unary nodes"),
        }
    }

    fn evaluate_binary(&mut self, left: Value, op: &Token, right: Value) -> Result<Value, Unwind> {
        match op.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::STAR => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            // IEEE-754 semantics: dividing by zero yields an infinity.
            TokenType::SLASH => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            TokenType::LESS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::LESS_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::GREATER => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            TokenType::GREATER_EQUAL => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(LoxError::runtime(op.line, "Operands must be numbers.").into()),
            },

            _ => unreachable!("parser only builds binary operator nodes"),
        }
    }

    /// Depth-mapped occurrences read from the recorded frame; everything
    /// else is a global.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, Unwind> {
        match self.locals.get(&id) {
            Some(distance) => Ok(self.environment.borrow().get_at(*distance, &name.lexeme)),

            None => self
                .globals
                .borrow()
                .get(&name.lexeme, name.line)
                .map_err(Unwind::Error),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate_literal(token: &Token) -> Value {
    match &token.token_type {
        TokenType::NUMBER(n) => Value::Number(*n),

        TokenType::STRING(s) => Value::String(s.clone()),

        TokenType::TRUE => Value::Bool(true),

        TokenType::FALSE => Value::Bool(false),

        TokenType::NIL => Value::Nil,

        _ => unreachable!("parser only builds literal tokens"),
    }
}

/// Only `nil` and `false` are falsy; every other value, including `0` and
/// the empty string, is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,

        Value::Bool(b) => *b,

        _ => true,
    }
}

fn clock_native(_args: &[Value]) -> Result<Value, LoxError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}
