use crate::ast::{BinaryOp, CompareOp, DeclTarget, Expr, FunctionDef, Stmt, TypeName};
use crate::error::{FoxError, Span};
use crate::include;
use crate::lexer::{Lexer, Token};
use crate::parser::{ParseHooks, Parser};
use crate::scope::{ScopeError, ScopeId, Scopes, GLOBAL};
use crate::value::Value;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::io::{self, BufRead, Write};
use std::mem;
use std::path::{Path, PathBuf};

const FOX_BANNER: &str = r"   /\_/\
  ( o.o )   FoxLang
   > ^ <    a tiny scripting language
";

/// What `fox()` evaluates to.
pub const FOX_MARKER: &str = "fox";

const EQUALITY_TOLERANCE: f64 = 0.001;

/// Deepest chain of live function calls before a script is stopped.
pub const MAX_CALL_DEPTH: usize = 20_000;

// Script recursion nests several Rust frames per call, so evaluation moves
// onto a heap-allocated stack segment once the native stack runs low.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Which top-level statements actually run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecPolicy {
    Full,
    /// Used for included files: declarations run, everything else is parsed
    /// and dropped. Only the included file's top-level statements are
    /// filtered. Bodies of functions it defines are never filtered and run
    /// in full, `print` and `return` included, whenever they are called.
    DeclarationsOnly,
}

impl ExecPolicy {
    pub fn permits(&self, stmt: &Stmt) -> bool {
        match self {
            ExecPolicy::Full => true,
            ExecPolicy::DeclarationsOnly => stmt.is_declaration(),
        }
    }
}

/// Result of running a statement: either it finished normally or a `return`
/// is unwinding to the enclosing call.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

pub struct Interpreter {
    scopes: Scopes,
    policy: ExecPolicy,
    current_file: Option<PathBuf>,
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    rng: StdRng,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter on the process console with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self::with_io(io::BufReader::new(io::stdin()), io::stdout())
    }

    pub fn with_io(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            scopes: Scopes::new(),
            policy: ExecPolicy::Full,
            current_file: None,
            input: Box::new(input),
            output: Box::new(output),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn scopes(&self) -> &Scopes {
        &self.scopes
    }

    /// Lexes `source`, then parses and runs it one top-level statement at a
    /// time against the global scope. `path` anchors relative includes.
    pub fn run_source(&mut self, source: &str, path: Option<&Path>) -> Result<(), FoxError> {
        let previous = mem::replace(&mut self.current_file, path.map(Path::to_path_buf));
        let result = self.run_statements(source);
        self.current_file = previous;
        self.flush()?;
        result
    }

    fn run_statements(&mut self, source: &str) -> Result<(), FoxError> {
        let tokens = Lexer::new(source).scan_tokens()?;
        let mut parser = Parser::new(tokens);

        while let Some(stmt) = parser.next_statement(self)? {
            self.execute_top_level(&stmt)?;
        }
        Ok(())
    }

    pub fn execute_top_level(&mut self, stmt: &Stmt) -> Result<(), FoxError> {
        if !self.policy.permits(stmt) {
            return Ok(());
        }
        // A stray top-level `return` just ends its own statement.
        self.execute(stmt)?;
        Ok(())
    }

    fn process_include(&mut self, file: &str, token: &Token) -> Result<(), FoxError> {
        let path = include::resolve(file, self.current_file.as_deref()).ok_or_else(|| {
            FoxError::include(
                token.span.clone(),
                token.line,
                format!("Included file '{}' not found", file),
            )
            .with_help("Includes are looked up next to the including file, then in the working directory.")
        })?;

        let source = fs::read_to_string(&path).map_err(|e| {
            FoxError::include(
                token.span.clone(),
                token.line,
                format!("Could not read '{}': {}", path.display(), e),
            )
        })?;

        // The included file runs against a copy of the global scope whose
        // final state then replaces ours.
        let seeded = Scopes::from_global(self.scopes.global().clone());
        let outer_scopes = mem::replace(&mut self.scopes, seeded);
        let outer_policy = mem::replace(&mut self.policy, ExecPolicy::DeclarationsOnly);
        let outer_file = mem::replace(&mut self.current_file, Some(path.clone()));

        let result = self.run_statements(&source);

        let nested = mem::replace(&mut self.scopes, outer_scopes);
        self.policy = outer_policy;
        self.current_file = outer_file;

        result.map_err(|e| e.in_file(&path.display().to_string(), &source))?;
        self.scopes.replace_global(nested.into_global());
        Ok(())
    }

    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow, FoxError> {
        let scope = self.scopes.current();

        match stmt {
            Stmt::VarDecl {
                ty,
                name,
                initializer,
                target,
                span,
                line,
            } => {
                let value = self.evaluate(initializer)?;
                if *ty == TypeName::Int && !value.parses_as_number() {
                    return Err(FoxError::type_mismatch(
                        span.clone(),
                        *line,
                        format!(
                            "Cannot initialize {} '{}' with \"{}\"",
                            ty.as_str(),
                            name,
                            value
                        ),
                    ));
                }
                let target_scope = match target {
                    DeclTarget::Global => GLOBAL,
                    DeclTarget::Current => scope,
                };
                self.scopes
                    .declare_variable(target_scope, name, value)
                    .map_err(|e| scope_error(e, span, *line, "variable", name))?;
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::Assign {
                name,
                value,
                span,
                line,
            } => {
                let value = self.evaluate(value)?;
                self.scopes
                    .assign_variable(scope, name, value)
                    .map_err(|e| scope_error(e, span, *line, "variable", name))?;
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::FunctionDef { .. } | Stmt::Include { .. } => Ok(Flow::Normal(Value::empty())),
            Stmt::ArrayDecl {
                name,
                size,
                span,
                line,
            } => {
                let size_value = self.evaluate(size)?;
                let len = size_value.to_number().trunc();
                if !size_value.parses_as_number() || len < 0.0 {
                    return Err(FoxError::array_bounds(
                        span.clone(),
                        *line,
                        format!("Invalid size \"{}\" for array '{}'", size_value, name),
                    ));
                }
                self.scopes
                    .declare_array(scope, name, len as usize)
                    .map_err(|e| scope_error(e, span, *line, "array", name))?;
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::ArraySet {
                name,
                index,
                value,
                span,
                line,
            } => {
                let index = self.evaluate(index)?;
                let index = array_index(&index, span, *line)?;
                let value = self.evaluate(value)?;
                self.scopes
                    .array_set(scope, name, index, value)
                    .map_err(|e| scope_error(e, span, *line, "array", name))?;
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute_block(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal(Value::empty()))
                }
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::Block { statements, .. } => self.execute_block(statements),
            Stmt::Print { expr, span } => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value).map_err(|e| io_error(e, span))?;
                Ok(Flow::Normal(Value::empty()))
            }
            Stmt::Fox { span } => Ok(Flow::Normal(self.fox(span)?)),
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::zero(),
                };
                Ok(Flow::Return(value))
            }
            Stmt::Expression { expr, .. } => Ok(Flow::Normal(self.evaluate(expr)?)),
        }
    }

    fn execute_block(&mut self, statements: &[Stmt]) -> Result<Flow, FoxError> {
        for statement in statements {
            if let Flow::Return(value) = self.execute(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal(Value::empty()))
    }

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, FoxError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.evaluate_inner(expr))
    }

    fn evaluate_inner(&mut self, expr: &Expr) -> Result<Value, FoxError> {
        let scope = self.scopes.current();

        match expr {
            Expr::Number { text, .. } | Expr::Str { text, .. } => Ok(Value::new(text.as_str())),
            Expr::Variable { name, span, line } => self
                .scopes
                .variable(scope, name)
                .cloned()
                .ok_or_else(|| FoxError::undefined(span.clone(), *line, "variable", name)),
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(apply_binary(*operator, &left, &right))
            }
            Expr::Compare {
                left,
                operator,
                right,
                ..
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                Ok(apply_compare(*operator, &left, &right))
            }
            Expr::Call {
                name,
                args,
                span,
                line,
            } => self.call_function(name, args, span, *line),
            Expr::ArrayGet {
                name,
                index,
                span,
                line,
            } => {
                let index = self.evaluate(index)?;
                let index = array_index(&index, span, *line)?;
                self.scopes
                    .array_get(scope, name, index)
                    .map_err(|e| scope_error(e, span, *line, "array", name))
            }
            Expr::ArraySize { name, .. } => Ok(self
                .scopes
                .array_len(scope, name)
                .map(|len| Value::new(len.to_string()))
                .unwrap_or_else(Value::zero)),
            Expr::Input { span, .. } => self.read_line(span),
            Expr::Round { expr, .. } => {
                let value = self.evaluate(expr)?;
                Ok(Value::from_number(value.to_number().round()))
            }
            Expr::Random { .. } => {
                let n: u32 = self.rng.gen_range(0..100);
                Ok(Value::new(n.to_string()))
            }
            Expr::Fox { span } => self.fox(span),
        }
    }

    fn call_function(
        &mut self,
        name: &str,
        args: &[Expr],
        span: &Span,
        line: usize,
    ) -> Result<Value, FoxError> {
        let function = self
            .scopes
            .function(self.scopes.current(), name)
            .ok_or_else(|| FoxError::undefined(span.clone(), line, "function", name))?;

        if args.len() != function.params.len() {
            return Err(FoxError::call_arity(
                span.clone(),
                line,
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    name,
                    function.params.len(),
                    args.len()
                ),
            )
            .with_help(format!("'{}' is defined at line {}.", name, function.line)));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg)?);
        }

        if self.scopes.current() >= MAX_CALL_DEPTH {
            return Err(FoxError::call_depth(
                span.clone(),
                line,
                format!(
                    "Call to '{}' exceeds the maximum call depth of {}",
                    name, MAX_CALL_DEPTH
                ),
            )
            .with_help("Check that the recursion has a reachable base case."));
        }

        let frame = self.scopes.push_call();
        let result = self.run_call(&function, frame, values, span, line);
        self.scopes.pop_call();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal(_) => Ok(Value::zero()),
        }
    }

    fn run_call(
        &mut self,
        function: &FunctionDef,
        frame: ScopeId,
        values: Vec<Value>,
        span: &Span,
        line: usize,
    ) -> Result<Flow, FoxError> {
        for (param, value) in function.params.iter().zip(values) {
            self.scopes
                .declare_variable(frame, &param.name, value)
                .map_err(|e| scope_error(e, span, line, "parameter", &param.name))?;
        }
        self.execute_block(&function.body)
    }

    fn read_line(&mut self, span: &Span) -> Result<Value, FoxError> {
        self.output.flush().map_err(|e| io_error(e, span))?;

        let mut line = String::new();
        self.input
            .read_line(&mut line)
            .map_err(|e| io_error(e, span))?;

        let trimmed = line.trim_end_matches(&['\n', '\r'][..]).len();
        line.truncate(trimmed);
        Ok(Value::from(line))
    }

    fn fox(&mut self, span: &Span) -> Result<Value, FoxError> {
        self.output
            .write_all(FOX_BANNER.as_bytes())
            .map_err(|e| io_error(e, span))?;
        Ok(Value::from(FOX_MARKER))
    }

    fn flush(&mut self) -> Result<(), FoxError> {
        self.output
            .flush()
            .map_err(|e| io_error(e, &Span::single(0)))
    }
}

impl ParseHooks for Interpreter {
    fn define_function(&mut self, def: FunctionDef) -> Result<(), FoxError> {
        self.scopes.define_function(GLOBAL, def);
        Ok(())
    }

    fn include(&mut self, path: &str, token: &Token) -> Result<(), FoxError> {
        self.process_include(path, token)
    }
}

/// `+ - * / %` on text values. `+` concatenates when either side is not
/// numeric; everything else works on doubles.
pub fn apply_binary(operator: BinaryOp, left: &Value, right: &Value) -> Value {
    if operator == BinaryOp::Add && (!left.is_numeric() || !right.is_numeric()) {
        return Value::new(format!("{}{}", left, right));
    }

    let l = left.to_number();
    let r = right.to_number();

    let result = match operator {
        BinaryOp::Add => l + r,
        BinaryOp::Subtract => l - r,
        BinaryOp::Multiply => l * r,
        BinaryOp::Divide => {
            if r == 0.0 {
                0.0
            } else {
                l / r
            }
        }
        BinaryOp::Modulo => {
            let (l, r) = (l.trunc() as i64, r.trunc() as i64);
            if r == 0 {
                0.0
            } else {
                l.wrapping_rem(r) as f64
            }
        }
    };

    Value::from_number(result)
}

/// Comparisons yield `1` or `0`. Two numeric operands compare as doubles
/// (equality within 0.001); otherwise the texts are compared.
pub fn apply_compare(operator: CompareOp, left: &Value, right: &Value) -> Value {
    let result = if left.is_numeric() && right.is_numeric() {
        let l = left.to_number();
        let r = right.to_number();
        match operator {
            CompareOp::Equal => (l - r).abs() < EQUALITY_TOLERANCE,
            CompareOp::NotEqual => (l - r).abs() >= EQUALITY_TOLERANCE,
            CompareOp::Less => l < r,
            CompareOp::Greater => l > r,
        }
    } else {
        let l = left.as_str();
        let r = right.as_str();
        match operator {
            CompareOp::Equal => l == r,
            CompareOp::NotEqual => l != r,
            CompareOp::Less => l < r,
            CompareOp::Greater => l > r,
        }
    };

    Value::from_bool(result)
}

fn array_index(index: &Value, span: &Span, line: usize) -> Result<i64, FoxError> {
    if !index.parses_as_number() {
        return Err(FoxError::array_bounds(
            span.clone(),
            line,
            format!("Array index \"{}\" is not a number", index),
        ));
    }
    Ok(index.to_number().trunc() as i64)
}

fn scope_error(error: ScopeError, span: &Span, line: usize, what: &str, name: &str) -> FoxError {
    match error {
        ScopeError::Redeclared => FoxError::redeclaration(span.clone(), line, what, name),
        ScopeError::Undefined => FoxError::undefined(span.clone(), line, what, name),
        ScopeError::OutOfBounds { index, len } => FoxError::array_bounds(
            span.clone(),
            line,
            format!(
                "Index {} is out of bounds for array '{}' of length {}",
                index, name, len
            ),
        )
        .with_help(format!("Valid indices are 0 to {}.", len as i64 - 1)),
    }
}

fn io_error(error: io::Error, span: &Span) -> FoxError {
    FoxError::io(span.clone(), format!("Console I/O failed: {}", error))
}
