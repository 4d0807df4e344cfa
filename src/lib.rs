// FoxLang Interpreter Library
//
// A single-pass interpreter for a small imperative scripting language. Every
// top-level statement is parsed and then run immediately against one global
// scope; block bodies are parsed whole and may run many times.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod include;
pub mod lexer;
pub mod parser;
pub mod runner;
pub mod scope;
pub mod value;

// Re-export commonly used items
pub use ast::{Expr, Stmt};
pub use error::{ErrorKind, FoxError, Span};
pub use evaluator::{ExecPolicy, Flow, Interpreter};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{ParseHooks, Parser};
pub use scope::Scopes;
pub use value::Value;

// Re-export main functions
pub use runner::{run, run_file};
