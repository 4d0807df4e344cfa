// Parser and lexer robustness tests for FoxLang
//
// Table-driven suites that lex and parse whole inputs without evaluating
// them, checking both what must parse and the messages of what must not.

use foxlang::ast::{FunctionDef, Stmt};
use foxlang::error::{ErrorKind, FoxError};
use foxlang::lexer::{Lexer, Token, TokenType};
use foxlang::parser::{ParseHooks, Parser};

/// Parse-time effects recorded instead of performed.
#[derive(Default)]
struct RecordingHooks {
    functions: Vec<FunctionDef>,
    includes: Vec<String>,
}

impl ParseHooks for RecordingHooks {
    fn define_function(&mut self, def: FunctionDef) -> Result<(), FoxError> {
        self.functions.push(def);
        Ok(())
    }

    fn include(&mut self, path: &str, _token: &Token) -> Result<(), FoxError> {
        self.includes.push(path.to_string());
        Ok(())
    }
}

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    /// Run all tests in this suite, returning the names of the ones that
    /// did not pass.
    pub fn run(&self) -> Vec<String> {
        println!("Running test suite: {}", self.name);
        let mut failures = Vec::new();

        for test in &self.tests {
            match run_single_test(test) {
                TestResult::Pass => println!("  ok   {}", test.name),
                TestResult::Fail(msg) => {
                    println!("  FAIL {}: {}", test.name, msg);
                    failures.push(format!("{}/{}", self.name, test.name));
                }
                TestResult::Crash(msg) => {
                    println!("  CRASH {}: {}", test.name, msg);
                    failures.push(format!("{}/{}", self.name, test.name));
                }
            }
        }

        failures
    }
}

fn run_single_test(test: &TestCase) -> TestResult {
    // Catch any panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input).map(|_| ()));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(()), true) => TestResult::Pass,
            (Ok(()), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => match &test.expected_error_contains {
                Some(expected) if !error.message.contains(expected.as_str()) => {
                    TestResult::Fail(format!(
                        "Error message '{}' doesn't contain expected text '{}'",
                        error.message, expected
                    ))
                }
                _ => TestResult::Pass,
            },
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn parse_input(input: &str) -> Result<Vec<Stmt>, FoxError> {
    let tokens = Lexer::new(input).scan_tokens()?;
    let mut parser = Parser::new(tokens);
    parser.parse_all(&mut RecordingHooks::default())
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_malformed_expression_tests() -> TestSuite {
    let mut suite = TestSuite::new("Malformed Expressions");

    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_opening_paren",
        "print((1 + 2);",
        "Expected ')' after print argument",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unmatched_closing_paren",
        "print(1 + 2));",
        "Expected ';' after print",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "empty_print",
        "print();",
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_right_operand",
        "print(1 + );",
        "Expected expression, found ')'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "chained_comparison",
        "print(1 == 2 == 3);",
        "Expected ')' after print argument",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "return_at_eof",
        "return",
        "found end of input",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "input_with_argument",
        "print(input(1));",
        "it takes no arguments",
    ));
    suite.add_test(TestCase::should_fail("double_star", "print(2 * * 3);"));

    suite
}

fn create_statement_tests() -> TestSuite {
    let mut suite = TestSuite::new("Statements");

    suite.add_test(TestCase::should_fail_with_message(
        "declaration_missing_semicolon",
        "int x = 5",
        "Expected ';' after variable declaration, found end of input",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "declaration_missing_equals",
        "int x 5;",
        "Expected '=' in variable declaration",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "bare_name",
        "x;",
        "Unknown statement starting with 'x'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "bare_expression",
        "1 + 2;",
        "Unknown statement starting with '1'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "get_as_statement",
        "get(a, 1);",
        "Unknown statement starting with 'get'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "global_without_type",
        "global x = 1;",
        "Expected 'int' or 'string' after 'global'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "array_without_size",
        "array a;",
        "Expected expression, found ';'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "set_missing_value",
        "set(a, 1);",
        "Expected ',' after index",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "include_unquoted",
        "include(lib);",
        "Expected a quoted file name in include",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "parameter_without_type",
        "int f(int a, b) { return a; }",
        "Expected parameter type",
    ));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow");

    suite.add_test(TestCase::should_succeed(
        "valid_if",
        "if (1 == 1) { print(1); }",
    ));
    suite.add_test(TestCase::should_succeed(
        "if_else_if_chain",
        "if (x == 1) { print(1); } else if (x > 1) { print(2); } else { print(3); }",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "if_without_braces",
        "if (1) print(1);",
        "Expected '{' before block",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unclosed_block",
        "if (1 == 1) { print(1); ",
        "Expected '}' after block",
    ));
    suite.add_test(TestCase::should_succeed(
        "valid_while",
        "while (i < 3) { i = i + 1; }",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "while_missing_paren",
        "while i < 3 { i = i + 1; }",
        "Expected '(' after 'while'",
    ));
    suite.add_test(TestCase::should_fail("while_missing_body", "while (1)"));
    suite.add_test(TestCase::should_succeed(
        "return_without_value",
        "void f() { return; }",
    ));

    suite
}

fn create_positive_tests() -> TestSuite {
    let mut suite = TestSuite::new("Positive Tests");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_succeed("only_comments", "// nothing\n// here\n"));
    suite.add_test(TestCase::should_succeed(
        "declaration_and_print",
        "int x = 5; print(x + 3);",
    ));
    suite.add_test(TestCase::should_succeed(
        "string_declaration",
        "string s = \"hello world\";",
    ));
    suite.add_test(TestCase::should_succeed(
        "global_declaration",
        "global int g = 1;",
    ));
    suite.add_test(TestCase::should_succeed(
        "typed_function",
        "int square(int n) { return n * n; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "void_function_and_call",
        "void hello(string who) { print(\"hi \" + who); } hello(\"fox\");",
    ));
    suite.add_test(TestCase::should_succeed(
        "arrays",
        "array a 10; set(a, 0, 5); print(get(a, 0) + size(a));",
    ));
    suite.add_test(TestCase::should_succeed("builtins", "print(round(2.5) + random());"));
    suite.add_test(TestCase::should_succeed("input", "string name = input();"));
    suite.add_test(TestCase::should_succeed("fox_statement", "fox();"));
    suite.add_test(TestCase::should_succeed("fox_expression", "print(fox());"));
    suite.add_test(TestCase::should_succeed("unary_minus", "print(-5 - -3);"));
    suite.add_test(TestCase::should_succeed("modulo", "print(10 % 3);"));
    suite.add_test(TestCase::should_succeed(
        "comparison_initializer",
        "int t = 1 == 1;",
    ));
    suite.add_test(TestCase::should_succeed("include", "include(\"lib.fox\");"));

    let deep_parens = format!("print({}1{});", "(".repeat(100), ")".repeat(100));
    suite.add_test(TestCase::should_succeed("deeply_nested_parens", &deep_parens));

    suite
}

// ============================================================================
// Main Test Function
// ============================================================================

#[test]
fn comprehensive_parser_tests() {
    let suites = vec![
        create_malformed_expression_tests(),
        create_statement_tests(),
        create_control_flow_tests(),
        create_positive_tests(),
    ];

    let failures: Vec<String> = suites.iter().flat_map(TestSuite::run).collect();
    assert!(failures.is_empty(), "failing parser cases: {:?}", failures);
}

#[test]
fn function_definitions_register_while_parsing() {
    let tokens = Lexer::new("int add(int a, string b) { return a + b; } print(1);")
        .scan_tokens()
        .unwrap();
    let mut parser = Parser::new(tokens);
    let mut hooks = RecordingHooks::default();

    let first = parser.next_statement(&mut hooks).unwrap().unwrap();
    assert!(matches!(first, Stmt::FunctionDef { ref name, .. } if name == "add"));
    assert_eq!(hooks.functions.len(), 1);
    assert_eq!(hooks.functions[0].params.len(), 2);
    assert_eq!(hooks.functions[0].params[1].name, "b");
    assert_eq!(hooks.functions[0].body.len(), 1);

    let second = parser.next_statement(&mut hooks).unwrap().unwrap();
    assert!(matches!(second, Stmt::Print { .. }));
    assert!(parser.next_statement(&mut hooks).unwrap().is_none());
}

#[test]
fn includes_are_processed_inside_blocks() {
    let tokens = Lexer::new("if (1 == 1) { include(\"inner.fox\"); }")
        .scan_tokens()
        .unwrap();
    let mut hooks = RecordingHooks::default();
    Parser::new(tokens).parse_all(&mut hooks).unwrap();
    assert_eq!(hooks.includes, vec!["inner.fox".to_string()]);
}

#[test]
fn lexer_recognizes_keywords_and_identifiers() {
    let tokens = Lexer::new("print input round random fox int string void while if else array set get size include return global get_x _tmp x1")
        .scan_tokens()
        .unwrap();
    let types: Vec<TokenType> = tokens.iter().map(|t| t.token_type).collect();

    assert_eq!(
        types,
        vec![
            TokenType::Print,
            TokenType::Input,
            TokenType::Round,
            TokenType::Random,
            TokenType::Fox,
            TokenType::Int,
            TokenType::StringType,
            TokenType::Void,
            TokenType::While,
            TokenType::If,
            TokenType::Else,
            TokenType::Array,
            TokenType::Set,
            TokenType::Get,
            TokenType::Size,
            TokenType::Include,
            TokenType::Return,
            TokenType::Global,
            TokenType::Identifier,
            TokenType::Identifier,
            TokenType::Identifier,
            TokenType::Eof,
        ]
    );
}

#[test]
fn lexer_reads_operators_and_literals() {
    let tokens = Lexer::new("a == b != c = 3.25 + \"x // not a comment\" % 7.")
        .scan_tokens()
        .unwrap();
    let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();

    assert_eq!(
        lexemes,
        vec!["a", "==", "b", "!=", "c", "=", "3.25", "+", "x // not a comment", "%", "7.", ""]
    );
    assert_eq!(tokens[8].token_type, TokenType::String);
    assert_eq!(tokens[10].token_type, TokenType::Number);
}

#[test]
fn lexer_tracks_lines_and_skips_comments() {
    let tokens = Lexer::new("// header\nint x = 1; // trailing\n\nprint(x);")
        .scan_tokens()
        .unwrap();

    assert_eq!(tokens[0].lexeme, "int");
    assert_eq!(tokens[0].line, 2);
    let print = tokens.iter().find(|t| t.token_type == TokenType::Print).unwrap();
    assert_eq!(print.line, 4);
}

#[test]
fn lexer_rejects_unknown_characters_with_line() {
    let error = Lexer::new("int x = 1;\nint y = x @ 2;").scan_tokens().unwrap_err();
    assert_eq!(error.kind, ErrorKind::Lex);
    assert_eq!(error.line, 2);
    assert!(error.message.contains("'@'"));

    let bang = Lexer::new("print(!x);").scan_tokens().unwrap_err();
    assert_eq!(bang.kind, ErrorKind::Lex);
}

#[test]
fn lexer_rejects_unterminated_string() {
    let error = Lexer::new("print(\"oops);").scan_tokens().unwrap_err();
    assert_eq!(error.kind, ErrorKind::Lex);
    assert!(error.message.contains("Unterminated string"));
}

#[test]
fn syntax_errors_carry_the_offending_line() {
    let error = parse_input("int x = 1;\n\nprint(x;").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Syntax);
    assert_eq!(error.line, 3);
}
