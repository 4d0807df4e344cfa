use crate::error::Span;

/// Declared types are advisory; only `int` is checked, and only when a
/// variable is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    Int,
    String,
    Void,
}

impl TypeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::Int => "int",
            TypeName::String => "string",
            TypeName::Void => "void",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclTarget {
    /// The scope the declaration is evaluated in.
    Current,
    /// Always the root scope, even inside a function body.
    Global,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeName,
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: TypeName,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        ty: TypeName,
        name: String,
        initializer: Expr,
        target: DeclTarget,
        span: Span,
        line: usize,
    },
    Assign {
        name: String,
        value: Expr,
        span: Span,
        line: usize,
    },
    /// Marker left behind once a function definition has been registered.
    FunctionDef {
        name: String,
        span: Span,
    },
    ArrayDecl {
        name: String,
        size: Expr,
        span: Span,
        line: usize,
    },
    ArraySet {
        name: String,
        index: Expr,
        value: Expr,
        span: Span,
        line: usize,
    },
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
    Print {
        expr: Expr,
        span: Span,
    },
    Fox {
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    /// A bare call used as a statement.
    Expression {
        expr: Expr,
        span: Span,
    },
    /// Marker left behind once an included file has been processed.
    Include {
        path: String,
        span: Span,
    },
}

impl Stmt {
    /// Declarations are the statements an included file is allowed to run.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Stmt::VarDecl { .. }
                | Stmt::ArrayDecl { .. }
                | Stmt::FunctionDef { .. }
                | Stmt::Include { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum Expr {
    Number {
        text: String,
        span: Span,
    },
    Str {
        text: String,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
        line: usize,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
        span: Span,
    },
    Compare {
        left: Box<Expr>,
        operator: CompareOp,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
        line: usize,
    },
    ArrayGet {
        name: String,
        index: Box<Expr>,
        span: Span,
        line: usize,
    },
    ArraySize {
        name: String,
        span: Span,
    },
    Input {
        span: Span,
        line: usize,
    },
    Round {
        expr: Box<Expr>,
        span: Span,
    },
    Random {
        span: Span,
    },
    Fox {
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Number { span, .. } => span,
            Expr::Str { span, .. } => span,
            Expr::Variable { span, .. } => span,
            Expr::Binary { span, .. } => span,
            Expr::Compare { span, .. } => span,
            Expr::Call { span, .. } => span,
            Expr::ArrayGet { span, .. } => span,
            Expr::ArraySize { span, .. } => span,
            Expr::Input { span, .. } => span,
            Expr::Round { span, .. } => span,
            Expr::Random { span } => span,
            Expr::Fox { span } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    Greater,
}
