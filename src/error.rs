use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lex,
    Syntax,
    Redeclaration,
    UndefinedName,
    TypeMismatch,
    ArrayBounds,
    Include,
    CallArity,
    CallDepth,
    Io,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Lex => "Lex",
            ErrorKind::Syntax => "Syntax",
            ErrorKind::Redeclaration => "Redeclaration",
            ErrorKind::UndefinedName => "Undefined name",
            ErrorKind::TypeMismatch => "Type mismatch",
            ErrorKind::ArrayBounds => "Array bounds",
            ErrorKind::Include => "Include",
            ErrorKind::CallArity => "Call arity",
            ErrorKind::CallDepth => "Call depth",
            ErrorKind::Io => "I/O",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::Lex => Color::Red,
            ErrorKind::Syntax => Color::Yellow,
            ErrorKind::Include | ErrorKind::Io => Color::Blue,
            _ => Color::Magenta,
        }
    }
}

/// The file an error was raised in, when it is not the file being reported.
#[derive(Debug, Clone)]
pub struct Origin {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct FoxError {
    pub kind: ErrorKind,
    pub span: Span,
    pub line: usize,
    pub message: String,
    pub help: Option<String>,
    pub origin: Option<Box<Origin>>,
}

impl FoxError {
    pub fn new(kind: ErrorKind, span: Span, line: usize, message: String) -> Self {
        Self {
            kind,
            span,
            line,
            message,
            help: None,
            origin: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Tags the error with the file it came from, unless a nested include
    /// already did.
    pub fn in_file(mut self, name: &str, source: &str) -> Self {
        if self.origin.is_none() {
            self.origin = Some(Box::new(Origin {
                name: name.to_string(),
                source: source.to_string(),
            }));
        }
        self
    }

    pub fn lex(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Lex, span, line, message)
    }

    pub fn syntax(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Syntax, span, line, message)
    }

    pub fn redeclaration(span: Span, line: usize, what: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::Redeclaration,
            span,
            line,
            format!("{} '{}' is already declared in this scope", what, name),
        )
    }

    pub fn undefined(span: Span, line: usize, what: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::UndefinedName,
            span,
            line,
            format!("Undefined {} '{}'", what, name),
        )
    }

    pub fn type_mismatch(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::TypeMismatch, span, line, message)
    }

    pub fn array_bounds(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::ArrayBounds, span, line, message)
    }

    pub fn include(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::Include, span, line, message)
    }

    pub fn call_arity(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::CallArity, span, line, message)
    }

    pub fn call_depth(span: Span, line: usize, message: String) -> Self {
        Self::new(ErrorKind::CallDepth, span, line, message)
    }

    /// Console failures are not tied to a source line.
    pub fn io(span: Span, message: String) -> Self {
        Self::new(ErrorKind::Io, span, 0, message)
    }

    /// Where the error happened, as shown in the headline.
    fn location(&self) -> String {
        match self.kind {
            ErrorKind::Io => String::new(),
            _ => format!(" at line {}", self.line),
        }
    }

    /// Writes a colored report to stderr. `source` and `filename` describe the
    /// top-level script; errors from included files use their own origin.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let (filename, source) = match &self.origin {
            Some(origin) => (origin.name.as_str(), origin.source.as_str()),
            None => (filename.unwrap_or("<script>"), source),
        };

        let color = self.kind.color();
        let title = format!("{} error", self.kind.label());

        // Spans past the end of the text (EOF diagnostics) are clamped so the
        // label still lands on the last character.
        let len = source.chars().count();
        let start = self.span.start.min(len);
        let end = self.span.end.min(len).max(start);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!(
                "{}{}: {}",
                title.fg(color),
                self.location(),
                self.message
            ))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if report_builder
            .finish()
            .eprint((filename, Source::from(source)))
            .is_err()
        {
            eprintln!("{}", self);
        }
    }
}

impl fmt::Display for FoxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} error{}: {}",
            self.kind.label(),
            self.location(),
            self.message
        )
    }
}

impl std::error::Error for FoxError {}
