//! Error types for compiling and evaluating templates
//!
//! Compile errors carry the template text and a labelled span, so a caller
//! can render a diagnostic that points at the offending token via miette.
//! Evaluation errors are plain values: the AST they come from no longer
//! holds the source.

use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Template text shared by every diagnostic raised while compiling it.
#[derive(Debug, Clone)]
pub struct TemplateSource {
    /// Shown as the file name in reports.
    pub name: String,
    pub source: Arc<String>,
}

impl TemplateSource {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: Arc::new(source.into()),
        }
    }

    /// Copy of the text for a `#[source_code]` field.
    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(&self.name, (*self.source).clone())
    }

    /// Zero-width span just past the last byte of the source.
    pub fn end_span(&self) -> SourceSpan {
        (self.source.len(), 0).into()
    }
}

pub type CompileResult<T> = Result<T, CompileError>;
pub type EvalResult<T> = Result<T, EvalError>;

/// Everything that can abort `compile_expression` / `compile_template`.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error("template `{name}` contains no tokens")]
    #[diagnostic(code(twig::empty_input))]
    EmptyInput { name: String },

    #[error("source ends inside `{open}`")]
    #[diagnostic(
        code(twig::syntax::unterminated),
        help("add `{close}` to close this block")
    )]
    UnterminatedExpression {
        open: String,
        close: String,
        #[label("opened here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("unterminated string literal")]
    #[diagnostic(
        code(twig::syntax::unterminated_string),
        help("add a closing {quote}")
    )]
    UnterminatedString {
        quote: char,
        #[label("string starts here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("expected {expected}, found `{found}`")]
    #[diagnostic(code(twig::syntax::unexpected))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("expression ends before its last operand")]
    #[diagnostic(code(twig::syntax::unexpected_end))]
    UnexpectedEndOfExpression {
        #[label("expected an operand here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("malformed block: {reason}")]
    #[diagnostic(code(twig::syntax::malformed_block))]
    MalformedBlock {
        reason: String,
        #[label("in this block")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("nesting exceeds {limit} levels")]
    #[diagnostic(
        code(twig::nesting_too_deep),
        help("raise `CompileOptions::max_depth` or flatten the template")
    )]
    NestingTooDeep {
        limit: usize,
        #[label("too deep")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

/// Errors raised while evaluating an expression against a `Context`.
#[derive(Error, Debug, Clone, PartialEq, Diagnostic)]
pub enum EvalError {
    #[error("variable `{path}` is not defined")]
    #[diagnostic(
        code(twig::eval::undefined),
        help("use `UndefinedBehavior::Lenient` to resolve missing variables to null")
    )]
    UnresolvedVariable { path: String },
}
