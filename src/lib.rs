//! twigcore: tokenizer, expression parser and block preprocessor for
//! Twig-style templates.
//!
//! The crate turns template text into a document tree and leaves rendering
//! to the caller. A standalone expression can also be compiled and
//! evaluated against a variable context.
//!
//! Supported subset:
//! - Literal text.
//! - `{{ expr }}` output blocks.
//! - `{% set name = expr %}`.
//! - `{% if expr %} ... {% endif %}`.
//! - `{% for name in expr %} ... {% endfor %}`, nested to any depth up to
//!   `CompileOptions::max_depth`.
//! - Binary `+ - * / >` with the usual precedence, and parentheses.
//!   Non-numeric operands give NaN.
//!
//! Not supported:
//! - `{% else %}` / `{% elseif %}` branches.
//! - Filters (`| number_format`), function calls, `??` and `?:`. The
//!   tokenizer splits them out but the parser stops at them.
//! - Operators written flush against each other. Adjacent special
//!   characters form one token, so `(3 + 1)*2` reads `)*` as a single
//!   operator and fails; write `(3 + 1) * 2`.
//! - Rendering. `DocNode` trees are handed to a renderer elsewhere.
//!
//! ```
//! use twigcore::{compile_expression, evaluate, Context, Value};
//!
//! let ast = compile_expression("{{ 2 + 5 * (3 + 1) }}")?;
//! assert_eq!(evaluate(&ast, &Context::new())?, Value::Number(22.0));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod stream;

pub use ast::{BinOp, DocNode, Expr, Template};
pub use config::CompileOptions;
pub use error::{CompileError, CompileResult, EvalError, EvalResult, TemplateSource};
pub use eval::{evaluate, to_value, Context, UndefinedBehavior, Value};
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::Parser;
pub use stream::TokenStream;

use tracing::debug;

/// Compile a single expression, e.g. `{{ price * 2 }}`.
///
/// Parsing stops after the first expression and its closing `}}`; anything
/// after that is ignored.
pub fn compile_expression(source: &str) -> CompileResult<Expr> {
    compile_expression_with(source, &CompileOptions::default())
}

pub fn compile_expression_with(source: &str, options: &CompileOptions) -> CompileResult<Expr> {
    let mut stream = lexer::tokenize_source(TemplateSource::new(&options.name, source))?;
    let mut parser = Parser::new(&mut stream, options);
    let ast = parser.parse_expression(0)?;

    let stream = parser.stream();
    if stream.current().is_some_and(|t| t.is_delimiter("}}")) {
        stream.advance();
    }
    if !stream.is_exhausted() {
        debug!(
            skipped = stream.len() - stream.position(),
            "ignoring tokens after the expression"
        );
    }
    Ok(ast)
}

/// Compile a full template into its document tree.
pub fn compile_template(source: &str) -> CompileResult<Template> {
    compile_template_with(source, &CompileOptions::default())
}

pub fn compile_template_with(source: &str, options: &CompileOptions) -> CompileResult<Template> {
    let mut stream = lexer::tokenize_source(TemplateSource::new(&options.name, source))?;
    let nodes = Parser::new(&mut stream, options).preprocess()?;
    debug!(name = %options.name, nodes = nodes.len(), "compiled template");
    Ok(nodes)
}
