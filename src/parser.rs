//! Expression parser and statement preprocessor.
//!
//! Expressions are parsed by precedence climbing over `BINARY_OPERATORS`.
//! The preprocessor walks the whole stream, turning `{% ... %}` blocks and
//! `{{ ... }}` outputs into `DocNode`s and recursing into block bodies until
//! their `end*` tag.

use crate::ast::{BinOp, DocNode, Expr, Template};
use crate::config::CompileOptions;
use crate::error::{CompileError, CompileResult};
use crate::lexer::{Token, TokenKind};
use crate::stream::TokenStream;
use tracing::trace;

/// Parse one expression from `stream` with default options.
pub fn parse(stream: &mut TokenStream, min_precedence: u8) -> CompileResult<Expr> {
    Parser::new(stream, &CompileOptions::default()).parse_expression(min_precedence)
}

/// Preprocess a whole stream with default options.
pub fn preprocess(stream: &mut TokenStream) -> CompileResult<Template> {
    Parser::new(stream, &CompileOptions::default()).preprocess()
}

enum Block {
    Node(DocNode),
    End(Token),
}

pub struct Parser<'s> {
    stream: &'s mut TokenStream,
    depth: usize,
    max_depth: usize,
}

impl<'s> Parser<'s> {
    pub fn new(stream: &'s mut TokenStream, options: &CompileOptions) -> Self {
        Self {
            stream,
            depth: 0,
            max_depth: options.max_depth,
        }
    }

    pub fn stream(&mut self) -> &mut TokenStream {
        &mut *self.stream
    }

    fn next(&mut self) -> Option<Token> {
        self.stream.get().cloned()
    }

    fn enter(&mut self, at: &Token) -> CompileResult<()> {
        if self.depth >= self.max_depth {
            return Err(CompileError::NestingTooDeep {
                limit: self.max_depth,
                span: at.span(),
                src: self.stream.source().named_source(),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn unexpected(&self, expected: impl Into<String>, found: &Token) -> CompileError {
        CompileError::UnexpectedToken {
            expected: expected.into(),
            found: found.value.clone(),
            span: found.span(),
            src: self.stream.source().named_source(),
        }
    }

    fn unexpected_end(&self, at: Option<&Token>) -> CompileError {
        CompileError::UnexpectedEndOfExpression {
            span: at.map_or_else(|| self.stream.current_span(), Token::span),
            src: self.stream.source().named_source(),
        }
    }

    fn malformed(&self, reason: impl Into<String>, at: &Token) -> CompileError {
        CompileError::MalformedBlock {
            reason: reason.into(),
            span: at.span(),
            src: self.stream.source().named_source(),
        }
    }

    fn expect_delimiter(&mut self, delimiter: &str) -> CompileResult<()> {
        match self.next() {
            Some(t) if t.is_delimiter(delimiter) => Ok(()),
            Some(t) => Err(self.unexpected(format!("`{delimiter}`"), &t)),
            None => Err(self.unexpected_end(None)),
        }
    }

    /// Precedence climbing. Leaves the cursor on the first token that is
    /// not part of the expression (normally the block closer).
    ///
    /// Every binary node counts one level against `max_depth` until the
    /// expression returns, so the height of the tree stays bounded.
    pub fn parse_expression(&mut self, min_precedence: u8) -> CompileResult<Expr> {
        let depth = self.depth;
        let parsed = self.climb(min_precedence);
        self.depth = depth;
        parsed
    }

    fn climb(&mut self, min_precedence: u8) -> CompileResult<Expr> {
        let mut lhs = self.parse_primary()?;

        while let Some(op) = self.stream.current().and_then(binary_op) {
            if op.precedence() < min_precedence {
                break;
            }
            let Some(op_token) = self.next() else { break };
            self.enter(&op_token)?;
            let rhs = self.parse_expression(op.precedence() + 1)?;
            lhs = Expr::binary(op, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let token = match self.next() {
            None => return Err(self.unexpected_end(None)),
            Some(t) if t.is_closer() => return Err(self.unexpected_end(Some(&t))),
            Some(t) => t,
        };

        match token.kind {
            TokenKind::Delimiter if token.is_delimiter("{{") => {
                self.enter(&token)?;
                let inner = self.parse_primary();
                self.leave();
                inner
            }
            TokenKind::Operator if token.value == "(" => {
                self.enter(&token)?;
                let inner = self.parse_expression(0);
                self.leave();
                let inner = inner?;
                match self.next() {
                    Some(t) if t.kind == TokenKind::Operator && t.value == ")" => Ok(inner),
                    Some(t) => Err(self.unexpected("`)`", &t)),
                    None => Err(self.unexpected_end(None)),
                }
            }
            TokenKind::Word | TokenKind::Quoted | TokenKind::Text => Ok(Expr::Leaf(token)),
            TokenKind::Delimiter | TokenKind::Operator => {
                Err(self.unexpected("an operand", &token))
            }
        }
    }

    /// Preprocess the remaining stream into a template. An `end*` tag with
    /// no open block is an error.
    pub fn preprocess(&mut self) -> CompileResult<Template> {
        let (nodes, end) = self.parse_nodes()?;
        match end {
            Some(end) => Err(self.malformed(format!("`{end}` closes no open block"), &end)),
            None => Ok(nodes),
        }
    }

    /// Read nodes until end of input or an `end*` tag, which is returned
    /// with the nodes.
    fn parse_nodes(&mut self) -> CompileResult<(Vec<DocNode>, Option<Token>)> {
        let mut nodes = Vec::new();

        while let Some(token) = self.next() {
            match token.kind {
                TokenKind::Delimiter if token.is_delimiter("{%") => {
                    match self.parse_block(&token)? {
                        Block::Node(node) => nodes.push(node),
                        Block::End(end) => return Ok((nodes, Some(end))),
                    }
                }
                TokenKind::Delimiter if token.is_delimiter("{{") => {
                    let ast = self.parse_expression(0)?;
                    self.expect_delimiter("}}")?;
                    nodes.push(DocNode::Expression { ast });
                }
                // A stray closer carries no content.
                TokenKind::Delimiter => {}
                _ => nodes.push(DocNode::Literal { text: token.value }),
            }
        }

        Ok((nodes, None))
    }

    /// Body of an `if`/`for` block, through its `end*` tag.
    fn parse_body(&mut self, open: &Token, keyword: &Token) -> CompileResult<Vec<DocNode>> {
        self.enter(open)?;
        let parsed = self.parse_nodes();
        self.leave();
        match parsed? {
            (body, Some(end)) => {
                trace!(block = %keyword, end = %end, "closed block");
                Ok(body)
            }
            (_, None) => Err(self.malformed(
                format!("`{keyword}` block is never closed; expected an `end{keyword}` tag"),
                open,
            )),
        }
    }

    fn expect_name(&mut self, what: &str, open: &Token) -> CompileResult<String> {
        match self.next() {
            Some(t) if t.kind == TokenKind::Word => Ok(t.value),
            Some(t) => Err(self.malformed(format!("expected {what}, found `{t}`"), &t)),
            None => Err(self.malformed(format!("expected {what}"), open)),
        }
    }

    fn parse_block(&mut self, open: &Token) -> CompileResult<Block> {
        let keyword = match self.next() {
            Some(t) if t.kind == TokenKind::Word => t,
            Some(t) => {
                let reason = format!("expected a statement keyword, found `{t}`");
                return Err(self.malformed(reason, &t));
            }
            None => return Err(self.malformed("missing statement keyword", open)),
        };
        trace!(keyword = %keyword, offset = keyword.offset, "block");

        match keyword.value.as_str() {
            "set" => {
                let name = self.expect_name("a variable name after `set`", open)?;
                let operator = match self.next() {
                    Some(t) if t.kind == TokenKind::Operator => t.value,
                    Some(t) => {
                        let reason = format!("expected `=` after `{name}`, found `{t}`");
                        return Err(self.malformed(reason, &t));
                    }
                    None => {
                        return Err(self.malformed(format!("expected `=` after `{name}`"), open))
                    }
                };
                let value = self.parse_expression(0)?;
                self.expect_delimiter("%}")?;
                Ok(Block::Node(DocNode::Assignment {
                    name,
                    operator,
                    value,
                }))
            }
            "if" => {
                let condition = self.parse_expression(0)?;
                self.expect_delimiter("%}")?;
                let body = self.parse_body(open, &keyword)?;
                Ok(Block::Node(DocNode::Conditional { condition, body }))
            }
            "for" => {
                let binding = self.expect_name("a loop variable after `for`", open)?;
                match self.next() {
                    Some(t) if t.kind == TokenKind::Word && t.value == "in" => {}
                    Some(t) => {
                        let reason = format!("expected `in` after `{binding}`, found `{t}`");
                        return Err(self.malformed(reason, &t));
                    }
                    None => {
                        return Err(self.malformed(format!("expected `in` after `{binding}`"), open))
                    }
                }
                let source = self.parse_expression(0)?;
                self.expect_delimiter("%}")?;
                let body = self.parse_body(open, &keyword)?;
                Ok(Block::Node(DocNode::Loop {
                    binding,
                    source,
                    body,
                }))
            }
            kw if kw.starts_with("end") => {
                self.expect_delimiter("%}")?;
                Ok(Block::End(keyword.clone()))
            }
            other => Err(self.malformed(format!("unknown statement `{other}`"), &keyword)),
        }
    }
}

fn binary_op(token: &Token) -> Option<BinOp> {
    match token.kind {
        TokenKind::Operator => BinOp::from_symbol(&token.value),
        _ => None,
    }
}
