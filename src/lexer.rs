use crate::error::{CompileError, CompileResult, TemplateSource};
use crate::stream::TokenStream;
use miette::SourceSpan;
use std::fmt;
use tracing::{debug, trace};

/// Block delimiters. Even slots open expression mode, odd slots close it,
/// and each opener is immediately followed by its own closer.
pub const BLOCK_DELIMITERS: [&str; 4] = ["{{", "}}", "{%", "%}"];

/// Characters that split expression-mode text into operator tokens.
pub const SPECIAL_CHARS: [char; 17] = [
    '+', '-', '*', '/', '(', ')', '[', ']', '|', '=', ',', '<', '>', '%', '?', ':', '~',
];

const QUOTES: [char; 2] = ['\'', '"'];

/// How a token was produced. Tokens carry no grammar of their own; the kind
/// only records which lexical context emitted the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// One of `BLOCK_DELIMITERS`.
    Delimiter,
    /// A maximal run of `SPECIAL_CHARS` inside an expression.
    Operator,
    /// Bare text inside an expression: numbers, names, dotted paths.
    Word,
    /// Contents of a quoted string, quotes removed.
    Quoted,
    /// Literal template text outside any block.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    /// Byte offset of the token's first character (the opening quote for
    /// `Quoted`).
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            offset,
        }
    }

    pub fn is_delimiter(&self, delimiter: &str) -> bool {
        self.kind == TokenKind::Delimiter && self.value == delimiter
    }

    /// `}}` or `%}`.
    pub fn is_closer(&self) -> bool {
        self.kind == TokenKind::Delimiter
            && delimiter_index(&self.value).is_some_and(|i| i % 2 == 1)
    }

    /// Source span covered by the token.
    pub fn span(&self) -> SourceSpan {
        let len = match self.kind {
            TokenKind::Quoted => self.value.len() + 2,
            _ => self.value.len(),
        };
        (self.offset, len).into()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

fn delimiter_index(s: &str) -> Option<usize> {
    BLOCK_DELIMITERS.iter().position(|d| *d == s)
}

/// The closer paired with an opening delimiter.
pub fn closer_for(opener: &str) -> Option<&'static str> {
    delimiter_index(opener)
        .filter(|i| i % 2 == 0)
        .map(|i| BLOCK_DELIMITERS[i + 1])
}

pub fn is_special(c: char) -> bool {
    SPECIAL_CHARS.contains(&c)
}

/// Tokenize `input` under the default template name.
pub fn tokenize(input: &str) -> CompileResult<TokenStream> {
    tokenize_source(TemplateSource::new("template", input))
}

pub fn tokenize_source(source: TemplateSource) -> CompileResult<TokenStream> {
    let tokens = Tokenizer::new(&source).run()?;
    debug!(name = %source.name, tokens = tokens.len(), "tokenized template");
    TokenStream::new(tokens, source)
}

struct Tokenizer<'a> {
    source: &'a TemplateSource,
    input: &'a str,
    cursor: usize,
    in_expression: bool,
    /// Most recent opening delimiter and its offset.
    opened: Option<(&'static str, usize)>,
    buffer: String,
    buffer_start: usize,
    tokens: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a TemplateSource) -> Self {
        Self {
            source,
            input: source.source.as_str(),
            cursor: 0,
            in_expression: false,
            opened: None,
            buffer: String::new(),
            buffer_start: 0,
            tokens: Vec::new(),
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.cursor..]
    }

    fn push(&mut self, kind: TokenKind, value: impl Into<String>, offset: usize) {
        let token = Token::new(kind, value, offset);
        trace!(kind = ?token.kind, value = %token.value, offset, "token");
        self.tokens.push(token);
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let kind = if self.in_expression {
            TokenKind::Word
        } else {
            TokenKind::Text
        };
        let value = std::mem::take(&mut self.buffer);
        self.push(kind, value, self.buffer_start);
    }

    fn buffer_char(&mut self, c: char) {
        if self.buffer.is_empty() {
            self.buffer_start = self.cursor;
        }
        self.buffer.push(c);
        self.cursor += c.len_utf8();
    }

    fn run(mut self) -> CompileResult<Vec<Token>> {
        while let Some(c) = self.remaining().chars().next() {
            if let Some(index) = BLOCK_DELIMITERS
                .iter()
                .position(|d| self.remaining().starts_with(d))
            {
                self.flush();
                let delimiter = BLOCK_DELIMITERS[index];
                self.in_expression = index % 2 == 0;
                if self.in_expression {
                    self.opened = Some((delimiter, self.cursor));
                }
                self.push(TokenKind::Delimiter, delimiter, self.cursor);
                self.cursor += delimiter.len();
            } else if self.in_expression && c.is_whitespace() {
                self.flush();
                self.cursor += c.len_utf8();
            } else if self.in_expression && is_special(c) {
                self.flush();
                let start = self.cursor;
                let run: String = self
                    .remaining()
                    .chars()
                    .take_while(|c| is_special(*c))
                    .collect();
                self.cursor += run.len();
                self.push(TokenKind::Operator, run, start);
            } else if QUOTES.contains(&c) {
                self.flush();
                self.quoted(c)?;
            } else {
                self.buffer_char(c);
            }
        }

        self.flush();

        if self.in_expression {
            let (open, offset) = self.opened.unwrap_or(("{{", 0));
            return Err(CompileError::UnterminatedExpression {
                open: open.to_string(),
                close: closer_for(open).unwrap_or("}}").to_string(),
                span: (offset, open.len()).into(),
                src: self.source.named_source(),
            });
        }

        Ok(self.tokens)
    }

    fn quoted(&mut self, quote: char) -> CompileResult<()> {
        let input = self.input;
        let start = self.cursor;
        let body = &input[start + quote.len_utf8()..];
        let Some(len) = body.find(quote) else {
            return Err(CompileError::UnterminatedString {
                quote,
                span: (start, 1).into(),
                src: self.source.named_source(),
            });
        };
        self.push(TokenKind::Quoted, &body[..len], start);
        self.cursor = start + quote.len_utf8() * 2 + len;
        Ok(())
    }
}
