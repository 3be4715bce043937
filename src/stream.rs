use crate::error::{CompileError, CompileResult, TemplateSource};
use crate::lexer::Token;
use miette::SourceSpan;

/// Tokens of one template plus a forward-only cursor.
///
/// The cursor points at the next unread token. Reads past the end return
/// `None` rather than failing; callers treat that as end of input.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    current_index: usize,
    source: TemplateSource,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, source: TemplateSource) -> CompileResult<Self> {
        if tokens.is_empty() {
            return Err(CompileError::EmptyInput { name: source.name });
        }
        Ok(Self {
            tokens,
            current_index: 0,
            source,
        })
    }

    /// Token one position ahead of the cursor.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current_index + 1)
    }

    /// Token at the cursor, advancing past it.
    pub fn get(&mut self) -> Option<&Token> {
        let index = self.current_index;
        self.advance();
        self.tokens.get(index)
    }

    /// Token at the cursor.
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.current_index)
    }

    /// Move forward one token and return the new position. The cursor
    /// stops one past the last token.
    pub fn advance(&mut self) -> usize {
        if self.current_index < self.tokens.len() {
            self.current_index += 1;
        }
        self.current_index
    }

    pub fn position(&self) -> usize {
        self.current_index
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.tokens.len()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    /// Span of the token at the cursor, or the end of the source.
    pub fn current_span(&self) -> SourceSpan {
        self.current()
            .map(Token::span)
            .unwrap_or_else(|| self.source.end_span())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::TokenKind;

    fn stream(words: &[&str]) -> TokenStream {
        let tokens = words
            .iter()
            .map(|w| Token::new(TokenKind::Word, *w, 0))
            .collect();
        TokenStream::new(tokens, TemplateSource::new("test", words.join(" "))).unwrap()
    }

    fn value(token: Option<&Token>) -> Option<&str> {
        token.map(|t| t.value.as_str())
    }

    #[test]
    fn empty_sequence_is_rejected() {
        let err = TokenStream::new(Vec::new(), TemplateSource::new("empty", "")).unwrap_err();
        assert!(matches!(err, CompileError::EmptyInput { name } if name == "empty"));
    }

    #[test]
    fn navigation() {
        let mut s = stream(&["a", "b", "c"]);
        assert!(!s.is_empty());
        assert_eq!(s.len(), 3);
        assert_eq!(value(s.current()), Some("a"));
        assert_eq!(value(s.peek()), Some("b"));
        assert_eq!(value(s.get()), Some("a"));
        assert_eq!(s.position(), 1);
        assert_eq!(s.advance(), 2);
        assert_eq!(value(s.current()), Some("c"));
        assert_eq!(value(s.peek()), None);
    }

    #[test]
    fn reading_past_the_end_yields_none() {
        let mut s = stream(&["only"]);
        assert_eq!(value(s.get()), Some("only"));
        assert!(s.is_exhausted());
        assert_eq!(value(s.get()), None);
        assert_eq!(value(s.current()), None);
        assert_eq!(s.advance(), 1);
        assert_eq!(s.current_span(), s.source().end_span());
    }
}
