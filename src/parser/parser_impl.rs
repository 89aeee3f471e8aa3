//! Token-stream parser: turns a [`Lexer`] into typed parse results with spans
//! attached, grounded on the teacher's `parser/parser.rs`.

use derive_more::Display;

use crate::ast::{Span, Spanning};

use super::lexer::{Lexer, LexerError, Token};

/// A structured parse error, carrying enough context to format a GraphQL-style
/// `{message, locations}` entry (spec.md §4.B "Error policy").
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub enum ParseError {
    /// Failure during tokenization.
    #[display("{_0}")]
    Lexer(LexerError),
    /// A token was found where it isn't syntactically valid.
    #[display("unexpected token {_0:?}")]
    UnexpectedToken(Token),
    /// The document ended before a construct was finished.
    #[display("unexpected end of file")]
    UnexpectedEof,
}

impl Eq for Token {}

pub(super) struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: (Token, Span, Span),
}

pub(super) type PResult<T> = Result<T, Spanning<ParseError>>;

impl<'a> Parser<'a> {
    pub(super) fn new(source: &'a str) -> PResult<Self> {
        let mut lexer = Lexer::new(source);
        let lookahead = Self::advance_lexer(&mut lexer)?;
        Ok(Parser { lexer, lookahead })
    }

    fn advance_lexer(lexer: &mut Lexer<'a>) -> PResult<(Token, Span, Span)> {
        lexer
            .next_token()
            .map_err(|(e, pos)| Spanning::zero_width(pos, ParseError::Lexer(e)))
    }

    pub(super) fn peek(&self) -> &Token {
        &self.lookahead.0
    }

    pub(super) fn peek_start(&self) -> Span {
        self.lookahead.1
    }

    pub(super) fn next(&mut self) -> PResult<Spanning<Token>> {
        let next = Self::advance_lexer(&mut self.lexer)?;
        let (tok, start, end) = std::mem::replace(&mut self.lookahead, next);
        Ok(Spanning::start_end(start, end, tok))
    }

    fn err_here(&self, err: ParseError) -> Spanning<ParseError> {
        Spanning::start_end(self.lookahead.1, self.lookahead.2, err)
    }

    pub(super) fn expect(&mut self, expected: &Token) -> PResult<Spanning<Token>> {
        if self.peek() == expected {
            self.next()
        } else {
            Err(self.err_here(ParseError::UnexpectedToken(self.peek().clone())))
        }
    }

    pub(super) fn expect_name(&mut self) -> PResult<Spanning<String>> {
        match self.peek().clone() {
            Token::Name(n) => {
                let sp = self.next()?;
                Ok(Spanning::start_end(sp.start, sp.end, n))
            }
            other => Err(self.err_here(ParseError::UnexpectedToken(other))),
        }
    }

    /// Consumes a `Name` token equal to `keyword` without requiring it (used for
    /// optional keywords like `on`, `query`, `mutation`).
    pub(super) fn skip_keyword(&mut self, keyword: &str) -> PResult<bool> {
        if let Token::Name(n) = self.peek() {
            if n == keyword {
                self.next()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(super) fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }
}
