//! Forward-only decode cursor over an in-memory JSON document.

use alloc::borrow::Cow;
use core::str::FromStr;

use crate::scanner::{Scanner, SpannedToken, Token, decode_string};
use crate::{Codec, Decode, JsonError, JsonErrorKind, Result, Span};

/// A forward-only cursor over JSON input.
///
/// The decoder holds at most one peeked token. Its position can be captured
/// with [`Decoder::snapshot`] and rewound with [`Decoder::restore`], which is
/// all the lookahead machinery needs.
pub struct Decoder<'input, 'codec> {
    input: &'input [u8],
    scanner: Scanner,
    peeked: Option<SpannedToken>,
    codec: &'codec Codec,
    depth: usize,
}

impl<'input, 'codec> Decoder<'input, 'codec> {
    /// Create a decoder over `input`, configured by `codec`.
    pub fn new(input: &'input [u8], codec: &'codec Codec) -> Self {
        Self {
            input,
            scanner: Scanner::new(),
            peeked: None,
            codec,
            depth: 0,
        }
    }

    /// A decoder over a separate buffer sharing this decoder's configuration
    /// and nesting depth.
    pub fn nested<'sub>(&self, input: &'sub [u8]) -> Decoder<'sub, 'codec> {
        Decoder {
            input,
            scanner: Scanner::new(),
            peeked: None,
            codec: self.codec,
            depth: self.depth,
        }
    }

    /// The configuration driving this decode.
    pub fn codec(&self) -> &'codec Codec {
        self.codec
    }

    /// The full input buffer.
    pub fn input(&self) -> &'input [u8] {
        self.input
    }

    /// Look at the next token without consuming it.
    pub fn peek(&mut self) -> Result<SpannedToken> {
        if let Some(tok) = &self.peeked {
            return Ok(tok.clone());
        }
        let tok = self.scanner.next_token(self.input)?;
        self.peeked = Some(tok.clone());
        Ok(tok)
    }

    /// Consume the next token.
    pub fn next(&mut self) -> Result<SpannedToken> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => Ok(self.scanner.next_token(self.input)?),
        }
    }

    /// Byte offset of the next token.
    pub fn snapshot(&mut self) -> Result<usize> {
        Ok(self.peek()?.span.offset)
    }

    /// Rewind (or fast-forward) to a byte offset taken from [`Decoder::snapshot`].
    pub fn restore(&mut self, offset: usize) {
        self.peeked = None;
        self.scanner.set_pos(offset);
    }

    /// Build an "unexpected token" error for `tok`.
    pub fn unexpected(&self, tok: &SpannedToken, expected: &'static str) -> JsonError {
        JsonError::new(
            JsonErrorKind::UnexpectedToken {
                got: tok.token.describe(),
                expected,
            },
            tok.span,
        )
    }

    /// Consume a `null` if it is next; report whether one was consumed.
    pub fn read_null(&mut self) -> Result<bool> {
        if self.peek()?.token == Token::Null {
            self.next()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Read a boolean literal.
    pub fn read_bool(&mut self) -> Result<bool> {
        let tok = self.next()?;
        match tok.token {
            Token::True => Ok(true),
            Token::False => Ok(false),
            _ => Err(self.unexpected(&tok, "boolean")),
        }
    }

    /// Read a string, borrowing from the input when it has no escapes.
    pub fn read_str(&mut self) -> Result<Cow<'input, str>> {
        let tok = self.next()?;
        match tok.token {
            Token::String {
                start,
                end,
                has_escapes,
            } => Ok(decode_string(self.input, start, end, has_escapes)?),
            _ => Err(self.unexpected(&tok, "string")),
        }
    }

    /// Read a number and parse it as `T`.
    pub fn read_number<T: FromStr>(&mut self, target_type: &'static str) -> Result<T> {
        let tok = self.next()?;
        let Token::Number { start, end, .. } = tok.token else {
            return Err(self.unexpected(&tok, target_type));
        };
        // number tokens are ASCII by construction
        let text = core::str::from_utf8(&self.input[start..end]).unwrap_or_default();
        text.parse().map_err(|_| {
            JsonError::new(
                JsonErrorKind::NumberOutOfRange {
                    value: text.into(),
                    target_type,
                },
                tok.span,
            )
        })
    }

    /// Walk an object, calling `f` with each key; `f` must consume the value.
    pub fn read_object(
        &mut self,
        mut f: impl FnMut(&mut Self, Cow<'input, str>) -> Result<()>,
    ) -> Result<()> {
        let open = self.next()?;
        if open.token != Token::ObjectStart {
            return Err(self.unexpected(&open, "object"));
        }
        self.enter(open.span)?;

        if self.peek()?.token == Token::ObjectEnd {
            self.next()?;
            self.leave();
            return Ok(());
        }

        loop {
            let key = self.next()?;
            let Token::String {
                start,
                end,
                has_escapes,
            } = key.token
            else {
                return Err(self.unexpected(&key, "object key"));
            };
            let key = decode_string(self.input, start, end, has_escapes)?;

            let colon = self.next()?;
            if colon.token != Token::Colon {
                return Err(self.unexpected(&colon, "':'"));
            }

            f(self, key)?;

            let sep = self.next()?;
            match sep.token {
                Token::Comma => continue,
                Token::ObjectEnd => break,
                _ => return Err(self.unexpected(&sep, "',' or '}'")),
            }
        }

        self.leave();
        Ok(())
    }

    /// Walk an array, calling `f` with each index; `f` must consume the
    /// element. Returns the number of elements.
    pub fn read_array(&mut self, mut f: impl FnMut(&mut Self, usize) -> Result<()>) -> Result<usize> {
        let open = self.next()?;
        if open.token != Token::ArrayStart {
            return Err(self.unexpected(&open, "array"));
        }
        self.enter(open.span)?;

        if self.peek()?.token == Token::ArrayEnd {
            self.next()?;
            self.leave();
            return Ok(0);
        }

        let mut index = 0;
        loop {
            f(self, index)?;
            index += 1;

            let sep = self.next()?;
            match sep.token {
                Token::Comma => continue,
                Token::ArrayEnd => break,
                _ => return Err(self.unexpected(&sep, "',' or ']'")),
            }
        }

        self.leave();
        Ok(index)
    }

    /// Consume one complete value of any kind.
    pub fn skip_value(&mut self) -> Result<()> {
        let tok = self.next()?;
        match tok.token {
            Token::ObjectStart => {
                self.peeked = Some(tok);
                self.read_object(|de, _| de.skip_value())
            }
            Token::ArrayStart => {
                self.peeked = Some(tok);
                self.read_array(|de, _| de.skip_value()).map(|_| ())
            }
            Token::Null
            | Token::True
            | Token::False
            | Token::String { .. }
            | Token::Number { .. } => Ok(()),
            _ => Err(self.unexpected(&tok, "value")),
        }
    }

    /// Decode a struct field through the field type's container hook.
    pub fn field<T: Decode>(&mut self, slot: &mut T, name: &'static str) -> Result<()> {
        T::decode_field(slot, name, self)
    }

    /// Decode the next value into a fresh `T`.
    pub fn decode<T: Decode + Default>(&mut self) -> Result<T> {
        let mut value = T::default();
        value.decode(self)?;
        Ok(value)
    }

    /// Require that the input holds nothing but whitespace from here on.
    pub fn finish(&mut self) -> Result<()> {
        let tok = self.peek()?;
        if tok.token != Token::Eof {
            return Err(JsonError::new(JsonErrorKind::TrailingCharacters, tok.span));
        }
        Ok(())
    }

    fn enter(&mut self, span: Span) -> Result<()> {
        let limit = self.codec.decode_options().depth_limit();
        if self.depth >= limit {
            return Err(JsonError::new(
                JsonErrorKind::DepthLimitExceeded { limit },
                span,
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
