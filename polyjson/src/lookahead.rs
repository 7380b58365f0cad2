//! Locate a field inside a JSON object without moving the caller's cursor.
//!
//! The lookahead runs its own [`Scanner`] from a byte offset, walks the
//! object's top-level members and skips every value by tracking bracket
//! depth. Nested objects and arrays are never interpreted, so a key that
//! appears after a large nested structure is still found with a single pass.

use alloc::borrow::Cow;
use alloc::string::String;

use crate::Span;
use crate::scanner::{ScanError, ScanErrorKind, Scanner, SpannedToken, Token, decode_string};

/// The raw, undecoded value found for a field.
#[derive(Debug, Clone, PartialEq)]
pub struct RawValue<'a> {
    /// Source bytes of the value.
    pub bytes: &'a [u8],
    /// Location of the value in the scanned buffer.
    pub span: Span,
    buf: &'a [u8],
    first: Token,
}

impl<'a> RawValue<'a> {
    /// The decoded text when the value is a JSON string, `None` for any other
    /// kind of value.
    pub fn as_str_scalar(&self) -> Result<Option<Cow<'a, str>>, ScanError> {
        match self.first {
            Token::String {
                start,
                end,
                has_escapes,
            } => decode_string(self.buf, start, end, has_escapes).map(Some),
            _ => Ok(None),
        }
    }

    /// The value's source text, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.bytes).into_owned()
    }
}

/// Find the value of the top-level member `field` of the object starting at
/// `start` (leading whitespace allowed).
///
/// Returns `Ok(None)` when the object has no such member. The first matching
/// member wins. Malformed input up to and including the matched member's
/// trailing separator is reported as a [`ScanError`].
pub fn locate_field<'a>(
    buf: &'a [u8],
    start: usize,
    field: &str,
) -> Result<Option<RawValue<'a>>, ScanError> {
    let mut scanner = Scanner::at_position(start);

    let open = scanner.next_token(buf)?;
    if open.token != Token::ObjectStart {
        return Err(unexpected(buf, &open, "while looking for an object"));
    }

    let mut first_member = true;
    loop {
        let key = scanner.next_token(buf)?;
        let (key_start, key_end, key_escapes) = match key.token {
            Token::String {
                start,
                end,
                has_escapes,
            } => (start, end, has_escapes),
            Token::ObjectEnd if first_member => return Ok(None),
            _ => return Err(unexpected(buf, &key, "in object")),
        };
        first_member = false;

        let colon = scanner.next_token(buf)?;
        if colon.token != Token::Colon {
            return Err(unexpected(buf, &colon, "in object"));
        }

        scanner.skip_whitespace(buf);
        let value_start = scanner.pos();
        let first = skip_value(&mut scanner, buf)?;
        let value_end = scanner.pos();

        let sep = scanner.next_token(buf)?;
        let last = match sep.token {
            Token::Comma => false,
            Token::ObjectEnd => true,
            _ => return Err(unexpected(buf, &sep, "in object")),
        };

        if decode_string(buf, key_start, key_end, key_escapes)? == field {
            return Ok(Some(RawValue {
                bytes: &buf[value_start..value_end],
                span: Span::new(value_start, value_end - value_start),
                buf,
                first: first.token,
            }));
        }

        if last {
            return Ok(None);
        }
    }
}

/// Skip one value, returning its first token.
fn skip_value(scanner: &mut Scanner, buf: &[u8]) -> Result<SpannedToken, ScanError> {
    let first = scanner.next_token(buf)?;
    let mut depth: usize = match first.token {
        Token::ObjectStart | Token::ArrayStart => 1,
        Token::String { .. } | Token::Number { .. } | Token::Null | Token::True | Token::False => {
            return Ok(first);
        }
        _ => return Err(unexpected(buf, &first, "in value")),
    };

    while depth > 0 {
        let tok = scanner.next_token(buf)?;
        match tok.token {
            Token::ObjectStart | Token::ArrayStart => depth += 1,
            Token::ObjectEnd | Token::ArrayEnd => depth -= 1,
            Token::Eof => return Err(unexpected(buf, &tok, "in nested value")),
            _ => {}
        }
    }
    Ok(first)
}

fn unexpected(buf: &[u8], tok: &SpannedToken, context: &'static str) -> ScanError {
    let kind = match buf.get(tok.span.offset) {
        Some(&b) if tok.token != Token::Eof => ScanErrorKind::UnexpectedChar(b as char),
        _ => ScanErrorKind::UnexpectedEof(context),
    };
    ScanError {
        kind,
        span: tok.span,
    }
}
