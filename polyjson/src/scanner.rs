//! Low-level JSON scanner that finds token boundaries without materializing strings.
//!
//! The scanner identifies where tokens are in a buffer; it does not interpret
//! them. String content comes back as indices plus a `has_escapes` flag, and
//! [`decode_string`] does the second pass only when a caller needs the text.

use alloc::borrow::Cow;
use alloc::string::String;
use core::str;

use crate::Span;

/// Token kinds with minimal data - strings/numbers are just indices into the buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `{`
    ObjectStart,
    /// `}`
    ObjectEnd,
    /// `[`
    ArrayStart,
    /// `]`
    ArrayEnd,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// A string literal - indices point to content (excluding quotes)
    String {
        /// Start index of string content (after opening quote)
        start: usize,
        /// End index of string content (before closing quote)
        end: usize,
        /// True if the string contains escape sequences that need processing
        has_escapes: bool,
    },
    /// A number literal - indices point to the raw number text
    Number {
        /// Start index of number
        start: usize,
        /// End index of number
        end: usize,
    },
    /// End of input reached
    Eof,
}

impl Token {
    /// Short description used in "unexpected token" errors.
    pub const fn describe(&self) -> &'static str {
        match self {
            Token::ObjectStart => "'{'",
            Token::ObjectEnd => "'}'",
            Token::ArrayStart => "'['",
            Token::ArrayEnd => "']'",
            Token::Colon => "':'",
            Token::Comma => "','",
            Token::Null => "null",
            Token::True | Token::False => "boolean",
            Token::String { .. } => "string",
            Token::Number { .. } => "number",
            Token::Eof => "end of input",
        }
    }
}

/// Spanned token with location information
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    /// The token
    pub token: Token,
    /// Source span
    pub span: Span,
}

/// Scanner error
#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    /// The error kind
    pub kind: ScanErrorKind,
    /// Source span
    pub span: Span,
}

/// Types of scanner errors
#[derive(Debug, Clone, PartialEq)]
pub enum ScanErrorKind {
    /// Unexpected character
    UnexpectedChar(char),
    /// Unexpected end of input (with context)
    UnexpectedEof(&'static str),
    /// Invalid UTF-8
    InvalidUtf8,
}

impl core::fmt::Display for ScanErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScanErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            ScanErrorKind::UnexpectedEof(ctx) => write!(f, "unexpected end of input {ctx}"),
            ScanErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
        }
    }
}

/// Result type for scanner operations
pub type ScanResult = Result<SpannedToken, ScanError>;

/// JSON scanner over a complete in-memory buffer.
///
/// The position is a plain byte offset, so callers can snapshot it and
/// rewind with [`Scanner::set_pos`].
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    pos: usize,
}

impl Scanner {
    /// Create a new scanner starting at position 0
    pub const fn new() -> Self {
        Self { pos: 0 }
    }

    /// Create a scanner starting at a specific position
    pub const fn at_position(pos: usize) -> Self {
        Self { pos }
    }

    /// Current position in the buffer
    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Set position (used to rewind after a lookahead)
    pub const fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Scan the next token from the buffer.
    pub fn next_token(&mut self, buf: &[u8]) -> ScanResult {
        self.skip_whitespace(buf);

        let start = self.pos;
        let Some(&byte) = buf.get(self.pos) else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span: Span::new(self.pos, 0),
            });
        };

        let punct = |scanner: &mut Self, token: Token| -> ScanResult {
            scanner.pos += 1;
            Ok(SpannedToken {
                token,
                span: Span::new(start, 1),
            })
        };

        match byte {
            b'{' => punct(self, Token::ObjectStart),
            b'}' => punct(self, Token::ObjectEnd),
            b'[' => punct(self, Token::ArrayStart),
            b']' => punct(self, Token::ArrayEnd),
            b':' => punct(self, Token::Colon),
            b',' => punct(self, Token::Comma),
            b'"' => self.scan_string(buf, start),
            b'-' | b'0'..=b'9' => self.scan_number(buf, start),
            b't' => self.scan_literal(buf, start, b"true", Token::True),
            b'f' => self.scan_literal(buf, start, b"false", Token::False),
            b'n' => self.scan_literal(buf, start, b"null", Token::Null),
            _ => Err(ScanError {
                kind: ScanErrorKind::UnexpectedChar(byte as char),
                span: Span::new(start, 1),
            }),
        }
    }

    /// Advance past JSON whitespace.
    pub fn skip_whitespace(&mut self, buf: &[u8]) {
        let mut pos = self.pos;
        while let Some(&b) = buf.get(pos) {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
                _ => break,
            }
        }
        self.pos = pos;
    }

    /// Scan a string, finding its boundaries and noting if it has escapes.
    fn scan_string(&mut self, buf: &[u8], start: usize) -> ScanResult {
        const STEP_SIZE: usize = 16;
        type Window = u128;
        type Chunk = [u8; STEP_SIZE];

        // Skip opening quote
        self.pos += 1;
        let content_start = self.pos;
        let mut has_escapes = false;

        // SWAR fast path: skip 16-byte windows without quotes, backslashes
        // or control characters
        while let Some(Ok(chunk)) = buf
            .get(self.pos..)
            .and_then(|s| s.get(..STEP_SIZE))
            .map(Chunk::try_from)
        {
            let window = Window::from_ne_bytes(chunk);
            if contains_byte(window, b'"')
                || contains_byte(window, b'\\')
                || !no_control_chars(window)
            {
                break;
            }
            self.pos += STEP_SIZE;
        }

        while let Some(&byte) = buf.get(self.pos) {
            match byte {
                b'"' => {
                    let content_end = self.pos;
                    self.pos += 1;
                    return Ok(SpannedToken {
                        token: Token::String {
                            start: content_start,
                            end: content_end,
                            has_escapes,
                        },
                        span: Span::new(start, self.pos - start),
                    });
                }
                b'\\' => {
                    has_escapes = true;
                    // The escaped byte can never terminate the string; `\uXXXX`
                    // digits are validated by `decode_string`.
                    self.pos += 2;
                }
                0x00..=0x1F => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedChar(byte as char),
                        span: Span::new(self.pos, 1),
                    });
                }
                _ => self.pos += 1,
            }
        }

        self.pos = buf.len();
        Err(ScanError {
            kind: ScanErrorKind::UnexpectedEof("in string"),
            span: Span::new(start, self.pos - start),
        })
    }

    /// Scan a number: `-? (0 | [1-9][0-9]*) (. [0-9]+)? ([eE] [+-]? [0-9]+)?`
    fn scan_number(&mut self, buf: &[u8], start: usize) -> ScanResult {
        let mut pos = self.pos;

        if buf.get(pos) == Some(&b'-') {
            pos += 1;
        }

        let int_start = pos;
        pos = self.digits(buf, start, pos)?;
        if buf[int_start] == b'0' && pos - int_start > 1 {
            self.pos = int_start + 1;
            return Err(ScanError {
                kind: ScanErrorKind::UnexpectedChar(buf[int_start + 1] as char),
                span: Span::new(int_start + 1, 1),
            });
        }

        if buf.get(pos) == Some(&b'.') {
            pos = self.digits(buf, start, pos + 1)?;
        }

        if matches!(buf.get(pos), Some(b'e') | Some(b'E')) {
            pos += 1;
            if matches!(buf.get(pos), Some(b'+') | Some(b'-')) {
                pos += 1;
            }
            pos = self.digits(buf, start, pos)?;
        }

        self.pos = pos;
        Ok(SpannedToken {
            token: Token::Number { start, end: pos },
            span: Span::new(start, pos - start),
        })
    }

    /// Consume one or more ASCII digits at `pos`, returning the position
    /// after them.
    fn digits(&mut self, buf: &[u8], start: usize, mut pos: usize) -> Result<usize, ScanError> {
        let digits_start = pos;
        while buf.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        if pos > digits_start {
            return Ok(pos);
        }
        self.pos = pos;
        Err(match buf.get(pos) {
            Some(&b) => ScanError {
                kind: ScanErrorKind::UnexpectedChar(b as char),
                span: Span::new(pos, 1),
            },
            None => ScanError {
                kind: ScanErrorKind::UnexpectedEof("in number"),
                span: Span::new(start, pos - start),
            },
        })
    }

    /// Scan a literal keyword (true, false, null)
    fn scan_literal(
        &mut self,
        buf: &[u8],
        start: usize,
        expected: &'static [u8],
        token: Token,
    ) -> ScanResult {
        for &want in expected {
            match buf.get(self.pos) {
                Some(&b) if b == want => self.pos += 1,
                Some(&b) => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedChar(b as char),
                        span: Span::new(self.pos, 1),
                    });
                }
                None => {
                    return Err(ScanError {
                        kind: ScanErrorKind::UnexpectedEof("in literal"),
                        span: Span::new(start, self.pos - start),
                    });
                }
            }
        }

        Ok(SpannedToken {
            token,
            span: Span::new(start, expected.len()),
        })
    }
}

/// Check if a 128-bit window contains a specific byte (SIMD-friendly)
#[inline]
pub(crate) const fn contains_byte(window: u128, byte: u8) -> bool {
    let pattern = u128::from_ne_bytes([byte; 16]);
    let xor = window ^ pattern;
    let has_zero = (xor.wrapping_sub(0x01010101010101010101010101010101))
        & !xor
        & 0x80808080808080808080808080808080;
    has_zero != 0
}

/// True when every byte of the window is >= 0x20.
#[inline]
pub(crate) const fn no_control_chars(window: u128) -> bool {
    let masked = window & 0xe0e0e0e0e0e0e0e0e0e0e0e0e0e0e0e0;
    let has_zero = (masked.wrapping_sub(0x01010101010101010101010101010101))
        & !masked
        & 0x80808080808080808080808080808080;
    has_zero == 0
}

// =============================================================================
// String decoding (second pass)
// =============================================================================

/// Decode a JSON string, borrowing from `buf` when it has no escapes.
///
/// `start..end` is the string content without its quotes.
pub fn decode_string(
    buf: &[u8],
    start: usize,
    end: usize,
    has_escapes: bool,
) -> Result<Cow<'_, str>, ScanError> {
    let slice = &buf[start..end];
    if !has_escapes {
        return str::from_utf8(slice)
            .map(Cow::Borrowed)
            .map_err(|e| ScanError {
                kind: ScanErrorKind::InvalidUtf8,
                span: Span::new(start + e.valid_up_to(), 1),
            });
    }
    decode_string_owned(buf, start, end).map(Cow::Owned)
}

fn decode_string_owned(buf: &[u8], start: usize, end: usize) -> Result<String, ScanError> {
    let slice = &buf[start..end];
    let mut result = String::with_capacity(end - start);
    let mut i = 0;

    while i < slice.len() {
        let byte = slice[i];
        if byte != b'\\' {
            // Copy the run of plain bytes up to the next escape in one go.
            let run_end = slice[i..]
                .iter()
                .position(|&b| b == b'\\')
                .map_or(slice.len(), |p| i + p);
            let run = str::from_utf8(&slice[i..run_end]).map_err(|e| ScanError {
                kind: ScanErrorKind::InvalidUtf8,
                span: Span::new(start + i + e.valid_up_to(), 1),
            })?;
            result.push_str(run);
            i = run_end;
            continue;
        }

        i += 1;
        let Some(&escaped) = slice.get(i) else {
            return Err(ScanError {
                kind: ScanErrorKind::UnexpectedEof("in escape sequence"),
                span: Span::new(start + i - 1, 1),
            });
        };

        match escaped {
            b'"' => result.push('"'),
            b'\\' => result.push('\\'),
            b'/' => result.push('/'),
            b'b' => result.push('\x08'),
            b'f' => result.push('\x0c'),
            b'n' => result.push('\n'),
            b'r' => result.push('\r'),
            b't' => result.push('\t'),
            b'u' => {
                i += 1;
                let code_unit = read_hex4(slice, i, start)?;
                i += 4;

                let code_point = if (0xD800..=0xDBFF).contains(&code_unit) {
                    // High surrogate - expect \uXXXX to follow
                    if slice.get(i) != Some(&b'\\') || slice.get(i + 1) != Some(&b'u') {
                        return Err(ScanError {
                            kind: ScanErrorKind::InvalidUtf8,
                            span: Span::new(start + i - 6, 6),
                        });
                    }
                    i += 2;
                    let low_unit = read_hex4(slice, i, start)?;
                    i += 4;
                    if !(0xDC00..=0xDFFF).contains(&low_unit) {
                        return Err(ScanError {
                            kind: ScanErrorKind::InvalidUtf8,
                            span: Span::new(start + i - 4, 4),
                        });
                    }
                    0x10000 + ((u32::from(code_unit) & 0x3FF) << 10) + (u32::from(low_unit) & 0x3FF)
                } else {
                    u32::from(code_unit)
                };

                let c = char::from_u32(code_point).ok_or(ScanError {
                    kind: ScanErrorKind::InvalidUtf8,
                    span: Span::new(start + i - 4, 4),
                })?;
                result.push(c);
                continue;
            }
            other => {
                return Err(ScanError {
                    kind: ScanErrorKind::UnexpectedChar(other as char),
                    span: Span::new(start + i, 1),
                });
            }
        }
        i += 1;
    }

    Ok(result)
}

fn read_hex4(slice: &[u8], at: usize, base: usize) -> Result<u16, ScanError> {
    let Some(hex) = slice.get(at..at + 4) else {
        return Err(ScanError {
            kind: ScanErrorKind::UnexpectedEof("in unicode escape"),
            span: Span::new(base + at, slice.len().saturating_sub(at)),
        });
    };
    str::from_utf8(hex)
        .ok()
        .and_then(|h| u16::from_str_radix(h, 16).ok())
        .ok_or(ScanError {
            kind: ScanErrorKind::UnexpectedChar('?'),
            span: Span::new(base + at, 4),
        })
}
