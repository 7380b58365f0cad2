//! JSON output buffer and structural writers.

use alloc::string::String;
use alloc::vec::Vec;
use core::any::{TypeId, type_name};

use crate::scanner::{contains_byte, no_control_chars};
use crate::{Codec, Encode, JsonError, JsonErrorKind, MapKey, Result};

/// Writes JSON into an owned byte buffer.
pub struct Encoder<'codec> {
    out: Vec<u8>,
    codec: &'codec Codec,
}

impl<'codec> Encoder<'codec> {
    /// Create an encoder configured by `codec`.
    pub fn new(codec: &'codec Codec) -> Self {
        Self {
            out: Vec::new(),
            codec,
        }
    }

    /// The configuration driving this encode.
    pub fn codec(&self) -> &'codec Codec {
        self.codec
    }

    /// Consume the encoder and return the output bytes.
    pub fn finish(self) -> Vec<u8> {
        self.out
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    pub fn write_null(&mut self) {
        self.out.extend_from_slice(b"null");
    }

    pub fn write_bool(&mut self, value: bool) {
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.out.extend_from_slice(text);
    }

    pub fn write_integer<N: itoa::Integer>(&mut self, value: N) {
        let mut buf = itoa::Buffer::new();
        self.out.extend_from_slice(buf.format(value).as_bytes());
    }

    /// Write a float; NaN and infinities have no JSON form.
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(non_finite(value));
        }
        let mut buf = ryu::Buffer::new();
        self.out.extend_from_slice(buf.format_finite(value).as_bytes());
        Ok(())
    }

    /// Write a float; NaN and infinities have no JSON form.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        if !value.is_finite() {
            return Err(non_finite(value));
        }
        let mut buf = ryu::Buffer::new();
        self.out.extend_from_slice(buf.format_finite(value).as_bytes());
        Ok(())
    }

    /// Write `s` as a quoted, escaped JSON string.
    ///
    /// `<`, `>` and `&` are escaped when the codec's
    /// [`EncodeOptions::escape_html`](crate::EncodeOptions) is set.
    pub fn write_str(&mut self, s: &str) {
        let escape_html = self.codec.encode_options().escape_html;
        self.write_str_with(s, escape_html);
    }

    /// Write `s` as a quoted, escaped JSON string, always escaping `<`, `>`
    /// and `&`.
    pub fn write_str_html_escaped(&mut self, s: &str) {
        self.write_str_with(s, true);
    }

    /// ASCII runs without quotes, backslashes or control characters are
    /// copied 16 bytes at a time.
    fn write_str_with(&mut self, s: &str, escape_html: bool) {
        const STEP_SIZE: usize = 16;
        type Chunk = [u8; STEP_SIZE];

        self.out.push(b'"');

        let mut s = s;
        while let Some(Ok(chunk)) = s.as_bytes().get(..STEP_SIZE).map(Chunk::try_from) {
            let window = u128::from_ne_bytes(chunk);
            let plain = window & 0x80808080808080808080808080808080 == 0
                && !contains_byte(window, b'"')
                && !contains_byte(window, b'\\')
                && no_control_chars(window)
                && !(escape_html
                    && (contains_byte(window, b'<')
                        || contains_byte(window, b'>')
                        || contains_byte(window, b'&')));

            if plain {
                self.out.extend_from_slice(&chunk);
                s = &s[STEP_SIZE..];
            } else {
                let mut chars = s.chars();
                let mut budget = STEP_SIZE;
                for c in &mut chars {
                    self.write_escaped_char(c, escape_html);
                    budget = budget.saturating_sub(c.len_utf8());
                    if budget == 0 {
                        break;
                    }
                }
                s = chars.as_str();
            }
        }

        for c in s.chars() {
            self.write_escaped_char(c, escape_html);
        }

        self.out.push(b'"');
    }

    #[inline]
    fn write_escaped_char(&mut self, c: char, escape_html: bool) {
        match c {
            '"' => self.out.extend_from_slice(b"\\\""),
            '\\' => self.out.extend_from_slice(b"\\\\"),
            '\n' => self.out.extend_from_slice(b"\\n"),
            '\r' => self.out.extend_from_slice(b"\\r"),
            '\t' => self.out.extend_from_slice(b"\\t"),
            '\u{08}' => self.out.extend_from_slice(b"\\b"),
            '\u{0C}' => self.out.extend_from_slice(b"\\f"),
            '<' | '>' | '&' if escape_html => self.write_unicode_escape(c),
            c if c.is_ascii_control() => self.write_unicode_escape(c),
            c if c.is_ascii() => self.out.push(c as u8),
            c => {
                let mut buf = [0u8; 4];
                self.out
                    .extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }

    fn write_unicode_escape(&mut self, c: char) {
        const HEX: &[u8; 16] = b"0123456789abcdef";
        let code = c as u32;
        self.out.extend_from_slice(&[
            b'\\',
            b'u',
            HEX[((code >> 12) & 0xF) as usize],
            HEX[((code >> 8) & 0xF) as usize],
            HEX[((code >> 4) & 0xF) as usize],
            HEX[(code & 0xF) as usize],
        ]);
    }

    /// Write a JSON object; `f` emits its members through [`ObjectWriter`].
    pub fn encode_object(
        &mut self,
        f: impl FnOnce(&mut ObjectWriter<'_, 'codec>) -> Result<()>,
    ) -> Result<()> {
        self.out.push(b'{');
        let mut obj = ObjectWriter {
            enc: self,
            first: true,
        };
        f(&mut obj)?;
        self.out.push(b'}');
        Ok(())
    }

    /// Write a JSON array of `items`.
    pub fn encode_array<'v, T, It>(&mut self, items: It) -> Result<()>
    where
        T: Encode + ?Sized + 'v,
        It: IntoIterator<Item = &'v T>,
    {
        self.out.push(b'[');
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            item.encode(self)?;
        }
        self.out.push(b']');
        Ok(())
    }

    /// Write a JSON object from map entries, rendering each key with
    /// [`MapKey::encode_key`].
    pub fn encode_map<'m, K, V, It>(&mut self, entries: It) -> Result<()>
    where
        K: MapKey + 'm,
        V: Encode + 'm,
        It: IntoIterator<Item = (&'m K, &'m V)>,
    {
        if !self.codec.encode_options().sort_map_keys {
            self.out.push(b'{');
            for (i, (key, value)) in entries.into_iter().enumerate() {
                if i > 0 {
                    self.out.push(b',');
                }
                key.encode_key(self)?;
                self.out.push(b':');
                value.encode(self)?;
            }
            self.out.push(b'}');
            return Ok(());
        }

        let mut rendered = Vec::new();
        for (key, value) in entries {
            let mut sub = Encoder::new(self.codec);
            key.encode_key(&mut sub)?;
            rendered.push((sub.finish(), value));
        }
        rendered.sort_by(|a, b| a.0.cmp(&b.0));

        self.out.push(b'{');
        for (i, (key, value)) in rendered.into_iter().enumerate() {
            if i > 0 {
                self.out.push(b',');
            }
            self.out.extend_from_slice(&key);
            self.out.push(b':');
            value.encode(self)?;
        }
        self.out.push(b'}');
        Ok(())
    }

    /// Write a non-primitive map key as a JSON string through the codec's
    /// key-as-string encoder.
    pub fn encode_structured_key<T: Encode + ?Sized + 'static>(&mut self, key: &T) -> Result<()> {
        match self.codec.key_encoder() {
            Some(keys) if keys.matches(TypeId::of::<T>()) => keys.encode(key, self),
            _ => Err(JsonError::without_span(JsonErrorKind::UnsupportedMapKey {
                type_name: type_name::<T>(),
            })),
        }
    }
}

/// Member writer handed out by [`Encoder::encode_object`].
pub struct ObjectWriter<'e, 'codec> {
    enc: &'e mut Encoder<'codec>,
    first: bool,
}

impl ObjectWriter<'_, '_> {
    /// Write one `"name": value` member.
    pub fn field<T: Encode + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        if !self.first {
            self.enc.out.push(b',');
        }
        self.first = false;
        self.enc.write_str(name);
        self.enc.out.push(b':');
        value.encode(self.enc)
    }

    /// Like [`ObjectWriter::field`], but skips values reporting
    /// [`Encode::is_empty`].
    pub fn field_omit_empty<T: Encode + ?Sized>(&mut self, name: &str, value: &T) -> Result<()> {
        if value.is_empty() {
            return Ok(());
        }
        self.field(name, value)
    }
}

fn non_finite(value: impl core::fmt::Display) -> JsonError {
    JsonError::without_span(JsonErrorKind::InvalidValue {
        message: alloc::format!("{value} cannot be represented in JSON"),
    })
}

/// Encode `value` into a fresh string using `codec`.
pub(crate) fn encode_to_string<T: Encode + ?Sized>(codec: &Codec, value: &T) -> Result<String> {
    let mut enc = Encoder::new(codec);
    value.encode(&mut enc)?;
    String::from_utf8(enc.finish()).map_err(|_| {
        JsonError::without_span(JsonErrorKind::InvalidValue {
            message: "encoder produced invalid UTF-8".into(),
        })
    })
}
