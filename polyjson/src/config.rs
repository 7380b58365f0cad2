//! Codec configuration and the top-level decode/encode entry points.

use alloc::string::String;
use alloc::vec::Vec;

use crate::encoder::encode_to_string;
use crate::{Decode, Decoder, Encode, Encoder, KeyAsStringEncoder, Registry, Result};

/// Options for decoding.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Maximum nesting of objects and arrays (default and ceiling:
    /// [`DecodeOptions::MAX_DEPTH`])
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    /// Highest nesting limit a decode will honor.
    ///
    /// Every nested object costs several stack frames, so deeper input
    /// could exhaust a default-sized thread stack before any limit check
    /// ran. Larger settings are clamped to this value.
    pub const MAX_DEPTH: usize = 128;

    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit, clamped to [`DecodeOptions::MAX_DEPTH`].
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = clamp_depth(max_depth);
        self
    }

    /// The limit a decode enforces.
    pub const fn depth_limit(&self) -> usize {
        clamp_depth(self.max_depth)
    }
}

const fn clamp_depth(max_depth: usize) -> usize {
    if max_depth > DecodeOptions::MAX_DEPTH {
        DecodeOptions::MAX_DEPTH
    } else {
        max_depth
    }
}

/// Options for encoding.
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Write map entries ordered by their encoded key (default: false)
    pub sort_map_keys: bool,

    /// Escape `<`, `>` and `&` as `\u003c`, `\u003e`, `\u0026` (default: false)
    pub escape_html: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn sort_map_keys(mut self, sort: bool) -> Self {
        self.sort_map_keys = sort;
        self
    }

    pub const fn escape_html(mut self, escape: bool) -> Self {
        self.escape_html = escape;
        self
    }
}

/// An immutable codec configuration: interface bindings, the map-key
/// encoder and decode/encode options.
///
/// A `Codec` is built once and shared; every decode or encode call keeps
/// its own cursor or buffer.
#[derive(Debug, Default)]
pub struct Codec {
    registry: Registry,
    key_encoder: Option<KeyAsStringEncoder>,
    decode: DecodeOptions,
    encode: EncodeOptions,
}

impl Codec {
    pub fn builder() -> CodecBuilder {
        CodecBuilder::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn key_encoder(&self) -> Option<&KeyAsStringEncoder> {
        self.key_encoder.as_ref()
    }

    pub fn decode_options(&self) -> &DecodeOptions {
        &self.decode
    }

    pub fn encode_options(&self) -> &EncodeOptions {
        &self.encode
    }

    /// Decode a `T` from a JSON string.
    ///
    /// Errors carry the input so they render with a source snippet.
    pub fn from_str<T: Decode + Default>(&self, input: &str) -> Result<T> {
        self.from_slice(input.as_bytes())
            .map_err(|err| err.with_source(input))
    }

    /// Decode a `T` from JSON bytes.
    pub fn from_slice<T: Decode + Default>(&self, input: &[u8]) -> Result<T> {
        let mut value = T::default();
        self.decode_into(input, &mut value)?;
        Ok(value)
    }

    /// Decode JSON bytes into an existing value.
    ///
    /// Interface slots already holding an instance are decoded into
    /// rather than replaced.
    pub fn decode_into<T: Decode + ?Sized>(&self, input: &[u8], value: &mut T) -> Result<()> {
        let mut de = Decoder::new(input, self);
        value.decode(&mut de)?;
        de.finish()
    }

    /// Encode `value` as a JSON string.
    pub fn to_string<T: Encode + ?Sized>(&self, value: &T) -> Result<String> {
        encode_to_string(self, value)
    }

    /// Encode `value` as JSON bytes.
    pub fn to_vec<T: Encode + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let mut enc = Encoder::new(self);
        value.encode(&mut enc)?;
        Ok(enc.finish())
    }
}

/// Builder for [`Codec`].
#[derive(Debug, Default)]
pub struct CodecBuilder {
    codec: Codec,
}

impl CodecBuilder {
    /// Use `registry` for interface bindings.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.codec.registry = registry;
        self
    }

    /// Encode non-primitive map keys through `keys`.
    pub fn key_encoder(mut self, keys: KeyAsStringEncoder) -> Self {
        self.codec.key_encoder = Some(keys);
        self
    }

    pub fn decode_options(mut self, options: DecodeOptions) -> Self {
        self.codec.decode = options;
        self
    }

    pub fn encode_options(mut self, options: EncodeOptions) -> Self {
        self.codec.encode = options;
        self
    }

    /// Set the nesting limit, clamped to [`DecodeOptions::MAX_DEPTH`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.codec.decode.max_depth = clamp_depth(max_depth);
        self
    }

    pub fn sort_map_keys(mut self, sort: bool) -> Self {
        self.codec.encode.sort_map_keys = sort;
        self
    }

    pub fn escape_html(mut self, escape: bool) -> Self {
        self.codec.encode.escape_html = escape;
        self
    }

    pub fn build(self) -> Codec {
        self.codec
    }
}
