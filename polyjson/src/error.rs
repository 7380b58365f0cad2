//! Error types for decoding, encoding and type registration.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::fmt::{self, Display};

use crate::Span;
use crate::scanner::{ScanError, ScanErrorKind};

/// Error type for every fallible polyjson operation.
#[derive(Debug)]
pub struct JsonError {
    /// The specific kind of error
    pub(crate) kind: JsonErrorKind,
    /// Source span where the error occurred
    pub(crate) span: Option<Span>,
    /// The source input (for diagnostics)
    pub(crate) source_code: Option<String>,
}

impl JsonError {
    /// Create a new error with span information
    pub const fn new(kind: JsonErrorKind, span: Span) -> Self {
        JsonError {
            kind,
            span: Some(span),
            source_code: None,
        }
    }

    /// Create an error without span information
    pub const fn without_span(kind: JsonErrorKind) -> Self {
        JsonError {
            kind,
            span: None,
            source_code: None,
        }
    }

    /// Returns a reference to the error kind for detailed error inspection.
    pub fn kind(&self) -> &JsonErrorKind {
        &self.kind
    }

    /// Source span the error points at, if known.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    /// Attach source code for rich diagnostics
    pub fn with_source(mut self, source: &str) -> Self {
        self.source_code = Some(source.to_string());
        self
    }

    /// Attach a span unless one is already present.
    pub(crate) fn or_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }
}

impl Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for JsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            JsonErrorKind::KeyDecode { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ScanError> for JsonError {
    fn from(err: ScanError) -> Self {
        JsonError::new(JsonErrorKind::Scan(err.kind), err.span)
    }
}

/// Specific error kinds.
#[derive(Debug)]
#[non_exhaustive]
pub enum JsonErrorKind {
    /// Tokenizer error
    Scan(ScanErrorKind),
    /// Unexpected token
    UnexpectedToken {
        /// The token that was found
        got: &'static str,
        /// What was expected instead
        expected: &'static str,
    },
    /// Content after the top-level value
    TrailingCharacters,
    /// Number does not fit the target type
    NumberOutOfRange {
        /// The numeric text that was out of range
        value: String,
        /// The target type that couldn't hold the value
        target_type: &'static str,
    },
    /// Nesting deeper than the configured limit
    DepthLimitExceeded {
        /// The configured limit
        limit: usize,
    },
    /// Invalid value for the target type
    InvalidValue {
        /// Description of why the value is invalid
        message: String,
    },

    /// An interface binding could not be registered
    RegistrationInvalid {
        /// Interface being bound
        interface: &'static str,
        /// What was wrong with the registration
        reason: String,
    },
    /// A polymorphic slot was decoded but its interface has no binding
    UnboundInterface {
        /// Interface that has no binding
        interface: &'static str,
    },
    /// The stream failed while looking ahead for the discriminator
    DiscriminatorScan {
        /// Interface being decoded
        interface: &'static str,
        /// Discriminator field name
        field: String,
        /// Underlying tokenizer failure
        error: ScanErrorKind,
    },
    /// The object has no discriminator field
    DiscriminatorMissing {
        /// Interface being decoded
        interface: &'static str,
        /// Discriminator field name
        field: String,
    },
    /// The discriminator field is present but not a string
    DiscriminatorTypeInvalid {
        /// Interface being decoded
        interface: &'static str,
        /// Discriminator field name
        field: String,
        /// Raw JSON text of the value found
        found: String,
    },
    /// The discriminator names no registered variant
    UnknownVariant {
        /// Interface being decoded
        interface: &'static str,
        /// Discriminator value found
        value: String,
    },
    /// The container slot cannot receive a new instance
    UnsupportedContainer {
        /// Interface being decoded
        interface: &'static str,
        /// What was wrong with the slot
        detail: String,
    },
    /// A polymorphic map key failed to decode
    KeyDecode {
        /// Interface of the key
        interface: &'static str,
        /// The key text
        key: String,
        /// Underlying failure
        source: Box<JsonError>,
    },
    /// A map key type has no string encoding configured
    UnsupportedMapKey {
        /// Rust type name of the key
        type_name: &'static str,
    },
}

impl Display for JsonErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonErrorKind::Scan(e) => write!(f, "{e}"),
            JsonErrorKind::UnexpectedToken { got, expected } => {
                write!(f, "unexpected token: got {got}, expected {expected}")
            }
            JsonErrorKind::TrailingCharacters => write!(f, "trailing characters after value"),
            JsonErrorKind::NumberOutOfRange { value, target_type } => {
                write!(f, "number `{value}` out of range for {target_type}")
            }
            JsonErrorKind::DepthLimitExceeded { limit } => {
                write!(f, "nesting depth exceeds limit of {limit}")
            }
            JsonErrorKind::InvalidValue { message } => write!(f, "invalid value: {message}"),
            JsonErrorKind::RegistrationInvalid { interface, reason } => {
                write!(f, "cannot bind `{interface}`: {reason}")
            }
            JsonErrorKind::UnboundInterface { interface } => {
                write!(f, "no type mapping registered for `{interface}`")
            }
            JsonErrorKind::DiscriminatorScan {
                interface,
                field,
                error,
            } => write!(
                f,
                "error [{error}] trying to locate type field '{field}' when decoding `{interface}`"
            ),
            JsonErrorKind::DiscriminatorMissing { interface, field } => {
                write!(f, "type field '{field}' not found when decoding `{interface}`")
            }
            JsonErrorKind::DiscriminatorTypeInvalid {
                interface,
                field,
                found,
            } => write!(
                f,
                "type field '{field}' must be a string when decoding `{interface}`, found {found}"
            ),
            JsonErrorKind::UnknownVariant { interface, value } => {
                write!(f, "type '{value}' not found for `{interface}`")
            }
            JsonErrorKind::UnsupportedContainer { interface, detail } => {
                write!(f, "cannot place `{interface}` value: {detail}")
            }
            JsonErrorKind::KeyDecode {
                interface,
                key,
                source,
            } => write!(f, "map key {key:?} for `{interface}`: {source}"),
            JsonErrorKind::UnsupportedMapKey { type_name } => {
                write!(f, "map key type `{type_name}` has no string encoding")
            }
        }
    }
}

impl JsonErrorKind {
    /// Get an error code for this kind of error.
    pub const fn code(&self) -> &'static str {
        match self {
            JsonErrorKind::Scan(_) => "polyjson::scan",
            JsonErrorKind::UnexpectedToken { .. } => "polyjson::unexpected_token",
            JsonErrorKind::TrailingCharacters => "polyjson::trailing_characters",
            JsonErrorKind::NumberOutOfRange { .. } => "polyjson::number_out_of_range",
            JsonErrorKind::DepthLimitExceeded { .. } => "polyjson::depth_limit",
            JsonErrorKind::InvalidValue { .. } => "polyjson::invalid_value",
            JsonErrorKind::RegistrationInvalid { .. } => "polyjson::registration_invalid",
            JsonErrorKind::UnboundInterface { .. } => "polyjson::unbound_interface",
            JsonErrorKind::DiscriminatorScan { .. } => "polyjson::discriminator_scan",
            JsonErrorKind::DiscriminatorMissing { .. } => "polyjson::discriminator_missing",
            JsonErrorKind::DiscriminatorTypeInvalid { .. } => {
                "polyjson::discriminator_type_invalid"
            }
            JsonErrorKind::UnknownVariant { .. } => "polyjson::unknown_variant",
            JsonErrorKind::UnsupportedContainer { .. } => "polyjson::unsupported_container",
            JsonErrorKind::KeyDecode { .. } => "polyjson::key_decode",
            JsonErrorKind::UnsupportedMapKey { .. } => "polyjson::unsupported_map_key",
        }
    }

    /// Get a label describing where/what the error points to.
    pub fn label(&self) -> String {
        match self {
            JsonErrorKind::Scan(e) => match e {
                ScanErrorKind::UnexpectedChar(c) => format!("unexpected '{c}'"),
                ScanErrorKind::UnexpectedEof(ctx) => format!("unexpected end of input {ctx}"),
                ScanErrorKind::InvalidUtf8 => "invalid UTF-8 here".into(),
            },
            JsonErrorKind::UnexpectedToken { expected, .. } => format!("expected {expected}"),
            JsonErrorKind::TrailingCharacters => "unexpected content here".into(),
            JsonErrorKind::NumberOutOfRange { target_type, .. } => {
                format!("out of range for {target_type}")
            }
            JsonErrorKind::DepthLimitExceeded { .. } => "nested too deeply".into(),
            JsonErrorKind::InvalidValue { .. } => "invalid value".into(),
            JsonErrorKind::DiscriminatorScan { field, .. } => {
                format!("malformed object while looking for '{field}'")
            }
            JsonErrorKind::DiscriminatorMissing { field, .. } => {
                format!("object has no '{field}' field")
            }
            JsonErrorKind::DiscriminatorTypeInvalid { .. } => "expected a string".into(),
            JsonErrorKind::UnknownVariant { value, .. } => format!("unknown type '{value}'"),
            JsonErrorKind::KeyDecode { .. } => "in this map key".into(),
            _ => "error occurred here".into(),
        }
    }
}

impl miette::Diagnostic for JsonError {
    fn code<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.source_code
            .as_ref()
            .map(|s| s as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(core::iter::once(miette::LabeledSpan::at(
            span,
            self.kind.label(),
        ))))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn Display + 'a>> {
        match &self.kind {
            JsonErrorKind::UnboundInterface { .. } => Some(Box::new(
                "bind the interface with RegistryBuilder::bind before decoding",
            )),
            JsonErrorKind::UnsupportedMapKey { .. } => Some(Box::new(
                "configure a KeyAsStringEncoder that covers this key type",
            )),
            _ => None,
        }
    }
}

/// Result type for polyjson operations
pub type Result<T> = core::result::Result<T, JsonError>;
