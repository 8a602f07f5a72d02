use std::fmt;

/// Error category, stable across context rewrites of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingProperty,
    TypeMismatch,
    UnsupportedConverter,
    ConstructionFailure,
    InvalidFieldDeclaration,
    UnknownField,
    Config,
}

/// Conversion error, returned by every `from_array` / `to_array` step.
///
/// All variants are fatal to the call that produced them. The message
/// carries the field path, built up with [`DtoError::with_context`] while
/// the error travels out of nested objects.
#[derive(Debug, thiserror::Error)]
pub enum DtoError {
    #[error("missing property: {0}")]
    MissingProperty(String),

    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    #[error("unsupported converter: {0}")]
    UnsupportedConverter(String),

    #[error("construction failure: {0}")]
    ConstructionFailure(String),

    #[error("invalid field declaration: {0}")]
    InvalidFieldDeclaration(String),

    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("config error: {0}")]
    Config(String),
}

impl DtoError {
    pub fn type_mismatch(field: &str, msg: impl fmt::Display) -> Self {
        DtoError::TypeMismatch(format!("{field}: {msg}"))
    }

    pub fn missing_property(type_name: &str, field: &str) -> Self {
        DtoError::MissingProperty(format!("{type_name}.{field}"))
    }

    /// Constructor was called without a value for a parameter that has no default.
    pub fn missing_argument(type_name: &str, param: &str) -> Self {
        DtoError::ConstructionFailure(format!(
            "{type_name}: no value for constructor parameter '{param}'"
        ))
    }

    pub fn unknown_field(type_name: &str, field: &str) -> Self {
        DtoError::UnknownField(format!("{type_name}.{field}"))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DtoError::MissingProperty(_) => ErrorKind::MissingProperty,
            DtoError::TypeMismatch(_) => ErrorKind::TypeMismatch,
            DtoError::UnsupportedConverter(_) => ErrorKind::UnsupportedConverter,
            DtoError::ConstructionFailure(_) => ErrorKind::ConstructionFailure,
            DtoError::InvalidFieldDeclaration(_) => ErrorKind::InvalidFieldDeclaration,
            DtoError::UnknownField(_) => ErrorKind::UnknownField,
            DtoError::Config(_) => ErrorKind::Config,
        }
    }

    /// Add context to the error, preserving its kind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        let wrap = |msg: String| format!("{ctx}: {msg}");
        match self {
            DtoError::MissingProperty(m) => DtoError::MissingProperty(wrap(m)),
            DtoError::TypeMismatch(m) => DtoError::TypeMismatch(wrap(m)),
            DtoError::UnsupportedConverter(m) => DtoError::UnsupportedConverter(wrap(m)),
            DtoError::ConstructionFailure(m) => DtoError::ConstructionFailure(wrap(m)),
            DtoError::InvalidFieldDeclaration(m) => DtoError::InvalidFieldDeclaration(wrap(m)),
            DtoError::UnknownField(m) => DtoError::UnknownField(wrap(m)),
            DtoError::Config(m) => DtoError::Config(wrap(m)),
        }
    }
}

// ---------------------------------------------------------------------------
// From impls: codec errors → DtoError with the matching kind
// ---------------------------------------------------------------------------

impl From<serde_json::Error> for DtoError {
    fn from(e: serde_json::Error) -> Self {
        DtoError::TypeMismatch(e.to_string())
    }
}

impl From<toml::de::Error> for DtoError {
    fn from(e: toml::de::Error) -> Self {
        DtoError::Config(e.to_string())
    }
}
