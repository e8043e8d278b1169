use std::fmt;

/// Kind of a field-scoped bind failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInt,
    /// Unsigned overflow or underflow.
    InvalidUint,
    InvalidFloat,
    InvalidBool,
    InvalidTime,
    /// Malformed key (bad bracket content).
    InvalidPath,
    /// Sequence index beyond the configured limit.
    InvalidIndex,
    /// Uploaded content could not be read or materialized.
    Attachment,
    /// Reported by a registered custom conversion.
    Custom,
}

/// One field-scoped failure. Never aborts traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindError {
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl BindError {
    pub fn new(kind: ErrorKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), kind, message: message.into() }
    }

    pub fn invalid_int(field: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidInt, field, format!("invalid integer {value:?}: {reason}"))
    }

    pub fn invalid_uint(field: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidUint, field, format!("invalid unsigned integer {value:?}: {reason}"))
    }

    pub fn invalid_float(field: &str, value: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidFloat, field, format!("invalid float {value:?}: {reason}"))
    }

    pub fn invalid_bool(field: &str, value: &str) -> Self {
        Self::new(ErrorKind::InvalidBool, field, format!("invalid boolean {value:?}"))
    }

    pub fn invalid_time(field: &str, value: &str) -> Self {
        Self::new(
            ErrorKind::InvalidTime,
            field,
            format!("{value:?} matches no accepted time format"),
        )
    }

    pub fn invalid_path(key: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidPath, key, format!("malformed key: {reason}"))
    }

    pub fn invalid_index(key: &str, index: usize, limit: usize) -> Self {
        Self::new(
            ErrorKind::InvalidIndex,
            key,
            format!("index {index} exceeds the sequence limit of {limit}"),
        )
    }

    pub fn custom(field: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Custom, field, message)
    }

    pub fn attachment(field: &str, reason: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Attachment, field, format!("upload: {reason}"))
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for BindError {}

/// All field failures of one bind call, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateError(pub Vec<BindError>);

impl AggregateError {
    pub fn errors(&self) -> &[BindError] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First error recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&BindError> {
        self.0.iter().find(|e| e.field == field)
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateError {}

/// Result of a `Binder::field` / `Binder::all` call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Fields(AggregateError),

    #[error("non-addressable destination at {field:?}")]
    NonAddressableDestination { field: String },

    #[error("unsupported destination {type_name} at {field:?}")]
    UnsupportedDestinationShape { field: String, type_name: &'static str },
}

impl Error {
    /// Field failures, when this is a `Fields` error.
    pub fn fields(&self) -> Option<&AggregateError> {
        match self {
            Error::Fields(agg) => Some(agg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_message_lists_every_field_in_order() {
        let agg = AggregateError(vec![
            BindError::invalid_bool("a.On", "maybe"),
            BindError::invalid_int("a.Id", "x", "invalid digit found in string"),
        ]);
        assert_eq!(
            agg.to_string(),
            "a.On: invalid boolean \"maybe\"; a.Id: invalid integer \"x\": invalid digit found in string"
        );
        assert_eq!(agg.get("a.Id").map(|e| e.kind), Some(ErrorKind::InvalidInt));
    }
}
