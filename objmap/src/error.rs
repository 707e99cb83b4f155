//! Error types for mapping operations

use crate::reflect::ValueType;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, MapperError>;

/// Top-level error returned by mappers, repositories and options
#[derive(Debug)]
pub enum MapperError {
    /// A required input was missing or empty (raised at the call boundary)
    Argument(String),
    /// The operation is not valid in the current state (e.g. adding rules to an active mapper)
    InvalidOperation(String),
    /// Mapping options or an external configuration source are invalid
    Configuration(String),
    /// A member-level rule failed while mapping
    Mapping(MappingFailure),
}

impl MapperError {
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        MapperError::Argument(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        MapperError::InvalidOperation(message.into())
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        MapperError::Configuration(message.into())
    }

    /// Get the mapping failure, if this error came from a rule
    pub fn as_failure(&self) -> Option<&MappingFailure> {
        match self {
            MapperError::Mapping(failure) => Some(failure),
            _ => None,
        }
    }

    /// Whether this is an invalid-operation condition, either raised directly
    /// or as the cause of a mapping failure (null into a non-nullable member)
    pub fn is_invalid_operation(&self) -> bool {
        match self {
            MapperError::InvalidOperation(_) => true,
            MapperError::Mapping(failure) => failure.is_invalid_operation(),
            _ => false,
        }
    }
}

impl std::fmt::Display for MapperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapperError::Argument(msg) => write!(f, "invalid argument: {}", msg),
            MapperError::InvalidOperation(msg) => write!(f, "invalid operation: {}", msg),
            MapperError::Configuration(msg) => write!(f, "invalid mapping configuration: {}", msg),
            MapperError::Mapping(failure) => write!(f, "{}", failure),
        }
    }
}

impl std::error::Error for MapperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MapperError::Mapping(failure) => Some(failure),
            _ => None,
        }
    }
}

impl From<MappingFailure> for MapperError {
    fn from(failure: MappingFailure) -> Self {
        MapperError::Mapping(failure)
    }
}

/// A rule failed while mapping `source_type` into `target_type`
///
/// The target may already hold values written by rules that ran before the
/// failing one; mapping is not transactional.
#[derive(Debug)]
pub struct MappingFailure {
    pub source_type: &'static str,
    pub target_type: &'static str,
    pub source_member: String,
    pub target_member: String,
    pub cause: anyhow::Error,
}

impl MappingFailure {
    /// Whether the underlying cause is a null written into a non-nullable member
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self.cause.downcast_ref::<ConversionError>(),
            Some(ConversionError::NullToNonNullable { .. })
        )
    }

    /// Get the conversion error behind this failure, if any
    pub fn conversion_error(&self) -> Option<&ConversionError> {
        self.cause.downcast_ref::<ConversionError>()
    }
}

impl std::fmt::Display for MappingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to map {}.{} to {}.{}: {:#}",
            self.source_type, self.source_member, self.target_type, self.target_member, self.cause
        )
    }
}

impl std::error::Error for MappingFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

/// Error from converting a single value between member types
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// A null value cannot be stored in a non-nullable member
    NullToNonNullable { target: ValueType },
    /// The value does not fit the target numeric type
    Overflow { value: String, target: ValueType },
    /// Text could not be parsed as the target type
    Parse { value: String, target: ValueType },
    /// No conversion exists between the two kinds
    Unsupported { from: &'static str, to: ValueType },
    /// An accessor was handed an object of the wrong type
    WrongObject { expected: &'static str, found: &'static str },
}

impl ConversionError {
    pub(crate) fn unsupported(value: &crate::reflect::Value, target: &ValueType) -> Self {
        ConversionError::Unsupported {
            from: value.kind(),
            to: target.clone(),
        }
    }
}

impl std::fmt::Display for ConversionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionError::NullToNonNullable { target } => {
                write!(f, "cannot assign null to non-nullable {}", target)
            }
            ConversionError::Overflow { value, target } => {
                write!(f, "value {} is out of range for {}", value, target)
            }
            ConversionError::Parse { value, target } => {
                write!(f, "cannot parse '{}' as {}", value, target)
            }
            ConversionError::Unsupported { from, to } => {
                write!(f, "no conversion from {} to {}", from, to)
            }
            ConversionError::WrongObject { expected, found } => {
                write!(f, "expected a {} object, got {}", expected, found)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

/// Failure of one member copy inside a compiled rule
///
/// Carries the member names of the failing copy so the composite mapper can
/// report them instead of the compiled rule's synthetic name.
#[derive(Debug)]
pub(crate) struct MemberFailure {
    pub source_member: String,
    pub target_member: String,
    pub cause: anyhow::Error,
}

impl std::fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}: {:#}", self.source_member, self.target_member, self.cause)
    }
}

impl std::error::Error for MemberFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display_names_members() {
        let failure = MappingFailure {
            source_type: "Person",
            target_type: "PersonDto",
            source_member: "age".to_string(),
            target_member: "age".to_string(),
            cause: anyhow::Error::new(ConversionError::NullToNonNullable {
                target: ValueType::I32,
            }),
        };

        assert_eq!(
            failure.to_string(),
            "failed to map Person.age to PersonDto.age: cannot assign null to non-nullable i32"
        );
        assert!(failure.is_invalid_operation());
        assert!(MapperError::from(failure).is_invalid_operation());
    }

    #[test]
    fn test_other_causes_are_not_invalid_operation() {
        let failure = MappingFailure {
            source_type: "A",
            target_type: "B",
            source_member: "x".into(),
            target_member: "y".into(),
            cause: anyhow::anyhow!("boom"),
        };
        assert!(!failure.is_invalid_operation());
        assert!(failure.conversion_error().is_none());
        assert!(!MapperError::argument("x").is_invalid_operation());
        assert!(MapperError::invalid_operation("frozen").is_invalid_operation());
    }
}
