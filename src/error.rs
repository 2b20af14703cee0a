use thiserror::Error;

/// Stable error codes for build-time violations (FN1001..)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RequiredFieldMissing = 1001,
    NullElementInList = 1002,
    TypeMismatch = 1003,
    ReferenceTypeViolation = 1004,
    InvalidReference = 1005,
    InvalidPrimitive = 1006,
    NestedContained = 1007,
    EmptyElement = 1008,
    UnknownModifierExtension = 1009,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FN{:04}", *self as u32)
    }
}

/// The single constraint a node failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    RequiredFieldMissing {
        field: String,
    },
    NullElementInList {
        field: String,
        index: usize,
    },
    TypeMismatch {
        field: String,
        found: String,
        expected: Vec<String>,
    },
    ReferenceTypeViolation {
        field: String,
        found: String,
        allowed: Vec<String>,
    },
    InvalidReference {
        field: String,
        reference: String,
        reason: String,
    },
    InvalidPrimitive {
        /// Set when the primitive is a child of the failing node
        field: Option<String>,
        type_name: String,
        value: String,
    },
    NestedContained {
        index: usize,
    },
    EmptyElement {
        type_name: String,
    },
    UnknownModifierExtension {
        url: String,
    },
}

impl ViolationKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            ViolationKind::RequiredFieldMissing { .. } => ErrorCode::RequiredFieldMissing,
            ViolationKind::NullElementInList { .. } => ErrorCode::NullElementInList,
            ViolationKind::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            ViolationKind::ReferenceTypeViolation { .. } => ErrorCode::ReferenceTypeViolation,
            ViolationKind::InvalidReference { .. } => ErrorCode::InvalidReference,
            ViolationKind::InvalidPrimitive { .. } => ErrorCode::InvalidPrimitive,
            ViolationKind::NestedContained { .. } => ErrorCode::NestedContained,
            ViolationKind::EmptyElement { .. } => ErrorCode::EmptyElement,
            ViolationKind::UnknownModifierExtension { .. } => ErrorCode::UnknownModifierExtension,
        }
    }

    /// Field the violation is attached to, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ViolationKind::RequiredFieldMissing { field }
            | ViolationKind::NullElementInList { field, .. }
            | ViolationKind::TypeMismatch { field, .. }
            | ViolationKind::ReferenceTypeViolation { field, .. }
            | ViolationKind::InvalidReference { field, .. } => Some(field.as_str()),
            ViolationKind::InvalidPrimitive { field, .. } => field.as_deref(),
            ViolationKind::NestedContained { .. } => Some("contained"),
            ViolationKind::UnknownModifierExtension { .. } => Some("modifierExtension"),
            ViolationKind::EmptyElement { .. } => None,
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::RequiredFieldMissing { field } => {
                write!(f, "Missing required element: '{field}'")
            }
            ViolationKind::NullElementInList { field, index } => {
                write!(f, "Element '{field}' contains an absent value at index {index}")
            }
            ViolationKind::TypeMismatch {
                field,
                found,
                expected,
            } => write!(
                f,
                "Invalid type: {found} for element: '{field}'; must be one of: {}",
                expected.join(", ")
            ),
            ViolationKind::ReferenceTypeViolation {
                field,
                found,
                allowed,
            } => write!(
                f,
                "Resource type found in reference value: '{found}' for element: '{field}' must be one of: {}",
                allowed.join(", ")
            ),
            ViolationKind::InvalidReference {
                field,
                reference,
                reason,
            } => write!(f, "Invalid reference '{reference}' for element: '{field}': {reason}"),
            ViolationKind::InvalidPrimitive {
                type_name, value, ..
            } => {
                write!(f, "Invalid {type_name} value: '{value}'")
            }
            ViolationKind::NestedContained { index } => write!(
                f,
                "Contained resource at index {index} must not contain other resources"
            ),
            ViolationKind::EmptyElement { type_name } => {
                write!(f, "{type_name} element must have a value or children")
            }
            ViolationKind::UnknownModifierExtension { url } => {
                write!(f, "Modifier extension '{url}' is not understood")
            }
        }
    }
}

/// First violation found while validating a node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} at {path}: {kind}")]
pub struct ValidationError {
    pub code: ErrorCode,
    pub kind: ViolationKind,
    /// Dotted path of the failing element, e.g. `DeviceRequest.code`
    pub path: String,
}

impl ValidationError {
    pub fn new(kind: ViolationKind, path: impl Into<String>) -> Self {
        Self {
            code: kind.code(),
            kind,
            path: path.into(),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.kind.field()
    }

    /// Re-anchor the violation at `node_path`, the location of the failing
    /// node inside a larger tree.
    pub fn relocate(mut self, node_path: &str) -> Self {
        self.path = match self.kind.field() {
            Some(field) => format!("{node_path}.{field}"),
            None => node_path.to_string(),
        };
        self
    }
}

#[derive(Error, Debug)]
pub enum FhirNodeError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Unknown type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Concurrency error: {message}")]
    Concurrency { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FhirNodeError {
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unknown_type<S: Into<String>>(type_name: S) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    pub fn schema<S: Into<String>>(message: S) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn concurrency<S: Into<String>>(message: S) -> Self {
        Self::Concurrency {
            message: message.into(),
        }
    }

    /// The validation failure wrapped by this error, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            FhirNodeError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FhirNodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let kind = ViolationKind::RequiredFieldMissing {
            field: "intent".to_string(),
        };
        assert_eq!(kind.code(), ErrorCode::RequiredFieldMissing);
        assert_eq!(format!("{}", kind.code()), "FN1001");
        assert_eq!(format!("{}", ErrorCode::UnknownModifierExtension), "FN1009");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(
            ViolationKind::TypeMismatch {
                field: "code".to_string(),
                found: "string".to_string(),
                expected: vec!["Reference".to_string(), "CodeableConcept".to_string()],
            },
            "DeviceRequest.code",
        );
        assert_eq!(
            err.to_string(),
            "FN1003 at DeviceRequest.code: Invalid type: string for element: 'code'; must be one of: Reference, CodeableConcept"
        );
        assert_eq!(err.field(), Some("code"));
    }

    #[test]
    fn test_relocate_uses_tree_path() {
        let err = ValidationError::new(
            ViolationKind::EmptyElement {
                type_name: "Coding".to_string(),
            },
            "Coding",
        );
        let err = err.relocate("DeviceRequest.reasonCode[0].coding[1]");
        assert_eq!(err.path, "DeviceRequest.reasonCode[0].coding[1]");
        assert!(err.field().is_none());

        let err = ValidationError::new(
            ViolationKind::RequiredFieldMissing {
                field: "status".to_string(),
            },
            "Narrative.status",
        )
        .relocate("DeviceRequest.text");
        assert_eq!(err.path, "DeviceRequest.text.status");
    }
}
