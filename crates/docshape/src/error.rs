//! Error types for conversion.
//!
//! Every failure here is fatal to the conversion that raised it and is
//! surfaced unchanged to the caller. Validation failures never appear as
//! errors at this layer: the [`bridge`](crate::bridge) reduces them to `false`.
//!
//! # Example
//! ```rust
//! use docshape::ConvertError;
//! use docshape_schema::Kind;
//!
//! let error = ConvertError::unsupported(Kind::Binary);
//! assert_eq!(error.to_string(), "Unsupported schema type: \"binary\"");
//! ```

use docshape_schema::{Kind, SchemaError};
use thiserror::Error;

/// Error raised while initializing a converter or converting a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Conversion was invoked without a definition.
    #[error("Ensure the value you're trying to convert exists!")]
    EmptyInput,

    /// The definition could not be compiled into a schema.
    #[error(transparent)]
    InputShape(#[from] SchemaError),

    /// A node's kind has no field type.
    #[error("Unsupported schema type: \"{kind}\"")]
    UnsupportedType { kind: Kind },

    /// The converter was built without a document model.
    #[error("A document model is required to build a converter")]
    MissingModel,
}

impl ConvertError {
    pub fn unsupported(kind: Kind) -> Self {
        Self::UnsupportedType { kind }
    }

    /// Whether the caller supplied something unusable, as opposed to a
    /// schema this converter cannot represent.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::InputShape(_) | Self::MissingModel)
    }
}

/// Result type alias for conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;
