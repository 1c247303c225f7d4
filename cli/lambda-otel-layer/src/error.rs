//! Error types returned by the instrumentation core.

use std::fmt;
use thiserror::Error;

use crate::runtime::RuntimeFamily;

/// Boxed error produced by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Where a configuration option was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionScope {
    /// The `custom.lambdaOTEL` section of the descriptor.
    Global,
    /// A single entry of the `functions` mapping.
    Function(String),
}

impl fmt::Display for OptionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionScope::Global => write!(f, "custom.lambdaOTEL"),
            OptionScope::Function(name) => write!(f, "functions.{}", name),
        }
    }
}

/// Value type an option is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Boolean,
    String,
    Object,
}

impl fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpectedType::Boolean => "boolean",
            ExpectedType::String => "string",
            ExpectedType::Object => "object",
        };
        f.write_str(name)
    }
}

/// Errors that abort an instrumentation run.
#[derive(Error, Debug)]
pub enum AugmentError {
    /// A recognized option is present with the wrong type.
    #[error("{} must be {expected}", option_path(.scope, .key))]
    TypeConfig {
        scope: OptionScope,
        /// `None` when the whole `custom.lambdaOTEL` section is malformed.
        key: Option<&'static str>,
        expected: ExpectedType,
    },

    /// The explicitly requested layer version does not exist (or is not accessible).
    #[error("LambdaOTEL layer '{arn}' doesn't exist. Check the provided version.")]
    LayerNotFound { arn: String },

    /// A descriptor field the instrumentation writes to has an unusable shape.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Any other failure reported by the layer lookup.
    #[error(transparent)]
    External(BoxError),

    /// The bundled default version table could not be used.
    #[error("Default layer version table is invalid: {0}")]
    VersionTable(String),

    /// The bundled default version table has no entry for a runtime family.
    #[error("No default layer version for runtime family '{0}'")]
    MissingDefaultVersion(RuntimeFamily),
}

fn option_path(scope: &OptionScope, key: &Option<&'static str>) -> String {
    match key {
        Some(key) => format!("{}.{}", scope, key),
        None => scope.to_string(),
    }
}

impl AugmentError {
    pub(crate) fn type_config(
        scope: OptionScope,
        key: &'static str,
        expected: ExpectedType,
    ) -> Self {
        AugmentError::TypeConfig {
            scope,
            key: Some(key),
            expected,
        }
    }
}
