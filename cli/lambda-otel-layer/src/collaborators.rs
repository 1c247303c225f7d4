//! Seams to the outside world used by the instrumentation core.
//!
//! The core never talks to AWS directly. It asks a [`TargetRegion`] for the
//! deployment region and a [`LayerVersionLookup`] to confirm that an explicitly
//! requested layer version exists. The AWS-backed implementations live in
//! [`crate::aws_setup`].

use async_trait::async_trait;
use thiserror::Error;

use crate::error::BoxError;

/// Provides the region the descriptor is being deployed to.
pub trait TargetRegion: Send + Sync {
    fn region(&self) -> String;
}

impl TargetRegion for String {
    fn region(&self) -> String {
        self.clone()
    }
}

impl TargetRegion for &str {
    fn region(&self) -> String {
        (*self).to_string()
    }
}

/// Failure modes of a layer version lookup.
#[derive(Error, Debug)]
pub enum LookupError {
    /// The layer version does not exist, or the caller may not see it.
    #[error("layer version not found or access denied")]
    NotFound,

    /// Any other failure, e.g. a network or credential problem.
    #[error(transparent)]
    Other(BoxError),
}

/// Confirms the existence of a layer version.
#[async_trait]
pub trait LayerVersionLookup: Send + Sync {
    /// Returns the canonical ARN of the layer version identified by `layer_arn`.
    async fn canonical_arn(&self, layer_arn: &str) -> Result<String, LookupError>;
}
