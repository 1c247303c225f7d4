//! ADOT Lambda layer references.
//!
//! Layers are published by the AWS Distro for OpenTelemetry account under
//! `aws-otel-<family>-<arch>-ver-<version>`. Latest versions are listed at
//! <https://github.com/aws-observability/aws-otel-lambda>.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::collaborators::{LayerVersionLookup, LookupError};
use crate::error::AugmentError;
use crate::runtime::{Architecture, RuntimeFamily};

/// Account publishing the ADOT layers.
pub const LAYER_ACCOUNT_ID: &str = "901920570463";

/// Default layer version per runtime family, bundled with the binary.
static DEFAULT_VERSIONS: Lazy<Result<HashMap<String, String>, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("layer_versions.json")).map_err(|e| e.to_string())
});

/// Returns the bundled default version for a runtime family.
pub fn default_version(family: RuntimeFamily) -> Result<&'static str, AugmentError> {
    let versions = DEFAULT_VERSIONS
        .as_ref()
        .map_err(|e| AugmentError::VersionTable(e.clone()))?;
    versions
        .get(family.as_str())
        .map(String::as_str)
        .ok_or(AugmentError::MissingDefaultVersion(family))
}

/// Formats a layer ARN. No validation is performed.
pub fn layer_arn(
    region: &str,
    family: RuntimeFamily,
    architecture: Architecture,
    version: &str,
) -> String {
    format!(
        "arn:aws:lambda:{}:{}:layer:aws-otel-{}-{}-ver-{}:1",
        region, LAYER_ACCOUNT_ID, family, architecture, version
    )
}

/// Builds the layer reference for a function.
///
/// Without an explicit version the bundled default is used as is. With one,
/// the constructed ARN is confirmed through `lookup` and replaced by the
/// canonical ARN it returns.
pub async fn build_layer_reference<L>(
    lookup: &L,
    region: &str,
    family: RuntimeFamily,
    architecture: Architecture,
    explicit_version: Option<&str>,
) -> Result<String, AugmentError>
where
    L: LayerVersionLookup + ?Sized,
{
    // An empty version string means "not set".
    let Some(version) = explicit_version.filter(|v| !v.is_empty()) else {
        let arn = layer_arn(region, family, architecture, default_version(family)?);
        tracing::debug!(layer_arn = %arn, "Using default layer version");
        return Ok(arn);
    };

    let arn = layer_arn(region, family, architecture, version);
    tracing::debug!(layer_arn = %arn, "Checking explicit layer version");
    match lookup.canonical_arn(&arn).await {
        Ok(canonical) => {
            if canonical != arn {
                tracing::debug!(requested = %arn, canonical = %canonical, "Using canonical layer ARN");
            }
            Ok(canonical)
        }
        Err(LookupError::NotFound) => Err(AugmentError::LayerNotFound { arn }),
        Err(LookupError::Other(source)) => Err(AugmentError::External(source)),
    }
}
