//! AWS SDK setup and the AWS-backed collaborators.
//!
//! This module is responsible for:
//! 1. Resolving the deployment region (explicit override, descriptor, fallback).
//! 2. Loading the AWS configuration, optionally for a named profile.
//! 3. Checking layer versions with `lambda:GetLayerVersionByArn`.

use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_lambda::Client as LambdaClient;

use crate::collaborators::{LayerVersionLookup, LookupError, TargetRegion};

/// Region used when nothing else provides one.
pub const FALLBACK_REGION: &str = "us-east-1";

/// Error codes meaning the layer version is not visible to the caller.
///
/// Lambda answers `AccessDeniedException` for layer versions that do not exist
/// in a foreign account, and `ResourceNotFoundException` within the same account.
const LAYER_NOT_FOUND_CODES: [&str; 2] = ["AccessDeniedException", "ResourceNotFoundException"];

pub struct AwsSetupResult {
    pub lambda_client: LambdaClient,
    pub region: String,
}

/// The region the descriptor will be deployed to.
#[derive(Debug, Clone)]
pub struct DeploymentRegion(pub String);

impl TargetRegion for DeploymentRegion {
    fn region(&self) -> String {
        self.0.clone()
    }
}

/// Picks the deployment region: `aws_region` (CLI or config profile), then the
/// descriptor's `provider.region`, then [`FALLBACK_REGION`].
///
/// The ambient AWS environment (`AWS_REGION`, `~/.aws/config`) is ignored: the
/// layer must live in the region the stack is deployed to.
pub fn resolve_deployment_region(
    aws_region: Option<&str>,
    descriptor_region: Option<&str>,
) -> String {
    aws_region
        .filter(|region| !region.is_empty())
        .or(descriptor_region.filter(|region| !region.is_empty()))
        .unwrap_or(FALLBACK_REGION)
        .to_string()
}

/// Loads the AWS configuration and creates a Lambda client bound to the
/// deployment region (see [`resolve_deployment_region`]).
pub async fn setup_aws_resources(
    aws_region: Option<&str>,
    descriptor_region: Option<&str>,
    aws_profile: Option<&str>,
) -> Result<AwsSetupResult> {
    let region = resolve_deployment_region(aws_region, descriptor_region);

    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.clone()));

    if let Some(profile) = aws_profile {
        config_loader = config_loader.profile_name(profile);
    }

    let aws_config = config_loader.load().await;
    tracing::debug!(region = %region, profile = ?aws_profile, "Loaded AWS config");

    let lambda_client = LambdaClient::new(&aws_config);
    tracing::debug!("Lambda client created.");

    Ok(AwsSetupResult {
        lambda_client,
        region,
    })
}

/// Layer lookup backed by `lambda:GetLayerVersionByArn`.
pub struct LambdaLayerLookup {
    client: LambdaClient,
}

impl LambdaLayerLookup {
    pub fn new(client: LambdaClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LayerVersionLookup for LambdaLayerLookup {
    async fn canonical_arn(&self, layer_arn: &str) -> Result<String, LookupError> {
        match self
            .client
            .get_layer_version_by_arn()
            .arn(layer_arn)
            .send()
            .await
        {
            Ok(output) => output
                .layer_version_arn()
                .map(str::to_string)
                .ok_or_else(|| {
                    LookupError::Other(
                        format!("GetLayerVersionByArn returned no ARN for '{}'", layer_arn).into(),
                    )
                }),
            Err(e) => {
                let code = e
                    .as_service_error()
                    .and_then(|service_error| service_error.meta().code());
                if is_not_found_code(code) {
                    tracing::debug!(layer_arn = %layer_arn, code = ?code, "Layer version not found");
                    Err(LookupError::NotFound)
                } else {
                    Err(LookupError::Other(Box::new(e)))
                }
            }
        }
    }
}

fn is_not_found_code(code: Option<&str>) -> bool {
    code.is_some_and(|code| LAYER_NOT_FOUND_CODES.contains(&code))
}
