//! Core library for the `lambda-otel-layer` CLI application.
//!
//! This crate attaches the AWS Distro for OpenTelemetry (ADOT) Lambda layer to
//! the functions of a serverless deployment descriptor. For every function with
//! instrumentation enabled it appends the layer matching the function's runtime
//! family and architecture, points `AWS_LAMBDA_EXEC_WRAPPER` at the layer's
//! wrapper script, and, once per run, attaches the X-Ray daemon managed policy.
//!
//! # Configuration
//!
//! ```yaml
//! custom:
//!   lambdaOTEL:
//!     enable: true        # default: false
//!     version: "1-0-1"    # default: bundled per runtime family
//!     xrayPolicy: true    # default: true
//! functions:
//!   hello:
//!     handler: handler.hello
//!     otelEnable: false   # per-function override
//!     otelVersion: "1-0-0"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use lambda_otel_layer::{Augmenter, DeploymentDescriptor, DescriptorFormat};
//! use lambda_otel_layer::aws_setup::{setup_aws_resources, DeploymentRegion, LambdaLayerLookup};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let path = std::path::Path::new("serverless.yml");
//!     let mut descriptor = DeploymentDescriptor::load(path, DescriptorFormat::Yaml)?;
//!     let aws = setup_aws_resources(None, descriptor.provider_region(), None).await?;
//!
//!     let augmenter = Augmenter::new(
//!         DeploymentRegion(aws.region),
//!         LambdaLayerLookup::new(aws.lambda_client),
//!     );
//!     augmenter.instrument_functions(&mut descriptor).await?;
//!     descriptor.save(path, DescriptorFormat::Yaml)?;
//!     Ok(())
//! }
//! ```

pub mod augment;
pub mod aws_setup;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod layer;
pub mod options;
pub mod runtime;

pub use augment::{Augmenter, EXEC_WRAPPER_ENV, XRAY_DAEMON_MANAGED_POLICY};
pub use cli::CliArgs;
pub use collaborators::{LayerVersionLookup, LookupError, TargetRegion};
pub use descriptor::{DeploymentDescriptor, DescriptorError, DescriptorFormat};
pub use error::AugmentError;
pub use options::{FunctionOptions, PluginOptions};
pub use runtime::{Architecture, RuntimeFamily};
