//! Instrumentation driver.
//!
//! Walks the functions of a descriptor in declaration order and attaches the
//! ADOT layer, the exec wrapper variable and, once per run, the X-Ray managed
//! policy. A failure aborts the run; functions processed before the failure
//! keep their changes.

use crate::collaborators::{LayerVersionLookup, TargetRegion};
use crate::descriptor::DeploymentDescriptor;
use crate::error::AugmentError;
use crate::layer::build_layer_reference;
use crate::options::{FunctionOptions, PluginOptions};
use crate::runtime::{Architecture, RuntimeFamily};

/// Managed policy granting the X-Ray daemon write access.
pub const XRAY_DAEMON_MANAGED_POLICY: &str = "arn:aws:iam::aws:policy/AWSXRayDaemonWriteAccess";

/// Environment variable pointing the Lambda runtime at the ADOT wrapper script.
pub const EXEC_WRAPPER_ENV: &str = "AWS_LAMBDA_EXEC_WRAPPER";

/// Attaches ADOT layers to the functions of a deployment descriptor.
pub struct Augmenter<R, L> {
    region: R,
    lookup: L,
}

impl<R, L> Augmenter<R, L>
where
    R: TargetRegion,
    L: LayerVersionLookup,
{
    pub fn new(region: R, lookup: L) -> Self {
        Self { region, lookup }
    }

    /// Instruments every eligible function of `descriptor` in place.
    ///
    /// Not idempotent: running it twice appends the layer and the policy again.
    pub async fn instrument_functions(
        &self,
        descriptor: &mut DeploymentDescriptor,
    ) -> Result<(), AugmentError> {
        if !descriptor.has_functions() {
            tracing::debug!("Descriptor declares no functions, nothing to instrument");
            return Ok(());
        }

        let options = PluginOptions::resolve(descriptor.plugin_section())?;
        tracing::debug!(?options, "Resolved plugin options");

        let provider_runtime = descriptor.provider_runtime().map(str::to_string);
        let provider_architecture = descriptor.provider_architecture().map(str::to_string);
        let region = self.region.region();

        let mut instrumented = 0usize;
        for name in descriptor.function_names()? {
            let Some(mut function) = descriptor.function_mut(&name)? else {
                continue;
            };

            let config = FunctionOptions::resolve(&function, &options)?;
            if !config.otel_enable {
                tracing::debug!(function = %name, "Instrumentation disabled, skipping");
                continue;
            }

            let architecture =
                Architecture::resolve(function.architecture(), provider_architecture.as_deref());
            let family =
                RuntimeFamily::for_function(function.runtime(), provider_runtime.as_deref());

            let layer_arn = build_layer_reference(
                &self.lookup,
                &region,
                family,
                architecture,
                config.otel_version.as_deref(),
            )
            .await?;
            function.push_layer(&layer_arn)?;

            if let Some(wrapper) = family.exec_wrapper() {
                function.set_environment(EXEC_WRAPPER_ENV, wrapper)?;
            }

            tracing::info!(
                function = %name,
                runtime_family = %family,
                architecture = %architecture,
                layer_arn = %layer_arn,
                "Attached OpenTelemetry layer"
            );
            instrumented += 1;
        }

        if instrumented > 0 && options.xray_policy {
            descriptor.push_managed_policy(XRAY_DAEMON_MANAGED_POLICY)?;
            tracing::info!(
                policy = XRAY_DAEMON_MANAGED_POLICY,
                "Attached X-Ray managed policy"
            );
        }

        tracing::debug!(instrumented, "Instrumentation complete");
        Ok(())
    }
}
