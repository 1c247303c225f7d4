// External Crates
use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::io::Write;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// Internal Crate Imports
use lambda_otel_layer::aws_setup::{setup_aws_resources, DeploymentRegion, LambdaLayerLookup};
use lambda_otel_layer::config::{
    load_and_resolve_config, save_profile_config, OutputTarget, ProfileConfig,
};
use lambda_otel_layer::{Augmenter, CliArgs, DeploymentDescriptor};

/// lambda-otel-layer: Attach the AWS Distro for OpenTelemetry layer to serverless functions.
#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse Args
    let args = CliArgs::parse();

    // 2. Initialize Logging (stderr, stdout may carry the descriptor)
    let log_level = match args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(format!("{}={}", env!("CARGO_CRATE_NAME"), log_level)),
        )
        .init();

    // --- Save Profile Check ---
    if let Some(profile_name) = args.save_profile.as_ref() {
        let profile_to_save = ProfileConfig::from_cli_args(&args);
        save_profile_config(profile_name, &profile_to_save)?;
        eprintln!(
            "Configuration saved to profile '{}'. Exiting.",
            profile_name
        );
        return Ok(());
    }

    // 3. Resolve Configuration (CLI > profile > global)
    let config = load_and_resolve_config(&args)?;
    tracing::debug!("Starting lambda-otel-layer with configuration: {:?}", config);

    // 4. Load Descriptor
    let mut descriptor = DeploymentDescriptor::load(&config.descriptor, config.input_format())
        .with_context(|| {
            format!(
                "Failed to load deployment descriptor '{}'",
                config.descriptor.display()
            )
        })?;

    // 5. AWS Setup (Config, Region, Lambda client)
    let aws_result = setup_aws_resources(
        config.aws_region.as_deref(),
        descriptor.provider_region(),
        config.aws_profile.as_deref(),
    )
    .await?;
    tracing::debug!(region = %aws_result.region, "Resolved deployment region");

    // 6. Instrument Functions
    let augmenter = Augmenter::new(
        DeploymentRegion(aws_result.region),
        LambdaLayerLookup::new(aws_result.lambda_client),
    );
    augmenter
        .instrument_functions(&mut descriptor)
        .await
        .context("Failed to instrument functions")?;

    // 7. Write Result
    let rendered = descriptor
        .render(config.format)
        .context("Failed to render instrumented descriptor")?;
    match &config.output {
        OutputTarget::Stdout => {
            std::io::stdout()
                .write_all(rendered.as_bytes())
                .context("Failed to write descriptor to stdout")?;
        }
        OutputTarget::File(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write descriptor to '{}'", path.display()))?;
            eprintln!(
                "{} Instrumented descriptor written to {}",
                "✔".green(),
                path.display().to_string().bold()
            );
        }
    }

    tracing::debug!("lambda-otel-layer finished successfully.");
    Ok(())
}
