//! Manages configuration loading, parsing, and merging for `lambda-otel-layer`.
//!
//! This module defines structures for representing the configuration file
//! (`.lambda-otel-layer.toml`), individual profiles within that file, and the final
//! `EffectiveConfig` that results from merging CLI arguments and profile settings.
//!
//! Precedence order: CLI arguments > Profile settings > Global settings > defaults.

use crate::cli::{CliArgs, STDOUT_PATH};
use crate::descriptor::DescriptorFormat;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, io::Write, path::Path, path::PathBuf};

// Default filename for the configuration
const CONFIG_TOML: &str = ".lambda-otel-layer.toml";

/// Represents the entire structure of the .lambda-otel-layer.toml file.
#[derive(Debug, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub global: Option<ProfileConfig>,

    #[serde(default)]
    pub profiles: IndexMap<String, ProfileConfig>,
}

/// Settings stored in a profile (or the global section).
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    #[serde(rename = "aws-region", skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    #[serde(rename = "aws-profile", skip_serializing_if = "Option::is_none")]
    pub aws_profile: Option<String>,
    #[serde(rename = "format", skip_serializing_if = "Option::is_none")]
    pub format: Option<DescriptorFormat>,
    #[serde(rename = "in-place", skip_serializing_if = "Option::is_none")]
    pub in_place: Option<bool>,
}

/// Where the instrumented descriptor is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Represents the final, merged configuration after applying precedence rules.
#[derive(Debug, Clone)]
pub struct EffectiveConfig {
    pub descriptor: PathBuf,
    pub output: OutputTarget,
    /// Format used to write the result.
    pub format: DescriptorFormat,
    pub aws_region: Option<String>,
    pub aws_profile: Option<String>,
    pub verbose: u8,
}

impl EffectiveConfig {
    /// Format used to read the descriptor, always inferred from its file name.
    pub fn input_format(&self) -> DescriptorFormat {
        DescriptorFormat::from_path(&self.descriptor)
    }
}

impl ProfileConfig {
    /// Creates a ProfileConfig from CliArgs, only including values that were set.
    pub fn from_cli_args(args: &CliArgs) -> Self {
        ProfileConfig {
            aws_region: args.aws_region.clone(),
            aws_profile: args.aws_profile.clone(),
            format: args.format,
            in_place: Some(args.in_place).filter(|&f| f),
        }
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(PathBuf::from(CONFIG_TOML))
}

pub fn load_and_resolve_config(cli_args: &CliArgs) -> Result<EffectiveConfig> {
    let config_path = get_config_path()?;
    resolve_config_at(&config_path, cli_args)
}

fn resolve_config_at(config_path: &Path, cli_args: &CliArgs) -> Result<EffectiveConfig> {
    let mut merged = ProfileConfig::default();

    if let Some(profile_name) = cli_args.config_profile.as_deref() {
        if !config_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration profile '{}' requested but config file '{}' does not exist",
                profile_name,
                config_path.display()
            ));
        }
        let config_file = load_config_file(config_path)?;
        if let Some(global_config) = &config_file.global {
            merged = merge_into_profile_config(&merged, global_config);
        }
        let Some(profile_config) = config_file.profiles.get(profile_name) else {
            return Err(anyhow::anyhow!(
                "Configuration profile '{}' not found in config file '{}'",
                profile_name,
                config_path.display()
            ));
        };
        merged = merge_into_profile_config(&merged, profile_config);
        tracing::info!(profile = %profile_name, "Loaded configuration from profile");
    }

    merged = merge_into_profile_config(&merged, &ProfileConfig::from_cli_args(cli_args));
    Ok(to_effective(cli_args, &merged))
}

fn to_effective(cli_args: &CliArgs, merged: &ProfileConfig) -> EffectiveConfig {
    let output = if merged.in_place.unwrap_or(false) && cli_args.output.is_none() {
        OutputTarget::File(cli_args.descriptor.clone())
    } else {
        match cli_args.output.as_deref() {
            Some(path) if path != Path::new(STDOUT_PATH) => OutputTarget::File(path.to_path_buf()),
            _ => OutputTarget::Stdout,
        }
    };

    let format = merged.format.unwrap_or_else(|| match &output {
        // A new file gets the format its name implies.
        OutputTarget::File(path) if path != &cli_args.descriptor => DescriptorFormat::from_path(path),
        _ => DescriptorFormat::from_path(&cli_args.descriptor),
    });

    EffectiveConfig {
        descriptor: cli_args.descriptor.clone(),
        output,
        format,
        aws_region: merged.aws_region.clone(),
        aws_profile: merged.aws_profile.clone(),
        verbose: cli_args.verbose,
    }
}

pub fn load_or_default_config_file(path: &Path) -> Result<ConfigFile> {
    if path.exists() {
        load_config_file(path)
    } else {
        Ok(ConfigFile::default())
    }
}

pub fn save_profile_config(profile_name: &str, profile_data: &ProfileConfig) -> Result<()> {
    let config_path = get_config_path()?;
    save_profile_config_at(&config_path, profile_name, profile_data)
}

fn save_profile_config_at(
    config_path: &Path,
    profile_name: &str,
    profile_data: &ProfileConfig,
) -> Result<()> {
    let mut config = load_or_default_config_file(config_path)?;
    config
        .profiles
        .insert(profile_name.to_string(), profile_data.clone());
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize configuration to TOML")?;
    let mut file = fs::File::create(config_path).with_context(|| {
        format!(
            "Failed to create or open config file for writing: {}",
            config_path.display()
        )
    })?;
    file.write_all(toml_string.as_bytes())
        .with_context(|| format!("Failed to write to config file: {}", config_path.display()))?;
    Ok(())
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML from config file: {}", path.display()))?;
    Ok(config)
}

pub fn merge_into_profile_config(base: &ProfileConfig, overrides: &ProfileConfig) -> ProfileConfig {
    ProfileConfig {
        aws_region: overrides
            .aws_region
            .clone()
            .or_else(|| base.aws_region.clone()),
        aws_profile: overrides
            .aws_profile
            .clone()
            .or_else(|| base.aws_profile.clone()),
        format: overrides.format.or(base.format),
        in_place: overrides.in_place.or(base.in_place),
    }
}
