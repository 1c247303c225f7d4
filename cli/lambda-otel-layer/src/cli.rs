use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::descriptor::DescriptorFormat;

/// Default descriptor file name.
pub const DEFAULT_DESCRIPTOR: &str = "serverless.yml";

/// Output path meaning "standard output".
pub const STDOUT_PATH: &str = "-";

const USAGE_EXAMPLES: &str = "\
EXAMPLES:
    # Print the instrumented serverless.yml of the current directory
    lambda-otel-layer

    # Instrument a JSON descriptor in place, checking layers in eu-west-1
    lambda-otel-layer serverless.json --in-place -r eu-west-1

    # Write the result to another file, using the credentials of a named profile
    lambda-otel-layer serverless.yml -o .serverless/serverless.yml -p deploy

    # Remember region and profile under the 'prod' profile of .lambda-otel-layer.toml
    lambda-otel-layer -r us-west-2 -p prod-account --save-profile prod";

/// lambda-otel-layer: Attach the AWS Distro for OpenTelemetry layer to serverless functions.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None, after_help = USAGE_EXAMPLES)]
#[clap(group(
    ArgGroup::new("destination")
        .required(false)
        .args(["output", "in_place"]),
))]
pub struct CliArgs {
    /// Deployment descriptor to instrument.
    #[arg(value_name = "DESCRIPTOR", default_value = DEFAULT_DESCRIPTOR)]
    pub descriptor: PathBuf,

    /// Where to write the instrumented descriptor ("-" for stdout, the default).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Overwrite the descriptor file instead of writing elsewhere.
    #[arg(long)]
    pub in_place: bool,

    /// Output format. Defaults to the format of the descriptor file.
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<DescriptorFormat>,

    /// AWS Region to deploy to. Overrides `provider.region` of the descriptor.
    #[arg(short = 'r', long = "aws-region")]
    pub aws_region: Option<String>,

    /// AWS Profile to use. Defaults to environment/profile configuration.
    #[arg(short = 'p', long = "aws-profile")]
    pub aws_profile: Option<String>,

    /// Increase logging verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Load configuration from a specific profile in .lambda-otel-layer.toml.
    #[arg(long)]
    pub config_profile: Option<String>,

    /// Save the current effective command-line arguments to the specified profile in .lambda-otel-layer.toml and exit.
    #[arg(long, value_name = "PROFILE_NAME")]
    pub save_profile: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = CliArgs::try_parse_from(["lambda-otel-layer"]).unwrap();
        assert_eq!(args.descriptor, PathBuf::from(DEFAULT_DESCRIPTOR));
        assert!(args.output.is_none());
        assert!(!args.in_place);
        assert!(args.format.is_none());
        assert!(args.aws_region.is_none());
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_all_arguments() {
        let args = CliArgs::try_parse_from([
            "lambda-otel-layer",
            "stack/serverless.json",
            "-o",
            "out.yml",
            "-f",
            "yaml",
            "-r",
            "eu-west-1",
            "-p",
            "deploy",
            "-vv",
            "--config-profile",
            "prod",
        ])
        .unwrap();
        assert_eq!(args.descriptor, PathBuf::from("stack/serverless.json"));
        assert_eq!(args.output, Some(PathBuf::from("out.yml")));
        assert_eq!(args.format, Some(DescriptorFormat::Yaml));
        assert_eq!(args.aws_region.as_deref(), Some("eu-west-1"));
        assert_eq!(args.aws_profile.as_deref(), Some("deploy"));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config_profile.as_deref(), Some("prod"));
    }

    #[test]
    fn test_output_conflicts_with_in_place() {
        let result =
            CliArgs::try_parse_from(["lambda-otel-layer", "--in-place", "-o", "other.yml"]);
        assert!(result.is_err());
    }
}
