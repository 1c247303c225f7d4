//! Plugin option resolution.
//!
//! Options are declared globally under `custom.lambdaOTEL` and can be overridden
//! per function with `otelEnable` / `otelVersion`. Every present option is
//! type-checked before use; a `null` value counts as present.

use serde_yaml::Value;

use crate::descriptor::FunctionDescriptor;
use crate::error::{AugmentError, ExpectedType, OptionScope};

/// Recognized keys of the global section.
pub mod keys {
    pub const ENABLE: &str = "enable";
    pub const VERSION: &str = "version";
    pub const XRAY_POLICY: &str = "xrayPolicy";
    pub const FUNCTION_ENABLE: &str = "otelEnable";
    pub const FUNCTION_VERSION: &str = "otelVersion";
}

/// Global options resolved from `custom.lambdaOTEL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginOptions {
    /// Default instrumentation toggle for every function.
    pub enable: bool,
    /// Attach the X-Ray daemon managed policy when a function is instrumented.
    pub xray_policy: bool,
    /// Explicit layer version applied to every function.
    pub layer_version: Option<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            enable: false,
            xray_policy: true,
            layer_version: None,
        }
    }
}

impl PluginOptions {
    /// Resolves the global options from the raw `custom.lambdaOTEL` value.
    pub fn resolve(section: Option<&Value>) -> Result<Self, AugmentError> {
        let mut options = PluginOptions::default();

        let section = match section {
            None | Some(Value::Null) => return Ok(options),
            Some(Value::Mapping(section)) => section,
            Some(_) => {
                return Err(AugmentError::TypeConfig {
                    scope: OptionScope::Global,
                    key: None,
                    expected: ExpectedType::Object,
                })
            }
        };

        if let Some(value) = section.get(keys::ENABLE) {
            options.enable = expect_bool(value, OptionScope::Global, keys::ENABLE)?;
        }
        if let Some(value) = section.get(keys::VERSION) {
            options.layer_version =
                Some(expect_string(value, OptionScope::Global, keys::VERSION)?);
        }
        if let Some(value) = section.get(keys::XRAY_POLICY) {
            options.xray_policy = expect_bool(value, OptionScope::Global, keys::XRAY_POLICY)?;
        }

        for key in section.keys().filter_map(Value::as_str) {
            if ![keys::ENABLE, keys::VERSION, keys::XRAY_POLICY].contains(&key) {
                tracing::debug!(key = %key, "Ignoring unknown custom.lambdaOTEL option");
            }
        }

        Ok(options)
    }
}

/// Options of a single function after applying its overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionOptions {
    pub otel_enable: bool,
    pub otel_version: Option<String>,
}

impl FunctionOptions {
    pub fn resolve(
        function: &FunctionDescriptor<'_>,
        global: &PluginOptions,
    ) -> Result<Self, AugmentError> {
        let scope = || OptionScope::Function(function.name().to_string());

        let otel_enable = match function.option(keys::FUNCTION_ENABLE) {
            Some(value) => expect_bool(value, scope(), keys::FUNCTION_ENABLE)?,
            None => global.enable,
        };
        let otel_version = match function.option(keys::FUNCTION_VERSION) {
            Some(value) => Some(expect_string(value, scope(), keys::FUNCTION_VERSION)?),
            None => global.layer_version.clone(),
        };

        Ok(Self {
            otel_enable,
            otel_version,
        })
    }
}

fn expect_bool(value: &Value, scope: OptionScope, key: &'static str) -> Result<bool, AugmentError> {
    value
        .as_bool()
        .ok_or_else(|| AugmentError::type_config(scope, key, ExpectedType::Boolean))
}

fn expect_string(
    value: &Value,
    scope: OptionScope,
    key: &'static str,
) -> Result<String, AugmentError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AugmentError::type_config(scope, key, ExpectedType::String))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DeploymentDescriptor, DescriptorFormat};

    fn section(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_global_defaults() {
        assert_eq!(PluginOptions::resolve(None).unwrap(), PluginOptions::default());
        assert_eq!(
            PluginOptions::resolve(Some(&Value::Null)).unwrap(),
            PluginOptions {
                enable: false,
                xray_policy: true,
                layer_version: None
            }
        );
        assert_eq!(
            PluginOptions::resolve(Some(&section("{}"))).unwrap(),
            PluginOptions::default()
        );
    }

    #[test]
    fn test_global_values() {
        let options = PluginOptions::resolve(Some(&section(
            "{enable: true, version: '2-2-2', xrayPolicy: false, other: 1}",
        )))
        .unwrap();
        assert_eq!(
            options,
            PluginOptions {
                enable: true,
                xray_policy: false,
                layer_version: Some("2-2-2".to_string()),
            }
        );
    }

    #[test]
    fn test_global_type_errors_name_the_key() {
        let test_cases = [
            ("{enable: 'yes'}", "custom.lambdaOTEL.enable must be boolean"),
            ("{version: 9999}", "custom.lambdaOTEL.version must be string"),
            ("{version: null}", "custom.lambdaOTEL.version must be string"),
            ("{xrayPolicy: 1}", "custom.lambdaOTEL.xrayPolicy must be boolean"),
            ("[true]", "custom.lambdaOTEL must be object"),
        ];

        for (yaml, expected) in test_cases {
            let err = PluginOptions::resolve(Some(&section(yaml))).unwrap_err();
            assert!(
                matches!(err, AugmentError::TypeConfig { .. }),
                "Unexpected error for {}: {:?}",
                yaml,
                err
            );
            assert_eq!(err.to_string(), expected, "Failed for section: {}", yaml);
        }
    }

    fn descriptor(function_yaml: &str) -> DeploymentDescriptor {
        let yaml = format!("functions:\n  myFunction:\n{}", function_yaml);
        DeploymentDescriptor::parse(&yaml, DescriptorFormat::Yaml).unwrap()
    }

    #[test]
    fn test_function_inherits_global() {
        let mut descriptor = descriptor("    handler: handler.hello\n");
        let function = descriptor.function_mut("myFunction").unwrap().unwrap();
        let global = PluginOptions {
            enable: true,
            xray_policy: true,
            layer_version: Some("1-1-1".to_string()),
        };

        let options = FunctionOptions::resolve(&function, &global).unwrap();
        assert!(options.otel_enable);
        assert_eq!(options.otel_version.as_deref(), Some("1-1-1"));
    }

    #[test]
    fn test_function_overrides_global() {
        let mut descriptor =
            descriptor("    handler: handler.hello\n    otelEnable: false\n    otelVersion: '3-3-3'\n");
        let function = descriptor.function_mut("myFunction").unwrap().unwrap();
        let global = PluginOptions {
            enable: true,
            xray_policy: true,
            layer_version: Some("2-2-2".to_string()),
        };

        let options = FunctionOptions::resolve(&function, &global).unwrap();
        assert!(!options.otel_enable);
        assert_eq!(options.otel_version.as_deref(), Some("3-3-3"));
    }

    #[test]
    fn test_function_type_errors() {
        let test_cases = [
            ("    otelEnable: 'true'\n", "functions.myFunction.otelEnable must be boolean"),
            ("    otelEnable:\n", "functions.myFunction.otelEnable must be boolean"),
            ("    otelVersion: 123\n", "functions.myFunction.otelVersion must be string"),
        ];

        for (function_yaml, expected) in test_cases {
            let mut descriptor = descriptor(function_yaml);
            let function = descriptor.function_mut("myFunction").unwrap().unwrap();
            let err = FunctionOptions::resolve(&function, &PluginOptions::default()).unwrap_err();
            assert_eq!(err.to_string(), expected, "Failed for: {}", function_yaml);
        }
    }
}
