//! Runtime family classification and architecture resolution.
//!
//! The ADOT layers are published per runtime family and per CPU architecture.
//! Both are derived from the descriptor, with function-level settings taking
//! precedence over the provider defaults.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime used when neither the function nor the provider declares one.
pub const DEFAULT_RUNTIME: &str = "nodejs12.x";

/// Family of language runtimes sharing a single ADOT layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeFamily {
    Nodejs,
    JavaWrapper,
    Python,
    /// Collector-only layer for runtimes without an auto-instrumentation wrapper.
    Collector,
}

/// Prefix rules, evaluated in order. The first matching prefix wins.
const RUNTIME_PREFIX_RULES: [(&str, RuntimeFamily); 3] = [
    ("nodejs", RuntimeFamily::Nodejs),
    ("java", RuntimeFamily::JavaWrapper),
    ("python", RuntimeFamily::Python),
];

impl RuntimeFamily {
    /// Classifies a runtime identifier such as `nodejs18.x` or `python3.12`.
    pub fn classify(runtime: &str) -> Self {
        RUNTIME_PREFIX_RULES
            .iter()
            .find(|(prefix, _)| runtime.starts_with(prefix))
            .map(|(_, family)| *family)
            .unwrap_or(RuntimeFamily::Collector)
    }

    /// Classifies the effective runtime of a function.
    ///
    /// The function's own `runtime` wins, then the provider's, then [`DEFAULT_RUNTIME`].
    pub fn for_function(function_runtime: Option<&str>, provider_runtime: Option<&str>) -> Self {
        let runtime = function_runtime
            .or(provider_runtime)
            .unwrap_or(DEFAULT_RUNTIME);
        Self::classify(runtime)
    }

    /// Name used in layer ARNs and in the default version table.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeFamily::Nodejs => "nodejs",
            RuntimeFamily::JavaWrapper => "java-wrapper",
            RuntimeFamily::Python => "python",
            RuntimeFamily::Collector => "collector",
        }
    }

    /// Value of `AWS_LAMBDA_EXEC_WRAPPER` for this family, if the layer ships a wrapper.
    pub fn exec_wrapper(&self) -> Option<&'static str> {
        match self {
            RuntimeFamily::Nodejs | RuntimeFamily::JavaWrapper => Some("/opt/otel-handler"),
            RuntimeFamily::Python => Some("/opt/otel-instrument"),
            RuntimeFamily::Collector => None,
        }
    }
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture a layer is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Amd64,
    Arm64,
}

impl Architecture {
    /// Resolves the effective architecture of a function.
    ///
    /// A function-level declaration always overrides the provider, even when it
    /// is not `arm64`. Anything other than `arm64` (`x86_64`, `amd64`, ...) is amd64.
    pub fn resolve(function_arch: Option<&str>, provider_arch: Option<&str>) -> Self {
        match function_arch.or(provider_arch) {
            Some("arm64") => Architecture::Arm64,
            _ => Architecture::Amd64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Architecture::Amd64 => "amd64",
            Architecture::Arm64 => "arm64",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_runtime_prefixes() {
        let test_cases = [
            ("nodejs12.x", RuntimeFamily::Nodejs),
            ("nodejs20.x", RuntimeFamily::Nodejs),
            ("java11", RuntimeFamily::JavaWrapper),
            ("java8.al2", RuntimeFamily::JavaWrapper),
            ("python2.7", RuntimeFamily::Python),
            ("python3.12", RuntimeFamily::Python),
            ("go1.x", RuntimeFamily::Collector),
            ("provided.al2023", RuntimeFamily::Collector),
            ("dotnet8", RuntimeFamily::Collector),
            ("", RuntimeFamily::Collector),
            ("NodeJS18.x", RuntimeFamily::Collector), // prefixes are case-sensitive
        ];

        for (runtime, expected) in test_cases {
            assert_eq!(
                RuntimeFamily::classify(runtime),
                expected,
                "Failed for runtime: {}",
                runtime
            );
        }
    }

    #[test]
    fn test_runtime_resolution_order() {
        assert_eq!(
            RuntimeFamily::for_function(Some("python3.9"), Some("nodejs18.x")),
            RuntimeFamily::Python
        );
        assert_eq!(
            RuntimeFamily::for_function(None, Some("go1.x")),
            RuntimeFamily::Collector
        );
        // nodejs12.x default
        assert_eq!(RuntimeFamily::for_function(None, None), RuntimeFamily::Nodejs);
    }

    #[test]
    fn test_exec_wrapper_per_family() {
        assert_eq!(RuntimeFamily::Nodejs.exec_wrapper(), Some("/opt/otel-handler"));
        assert_eq!(
            RuntimeFamily::JavaWrapper.exec_wrapper(),
            Some("/opt/otel-handler")
        );
        assert_eq!(
            RuntimeFamily::Python.exec_wrapper(),
            Some("/opt/otel-instrument")
        );
        assert_eq!(RuntimeFamily::Collector.exec_wrapper(), None);
    }

    #[test]
    fn test_architecture_resolution() {
        let test_cases = [
            // (function, provider, expected)
            (Some("arm64"), None, Architecture::Arm64),
            (Some("arm64"), Some("x86_64"), Architecture::Arm64),
            (None, Some("arm64"), Architecture::Arm64),
            (Some("x86_64"), Some("arm64"), Architecture::Amd64),
            (Some("amd64"), Some("arm64"), Architecture::Amd64),
            (None, Some("x86_64"), Architecture::Amd64),
            (None, None, Architecture::Amd64),
        ];

        for (function_arch, provider_arch, expected) in test_cases {
            assert_eq!(
                Architecture::resolve(function_arch, provider_arch),
                expected,
                "Failed for function: {:?}, provider: {:?}",
                function_arch,
                provider_arch
            );
        }
    }

    #[test]
    fn test_family_names_match_serde_names() {
        for family in [
            RuntimeFamily::Nodejs,
            RuntimeFamily::JavaWrapper,
            RuntimeFamily::Python,
            RuntimeFamily::Collector,
        ] {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.as_str()));
        }
    }
}
