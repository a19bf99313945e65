use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;

/// Lambda runtime identifiers accepted by this stack.
///
/// Parsing is strict: identifiers outside this set are rejected rather than
/// mapped to a default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Runtime {
    #[default]
    Python39,
    Python310,
    Python311,
    Python312,
    Python313,
    NodeJs18,
    NodeJs20,
    NodeJs22,
    Java11,
    Java17,
    Java21,
    DotNet8,
    Ruby32,
    Ruby33,
    ProvidedAl2,
    ProvidedAl2023,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFamily {
    Python,
    NodeJs,
    Java,
    DotNet,
    Ruby,
    Provided,
}

impl Runtime {
    pub const ALL: [Runtime; 16] = [
        Self::Python39,
        Self::Python310,
        Self::Python311,
        Self::Python312,
        Self::Python313,
        Self::NodeJs18,
        Self::NodeJs20,
        Self::NodeJs22,
        Self::Java11,
        Self::Java17,
        Self::Java21,
        Self::DotNet8,
        Self::Ruby32,
        Self::Ruby33,
        Self::ProvidedAl2,
        Self::ProvidedAl2023,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Python39 => "python3.9",
            Self::Python310 => "python3.10",
            Self::Python311 => "python3.11",
            Self::Python312 => "python3.12",
            Self::Python313 => "python3.13",
            Self::NodeJs18 => "nodejs18.x",
            Self::NodeJs20 => "nodejs20.x",
            Self::NodeJs22 => "nodejs22.x",
            Self::Java11 => "java11",
            Self::Java17 => "java17",
            Self::Java21 => "java21",
            Self::DotNet8 => "dotnet8",
            Self::Ruby32 => "ruby3.2",
            Self::Ruby33 => "ruby3.3",
            Self::ProvidedAl2 => "provided.al2",
            Self::ProvidedAl2023 => "provided.al2023",
        }
    }

    pub fn family(self) -> RuntimeFamily {
        match self {
            Self::Python39
            | Self::Python310
            | Self::Python311
            | Self::Python312
            | Self::Python313 => RuntimeFamily::Python,
            Self::NodeJs18 | Self::NodeJs20 | Self::NodeJs22 => RuntimeFamily::NodeJs,
            Self::Java11 | Self::Java17 | Self::Java21 => RuntimeFamily::Java,
            Self::DotNet8 => RuntimeFamily::DotNet,
            Self::Ruby32 | Self::Ruby33 => RuntimeFamily::Ruby,
            Self::ProvidedAl2 | Self::ProvidedAl2023 => RuntimeFamily::Provided,
        }
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Runtime {
    type Err = SynthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|runtime| runtime.as_str() == trimmed)
            .ok_or_else(|| SynthError::UnsupportedRuntime(value.to_string()))
    }
}

impl TryFrom<String> for Runtime {
    type Error = SynthError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Runtime> for String {
    fn from(runtime: Runtime) -> Self {
        runtime.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_supported_identifier() {
        for runtime in Runtime::ALL {
            let parsed: Runtime = runtime
                .as_str()
                .parse()
                .expect("runtime should parse");
            assert_eq!(parsed, runtime);
        }
    }

    #[test]
    fn rejects_unknown_identifier_without_fallback() {
        let error = "python2.7"
            .parse::<Runtime>()
            .expect_err("runtime should fail");
        assert!(matches!(
            error,
            SynthError::UnsupportedRuntime(ref value) if value == "python2.7"
        ));
    }

    #[test]
    fn deserialization_rejects_unsupported_runtime() {
        let result = serde_json::from_str::<Runtime>("\"go1.x\"");
        assert!(result.is_err());
    }

    #[test]
    fn serializes_as_platform_identifier() {
        let json = serde_json::to_string(&Runtime::ProvidedAl2023)
            .expect("serialize");
        assert_eq!(json, "\"provided.al2023\"");
    }
}
