//! Construction properties for the stack and its two resources.
//!
//! Every field has a documented default so that an empty configuration
//! document produces a valid stack.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::CodeAsset;
use crate::error::SynthError;
use crate::handler::HandlerRef;
use crate::ids::validate_stack_id;
use crate::runtime::Runtime;

pub const DEFAULT_STACK_ID: &str = "TransactionParserCdkAppStack";
pub const DEFAULT_REGION: &str = "us-east-1";
pub const UNKNOWN_ACCOUNT: &str = "unknown-account";
pub const DEFAULT_STAGE_NAME: &str = "prod";
pub const DEFAULT_BOOTSTRAP_QUALIFIER: &str = "hnb659fds";

pub const MIN_MEMORY_SIZE_MB: u32 = 128;
pub const MAX_MEMORY_SIZE_MB: u32 = 10_240;
pub const MAX_TIMEOUT_SECONDS: u32 = 900;

const MAX_TAG_KEY_LENGTH: usize = 128;
const MAX_TAG_VALUE_LENGTH: usize = 256;
const MAX_QUALIFIER_LENGTH: usize = 10;

const RESERVED_FUNCTION_VARIABLES: &[&str] = &[
    "_HANDLER",
    "_X_AMZN_TRACE_ID",
    "AWS_ACCESS_KEY_ID",
    "AWS_DEFAULT_REGION",
    "AWS_EXECUTION_ENV",
    "AWS_LAMBDA_FUNCTION_MEMORY_SIZE",
    "AWS_LAMBDA_FUNCTION_NAME",
    "AWS_LAMBDA_FUNCTION_VERSION",
    "AWS_LAMBDA_INITIALIZATION_TYPE",
    "AWS_LAMBDA_LOG_GROUP_NAME",
    "AWS_LAMBDA_LOG_STREAM_NAME",
    "AWS_LAMBDA_RUNTIME_API",
    "AWS_REGION",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_SESSION_TOKEN",
    "LAMBDA_RUNTIME_DIR",
    "LAMBDA_TASK_ROOT",
];

/// Target account and region of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    pub account: Option<String>,
    pub region: Option<String>,
}

impl Environment {
    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_REGION)
    }

    pub fn account(&self) -> &str {
        self.account.as_deref().unwrap_or(UNKNOWN_ACCOUNT)
    }

    /// Environment string recorded in the assembly manifest.
    pub fn uri(&self) -> String {
        format!("aws://{}/{}", self.account(), self.region())
    }

    pub fn validate(&self) -> Result<(), SynthError> {
        if let Some(account) = &self.account {
            if account.len() != 12 || !account.chars().all(|c| c.is_ascii_digit()) {
                return Err(SynthError::InvalidEnvironment(format!(
                    "account '{account}' must be a 12-digit AWS account id"
                )));
            }
        }
        if let Some(region) = &self.region {
            if !is_region_name(region) {
                return Err(SynthError::InvalidEnvironment(format!(
                    "region '{region}' is not a valid region name"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackProps {
    pub env: Environment,
    pub description: Option<String>,
    pub tags: BTreeMap<String, String>,
    /// Qualifier of the bootstrap stack that owns the asset bucket.
    pub bootstrap_qualifier: String,
}

impl Default for StackProps {
    fn default() -> Self {
        Self {
            env: Environment::default(),
            description: None,
            tags: BTreeMap::new(),
            bootstrap_qualifier: DEFAULT_BOOTSTRAP_QUALIFIER.to_string(),
        }
    }
}

impl StackProps {
    pub fn validate(&self) -> Result<(), SynthError> {
        self.env.validate()?;
        for (key, value) in &self.tags {
            validate_tag(key, value)?;
        }
        let qualifier = &self.bootstrap_qualifier;
        if qualifier.is_empty()
            || qualifier.len() > MAX_QUALIFIER_LENGTH
            || !qualifier
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(SynthError::InvalidEnvironment(format!(
                "bootstrap qualifier '{qualifier}' must be \
                 1-{MAX_QUALIFIER_LENGTH} lowercase alphanumerics"
            )));
        }
        Ok(())
    }

    pub fn asset_bucket(&self) -> String {
        format!(
            "cdk-{}-assets-${{AWS::AccountId}}-${{AWS::Region}}",
            self.bootstrap_qualifier
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionProps {
    pub runtime: Runtime,
    pub code: CodeAsset,
    pub handler: HandlerRef,
    pub memory_size: Option<u32>,
    pub timeout_seconds: Option<u32>,
    pub environment: BTreeMap<String, String>,
}

impl FunctionProps {
    pub fn validate(&self) -> Result<(), SynthError> {
        self.handler.entry_point(self.runtime)?;

        if self.code.path().as_os_str().is_empty() {
            return Err(SynthError::InvalidFunction(
                "code path cannot be empty".to_string(),
            ));
        }

        if let Some(memory) = self.memory_size {
            if !(MIN_MEMORY_SIZE_MB..=MAX_MEMORY_SIZE_MB).contains(&memory) {
                return Err(SynthError::InvalidFunction(format!(
                    "memory_size {memory} must be between \
                     {MIN_MEMORY_SIZE_MB} and {MAX_MEMORY_SIZE_MB} MB"
                )));
            }
        }

        if let Some(timeout) = self.timeout_seconds {
            if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
                return Err(SynthError::InvalidFunction(format!(
                    "timeout_seconds {timeout} must be between 1 and {MAX_TIMEOUT_SECONDS}"
                )));
            }
        }

        for key in self.environment.keys() {
            if !is_variable_name(key) {
                return Err(SynthError::InvalidFunction(format!(
                    "environment variable name '{key}' is invalid"
                )));
            }
            if RESERVED_FUNCTION_VARIABLES.contains(&key.as_str()) {
                return Err(SynthError::InvalidFunction(format!(
                    "environment variable '{key}' is reserved by the runtime"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestApiProps {
    pub stage_name: String,
    pub description: Option<String>,
}

impl Default for RestApiProps {
    fn default() -> Self {
        Self {
            stage_name: DEFAULT_STAGE_NAME.to_string(),
            description: None,
        }
    }
}

impl RestApiProps {
    pub fn validate(&self) -> Result<(), SynthError> {
        if self.stage_name.is_empty()
            || !self
                .stage_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SynthError::InvalidRestApi(format!(
                "stage name '{}' must be non-empty and contain only alphanumerics or '_'",
                self.stage_name
            )));
        }
        Ok(())
    }
}

/// Full configuration of the endpoint stack, as read from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointStackConfig {
    pub stack_id: String,
    #[serde(flatten)]
    pub stack: StackProps,
    pub function: FunctionProps,
    pub api: RestApiProps,
}

impl Default for EndpointStackConfig {
    fn default() -> Self {
        Self {
            stack_id: DEFAULT_STACK_ID.to_string(),
            stack: StackProps::default(),
            function: FunctionProps::default(),
            api: RestApiProps::default(),
        }
    }
}

impl EndpointStackConfig {
    pub fn validate(&self) -> Result<(), SynthError> {
        validate_stack_id(&self.stack_id)?;
        self.stack.validate()?;
        self.function.validate()?;
        self.api.validate()
    }
}

fn validate_tag(key: &str, value: &str) -> Result<(), SynthError> {
    let invalid = |reason: &str| SynthError::InvalidTag {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if key.is_empty() || key.len() > MAX_TAG_KEY_LENGTH {
        return Err(invalid("tag keys must be 1-128 characters"));
    }
    if key.to_ascii_lowercase().starts_with("aws:") {
        return Err(invalid("the 'aws:' prefix is reserved"));
    }
    if value.len() > MAX_TAG_VALUE_LENGTH {
        return Err(invalid("tag values cannot exceed 256 characters"));
    }
    Ok(())
}

fn is_region_name(region: &str) -> bool {
    let parts: Vec<&str> = region.split('-').collect();
    parts.len() >= 3
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
        && parts[0].chars().all(|c| c.is_ascii_lowercase())
        && parts[parts.len() - 1].chars().all(|c| c.is_ascii_digit())
}

fn is_variable_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
