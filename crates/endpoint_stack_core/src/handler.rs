//! Handler references: the entry point the platform invokes per event.
//!
//! Only the textual shape is checked here. Whether the symbol exists inside
//! the code bundle is discovered by the platform at invocation time.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SynthError;
use crate::runtime::{Runtime, RuntimeFamily};

pub const DEFAULT_HANDLER: &str = "rewardPointsCalculator.lambda_handler.handler";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

/// The two halves of a parsed handler reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint<'a> {
    pub module: &'a str,
    pub symbol: &'a str,
}

impl HandlerRef {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the reference following the convention of the runtime family.
    pub fn entry_point(&self, runtime: Runtime) -> Result<EntryPoint<'_>, SynthError> {
        let raw = self.0.as_str();
        if raw.trim().is_empty() {
            return Err(self.invalid(runtime, "handler cannot be empty"));
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(self.invalid(runtime, "handler cannot contain whitespace"));
        }

        match runtime.family() {
            RuntimeFamily::Python | RuntimeFamily::NodeJs | RuntimeFamily::Ruby => {
                let Some((module, symbol)) = raw.rsplit_once('.') else {
                    return Err(self.invalid(
                        runtime,
                        "expected '<module path>.<function name>'",
                    ));
                };
                if module.is_empty() || symbol.is_empty() {
                    return Err(self.invalid(
                        runtime,
                        "module path and function name must be non-empty",
                    ));
                }
                if runtime.family() == RuntimeFamily::Python
                    && module.split('.').any(|segment| !is_identifier(segment))
                {
                    return Err(self.invalid(
                        runtime,
                        "python module path segments must be identifiers",
                    ));
                }
                if !is_identifier(symbol) {
                    return Err(self.invalid(runtime, "function name must be an identifier"));
                }
                Ok(EntryPoint { module, symbol })
            }
            RuntimeFamily::Java => match raw.split_once("::") {
                Some((class, method)) if !class.is_empty() && is_identifier(method) => {
                    Ok(EntryPoint {
                        module: class,
                        symbol: method,
                    })
                }
                Some(_) => Err(self.invalid(runtime, "expected '<class>::<method>'")),
                // RequestHandler implementations are referenced by class only.
                None => Ok(EntryPoint {
                    module: raw,
                    symbol: "handleRequest",
                }),
            },
            RuntimeFamily::DotNet => {
                let parts: Vec<&str> = raw.split("::").collect();
                if parts.len() != 3 || parts.iter().any(|part| part.is_empty()) {
                    return Err(self.invalid(
                        runtime,
                        "expected '<assembly>::<type>::<method>'",
                    ));
                }
                let module_end = parts[0].len() + 2 + parts[1].len();
                Ok(EntryPoint {
                    module: &raw[..module_end],
                    symbol: parts[2],
                })
            }
            RuntimeFamily::Provided => Ok(EntryPoint {
                module: "bootstrap",
                symbol: raw,
            }),
        }
    }

    fn invalid(&self, runtime: Runtime, reason: &str) -> SynthError {
        SynthError::InvalidHandler {
            handler: self.0.clone(),
            runtime: runtime.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl Default for HandlerRef {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(is_identifier_char)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}
