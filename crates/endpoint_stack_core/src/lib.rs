//! Declarative definition of the endpoint stack: one Lambda function behind
//! an API Gateway REST API that proxies every method and path to it.
//!
//! This crate owns the construct tree, validation, and synthesis into a
//! CloudFormation template. It performs no I/O of its own: code assets are
//! fingerprinted through the [`asset::AssetResolver`] seam, and writing the
//! assembly to disk belongs to `endpoint_stack_synth`.

pub mod assembly;
pub mod asset;
pub mod config;
pub mod construct;
pub mod error;
pub mod handler;
pub mod ids;
pub mod runtime;
pub mod stack;
pub mod synth;
pub mod template;

pub use assembly::CloudAssembly;
pub use asset::{AssetResolver, CodeAsset, StagedAsset};
pub use config::{EndpointStackConfig, Environment, FunctionProps, RestApiProps, StackProps};
pub use construct::{App, ConstructKind, NodeId};
pub use error::SynthError;
pub use handler::HandlerRef;
pub use runtime::Runtime;
pub use stack::{construct_endpoint_stack, EndpointStack};
pub use synth::{synthesize, synthesize_stack};
pub use template::Template;
