use std::path::{Path, PathBuf};

use endpoint_stack_core::{
    construct_endpoint_stack, synthesize, App, EndpointStackConfig, SynthError,
};
use thiserror::Error;
use tracing::info;

use crate::adapters::DirectoryAssetResolver;
use crate::assembly_writer::{to_pretty_json, write_assembly};
use crate::settings::{apply_process_defaults, load_stack_config, ProcessSettings, SettingsError};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

/// Inputs shared by every subcommand.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config_path: Option<PathBuf>,
    pub stack_id: Option<String>,
    pub cwd: PathBuf,
    pub settings: ProcessSettings,
}

impl CommandContext {
    fn resolve_config(&self) -> Result<(EndpointStackConfig, PathBuf), CommandError> {
        let loaded = load_stack_config(self.config_path.as_deref(), &self.cwd)?;
        let mut config = loaded.config;
        if let Some(stack_id) = &self.stack_id {
            config.stack_id = stack_id.clone();
        }
        apply_process_defaults(&mut config, &self.settings)?;
        Ok((config, loaded.base_dir))
    }

    fn build_app(&self) -> Result<(App, PathBuf), CommandError> {
        let (config, base_dir) = self.resolve_config()?;
        let mut app = App::new();
        construct_endpoint_stack(&mut app, &config.stack_id, &config)?;
        Ok((app, base_dir))
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthSummary {
    pub out_dir: PathBuf,
    pub stacks: Vec<String>,
    pub files: Vec<PathBuf>,
}

/// Stages code assets and writes the full cloud assembly.
///
/// `out_dir` overrides `CDK_OUTDIR`, which overrides `cdk.out`.
pub fn run_synth(
    context: &CommandContext,
    out_dir: Option<&Path>,
) -> Result<SynthSummary, CommandError> {
    let out_dir = match out_dir {
        Some(path) => context.absolute(path),
        None => context.absolute(&context.settings.out_dir()),
    };

    let (app, base_dir) = context.build_app()?;
    let resolver = DirectoryAssetResolver::staging(base_dir, &out_dir);
    let assembly = synthesize(&app, &resolver)?;
    let files = write_assembly(&assembly, &out_dir)?;

    let stacks: Vec<String> = assembly
        .stacks
        .iter()
        .map(|stack| stack.stack_id.clone())
        .collect();
    info!(
        out_dir = %out_dir.display(),
        stacks = ?stacks,
        files = files.len(),
        "synth complete"
    );

    Ok(SynthSummary {
        out_dir,
        stacks,
        files,
    })
}

/// Renders the stack template as pretty JSON without writing anything.
pub fn render_template(context: &CommandContext) -> Result<String, CommandError> {
    let (app, base_dir) = context.build_app()?;
    let resolver = DirectoryAssetResolver::fingerprint_only(base_dir);
    let assembly = synthesize(&app, &resolver)?;

    let mut rendered = String::new();
    for stack in &assembly.stacks {
        rendered.push_str(&to_pretty_json(&stack.template)?);
    }
    Ok(rendered)
}

/// Stack ids declared by the app. Code assets are not resolved.
pub fn list_stacks(context: &CommandContext) -> Result<Vec<String>, CommandError> {
    let (app, _) = context.build_app()?;
    Ok(app.stacks().map(|(_, node)| node.id.clone()).collect())
}
