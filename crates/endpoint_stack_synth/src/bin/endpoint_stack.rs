use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use endpoint_stack_synth::commands::{list_stacks, render_template, run_synth, CommandContext};
use endpoint_stack_synth::settings::ProcessSettings;
use endpoint_stack_synth::telemetry::init_tracing;

#[derive(Parser, Debug)]
#[command(name = "endpoint-stack")]
#[command(about = "Synthesize the Lambda proxy API stack")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Stack config file (JSON)
    #[arg(long, global = true, env = "ENDPOINT_STACK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the stack id from the config file
    #[arg(long, global = true)]
    stack_id: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage assets and write the cloud assembly
    Synth {
        /// Output directory (defaults to CDK_OUTDIR, then cdk.out)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// List the stacks in the app
    Ls,
    /// Print the synthesized template to stdout
    Template,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let settings = ProcessSettings::load()
        .context("failed to read CDK_* environment")?;
    let cwd = std::env::current_dir()
        .context("failed to resolve working directory")?;
    let context = CommandContext {
        config_path: args.config,
        stack_id: args.stack_id,
        cwd,
        settings,
    };

    match args.command {
        Command::Synth { out } => {
            let summary = run_synth(&context, out.as_deref()).context("synth failed")?;
            let templates = summary
                .files
                .iter()
                .filter(|path| path.to_string_lossy().ends_with(".template.json"));
            for template in templates {
                println!("{}", template.display());
            }
            eprintln!(
                "Synthesized {} stack(s) into {}",
                summary.stacks.len(),
                summary.out_dir.display()
            );
        }
        Command::Ls => {
            for stack in list_stacks(&context).context("failed to construct app")? {
                println!("{stack}");
            }
        }
        Command::Template => {
            let template = render_template(&context)
                .context("failed to render template")?;
            print!("{template}");
        }
    }

    Ok(())
}
