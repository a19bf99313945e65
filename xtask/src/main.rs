use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

const DEMO_CONFIG: &str = "demos/transaction_parser/stack.json";
const SMOKE_OUT_DIR: &str = "target/cdk.out.smoke";

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the endpoint stack workspace",
    long_about = "A unified CLI for synthesizing the demo stack and running\n\
                  CI checks in the endpoint stack workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the demo stack into a cloud assembly
    Synth {
        /// Stack config file
        #[arg(long, default_value = DEMO_CONFIG)]
        config: String,
        /// Output directory
        #[arg(long, default_value = "cdk.out")]
        out: String,
    },
    /// Print the demo stack template
    Template {
        /// Stack config file
        #[arg(long, default_value = DEMO_CONFIG)]
        config: String,
    },
    /// Run CI checks (fmt, clippy, tests, synth smoke run)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Synthesize the demo stack end to end
    Synth,
    /// Run check + synth
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cli(cli_args: &[&str]) {
    let mut args = vec![
        "run",
        "-p",
        "endpoint_stack_synth",
        "--bin",
        "endpoint-stack",
        "--",
    ];
    args.extend_from_slice(cli_args);
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test endpoint_stack_core");
    run_cargo(&["test", "-p", "endpoint_stack_core"]);

    step("Test endpoint_stack_synth");
    run_cargo(&["test", "-p", "endpoint_stack_synth"]);
}

fn ci_synth() {
    step("Synthesize demo stack");
    run_cli(&["synth", "--config", DEMO_CONFIG, "--out", SMOKE_OUT_DIR]);

    step("List demo stacks");
    run_cli(&["ls", "--config", DEMO_CONFIG]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { config, out } => {
            run_cli(&["synth", "--config", &config, "--out", &out]);
        }
        Commands::Template { config } => {
            run_cli(&["template", "--config", &config]);
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Synth => ci_synth(),
                CiJob::All => {
                    ci_check();
                    ci_synth();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
