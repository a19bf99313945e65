use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. Logs go to stderr so `template` output stays clean.
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("endpoint_stack_core=debug,endpoint_stack_synth=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
