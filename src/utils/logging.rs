use std::error::Error;

use tracing_subscriber::EnvFilter;

/// Parse a filter directive, falling back to `warn` when it is invalid.
fn filter_for(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with the transcript on stdout.
pub fn init_tracing(directive: &str) -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| -> Box<dyn Error> { err })
}
