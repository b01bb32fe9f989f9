//! Logging setup for the command-line tool using `tracing_subscriber`.
//!
//! Log lines go to stderr so they never mix with packed output on stdout.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `directives` when set.
pub fn setup_logging(directives: &str, json: bool) {
    match json {
        true => setup_logging_json(directives),
        false => setup_logging_plain(directives),
    }
}

fn filter(directives: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

fn setup_logging_json(directives: &str) {
    let main_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_target(false)
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter(directives))
        .with(main_layer)
        .init()
}

fn setup_logging_plain(directives: &str) {
    let main_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter(directives))
        .with(main_layer)
        .init()
}
