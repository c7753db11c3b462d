//! # Logging
//!
//! JSON tracing output filtered by `RUST_LOG`, with `fcore=info` as the
//! baseline directive.

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "fcore=info";

/// Install the global subscriber
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing() -> bool {
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = DEFAULT_DIRECTIVE.parse::<Directive>() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .try_init()
        .is_ok()
}
