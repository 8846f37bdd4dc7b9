//! Subscriber setup shared by binaries built on the crate.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "academic_console=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, or `DEFAULT_FILTER`
/// when unset. A second call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
