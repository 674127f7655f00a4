use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "kanban_drag=info";

/// Installs a `RUST_LOG`-driven fmt subscriber
///
/// Safe to call more than once; later calls leave the first subscriber in
/// place.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Subscriber that writes through the test harness's captured output
pub fn init_for_tests() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("kanban_drag=debug"))
        .with_test_writer()
        .try_init();
}
